use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

use healing_pipeline::app::batch_use_case::{BatchSource, BatchUseCase};
use healing_pipeline::app::ports::{RawInference, SentimentInferencePort};
use healing_pipeline::config::PipelineConfig;
use healing_pipeline::error::InferenceError;
use healing_pipeline::infra::record_source::{load_window, records_from_document};
use healing_pipeline::infra::report_output_adapter::{FileReportOutput, NullReportOutput};
use healing_pipeline::pipeline::HealthVerdict;
use healing_pipeline::types::{Defect, HealingAction, ProcessingStatus, Record, Sentiment};

/// Labels by keyword; optionally fails the first N calls per text.
struct KeywordInference {
    fail_first: usize,
    always_fail: bool,
    calls: Mutex<HashMap<String, usize>>,
}

impl KeywordInference {
    fn reliable() -> Self {
        Self::flaky(0)
    }

    fn flaky(fail_first: usize) -> Self {
        Self {
            fail_first,
            always_fail: false,
            calls: Mutex::new(HashMap::new()),
        }
    }

    fn down() -> Self {
        Self {
            fail_first: 0,
            always_fail: true,
            calls: Mutex::new(HashMap::new()),
        }
    }

    fn calls_for(&self, text: &str) -> usize {
        self.calls.lock().unwrap().get(text).copied().unwrap_or(0)
    }
}

#[async_trait]
impl SentimentInferencePort for KeywordInference {
    async fn infer(&self, text: &str) -> Result<RawInference, InferenceError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let n = calls.entry(text.to_string()).or_insert(0);
            *n += 1;
            *n
        };
        if self.always_fail {
            return Err(InferenceError::Timeout(0.01));
        }
        if call <= self.fail_first {
            return Err(InferenceError::Transport("connection reset".to_string()));
        }
        let lower = text.to_lowercase();
        let label = if lower.contains("great") || lower.contains("love") {
            "POSITIVE"
        } else if lower.contains("awful") || lower.contains("cold") {
            "NEGATIVE"
        } else {
            "NEUTRAL"
        };
        Ok(RawInference {
            label: label.to_string(),
            confidence: 0.9,
        })
    }
}

/// Panics on any text containing "boom"; labels everything else positive.
struct PanicOnKeyword;

#[async_trait]
impl SentimentInferencePort for PanicOnKeyword {
    async fn infer(&self, text: &str) -> Result<RawInference, InferenceError> {
        if text.contains("boom") {
            panic!("inference backend crashed on {:?}", text);
        }
        Ok(RawInference {
            label: "POSITIVE".to_string(),
            confidence: 0.8,
        })
    }
}

fn test_config(concurrency: usize) -> PipelineConfig {
    PipelineConfig {
        max_text_length: 40,
        inference_timeout_seconds: 0.5,
        inference_retries: 3,
        inference_backoff_ms: 1,
        degraded_confidence: 0.5,
        concurrency,
        ..PipelineConfig::default()
    }
}

fn source(n: usize) -> BatchSource {
    BatchSource {
        input_file: "reviews.json".to_string(),
        offset: 0,
        batch_size: Some(n),
    }
}

fn use_case(config: &PipelineConfig, port: Arc<dyn SentimentInferencePort>) -> BatchUseCase {
    BatchUseCase::with_inference(config, port, Box::new(NullReportOutput))
}

fn records(doc: Value) -> Vec<Record> {
    records_from_document(&doc, 0, None).unwrap()
}

#[tokio::test]
async fn test_missing_text_is_healed_and_correlated() -> Result<()> {
    let batch = records(json!([{"review_id": "a", "text": null, "stars": 5}]));
    let report = use_case(&test_config(1), Arc::new(KeywordInference::reliable()))
        .run(batch, source(1))
        .await?;

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.defect, Defect::Missing);
    assert_eq!(outcome.healing_action, HealingAction::FillPlaceholder);
    assert_eq!(outcome.status, ProcessingStatus::Healed);

    let summary = &report.summary;
    assert_eq!(summary.totals.healed, 1);
    assert_eq!(summary.star_sentiment_correlation[&5u8].total(), 1);
    Ok(())
}

#[tokio::test]
async fn test_unreachable_service_degrades_instead_of_failing() -> Result<()> {
    let port = Arc::new(KeywordInference::down());
    let batch = records(json!([{"review_id": "b", "text": "Great food!", "stars": 5}]));
    let report = use_case(&test_config(1), port.clone()).run(batch, source(1)).await?;

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.status, ProcessingStatus::Degraded);
    assert_eq!(outcome.label, Sentiment::Neutral);
    assert_eq!(outcome.confidence, 0.5);
    assert_eq!(port.calls_for("Great food!"), 3);
    assert_eq!(report.health.health_status, HealthVerdict::Critical);
    Ok(())
}

#[tokio::test]
async fn test_mostly_healed_batch_is_a_warning() -> Result<()> {
    let mut items = Vec::new();
    for i in 0..6 {
        let text = match i % 3 {
            0 => Value::Null,
            1 => json!("   "),
            _ => json!("!!!"),
        };
        items.push(json!({"review_id": format!("h{}", i), "text": text, "stars": 3}));
    }
    for i in 0..4 {
        items.push(json!({"review_id": format!("c{}", i), "text": "Love it", "stars": 5}));
    }

    let report = use_case(&test_config(3), Arc::new(KeywordInference::reliable()))
        .run(records(Value::Array(items)), source(10))
        .await?;

    let summary = &report.summary;
    assert_eq!(summary.totals.processed, 10);
    assert_eq!(summary.totals.healed, 6);
    assert_eq!(summary.totals.degraded, 0);
    assert!((summary.rates.healing_rate - 0.6).abs() < 1e-9);
    assert_eq!(report.health.health_status, HealthVerdict::Warning);
    Ok(())
}

#[tokio::test]
async fn test_retries_recover_before_degrading() -> Result<()> {
    let port = Arc::new(KeywordInference::flaky(2));
    let batch = records(json!([
        {"review_id": "ok", "text": "Great food!", "stars": 5},
        {"review_id": "fix", "text": "", "stars": 2}
    ]));
    let report = use_case(&test_config(1), port.clone()).run(batch, source(2)).await?;

    assert_eq!(report.outcomes[0].status, ProcessingStatus::Success);
    assert_eq!(report.outcomes[0].attempts, 3);
    assert_eq!(report.outcomes[1].status, ProcessingStatus::Healed);
    assert_eq!(report.summary.totals.degraded, 0);
    assert_eq!(report.health.health_status, HealthVerdict::Healthy);
    Ok(())
}

#[tokio::test]
async fn test_summary_is_independent_of_concurrency() -> Result<()> {
    let items: Vec<Value> = (0..23)
        .map(|i| {
            let text = match i % 5 {
                0 => json!("Great service"),
                1 => json!("Awful and cold"),
                2 => json!(i),
                3 => json!("a long review that goes on and on well past the limit"),
                _ => json!("fine"),
            };
            json!({"id": i, "text": text, "stars": (i % 5) + 1})
        })
        .collect();
    let doc = Value::Array(items);

    let sequential = use_case(&test_config(1), Arc::new(KeywordInference::reliable()))
        .run(records(doc.clone()), source(23))
        .await?;
    let parallel = use_case(&test_config(4), Arc::new(KeywordInference::reliable()))
        .run(records(doc), source(23))
        .await?;

    assert_eq!(sequential.summary.totals, parallel.summary.totals);
    assert_eq!(sequential.summary.rates, parallel.summary.rates);
    assert_eq!(
        sequential.summary.sentiment_distribution,
        parallel.summary.sentiment_distribution
    );
    assert_eq!(
        sequential.summary.star_sentiment_correlation,
        parallel.summary.star_sentiment_correlation
    );
    let ids = |r: &healing_pipeline::app::batch_use_case::BatchReport| {
        r.outcomes.iter().map(|o| o.id.clone()).collect::<Vec<_>>()
    };
    assert_eq!(ids(&sequential), ids(&parallel));

    let t = parallel.summary.totals;
    assert_eq!(t.success + t.healed + t.degraded, t.processed);
    Ok(())
}

#[tokio::test]
async fn test_empty_window_is_healthy() -> Result<()> {
    let report = use_case(&test_config(4), Arc::new(KeywordInference::reliable()))
        .run(Vec::new(), source(0))
        .await?;

    assert_eq!(report.summary.totals.processed, 0);
    assert_eq!(report.summary.rates.degradation_rate, 0.0);
    assert_eq!(report.health.health_status, HealthVerdict::Healthy);
    Ok(())
}

#[tokio::test]
async fn test_file_round_trip_writes_report_files() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("reviews.json");
    std::fs::write(
        &input,
        serde_json::to_vec(&json!([
            {"review_id": "1", "text": "Great tacos", "stars": 5.0},
            {"review_id": "2", "text": 404, "stars": 1.0},
            {"review_id": "3", "text": "Cold soup", "stars": 2.0}
        ]))?,
    )?;
    let out_dir = dir.path().join("out");

    let batch = load_window(&input, 1, Some(5))?;
    assert_eq!(batch.len(), 2);

    let config = test_config(2);
    let report = BatchUseCase::with_inference(
        &config,
        Arc::new(KeywordInference::reliable()),
        Box::new(FileReportOutput::new(&out_dir)),
    )
    .run(
        batch,
        BatchSource {
            input_file: input.display().to_string(),
            offset: 1,
            batch_size: Some(5),
        },
    )
    .await?;
    assert_eq!(report.summary.totals.healed, 1);

    let mut names: Vec<String> = std::fs::read_dir(&out_dir)?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()?;
    names.sort();
    assert_eq!(names.len(), 3);
    assert!(names[0].starts_with("health_"));
    assert!(names[1].starts_with("results_") && names[1].ends_with(".ndjson"));
    assert!(names[2].starts_with("summary_"));

    let health: Value = serde_json::from_slice(&std::fs::read(out_dir.join(&names[0]))?)?;
    assert_eq!(health["pipeline"], "self_healing_sentiment_pipeline");
    assert_eq!(health["health_status"], "HEALTHY");
    assert_eq!(health["metrics"]["total_processed"], 2);

    let summary: Value = serde_json::from_slice(&std::fs::read(out_dir.join(&names[2]))?)?;
    assert_eq!(summary["run_info"]["offset"], 1);
    assert_eq!(summary["totals"]["success"], 1);
    assert_eq!(summary["star_sentiment_correlation"]["2_star"]["NEGATIVE"], 1);

    let results = std::fs::read_to_string(out_dir.join(&names[1]))?;
    let lines: Vec<Value> = results
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["defect"], "WRONG_TYPE");
    assert_eq!(lines[0]["healing_action"], "CONVERT_TYPE");
    assert_eq!(lines[1]["status"], "SUCCESS");
    Ok(())
}

#[tokio::test]
async fn test_concurrent_runs_share_an_output_directory() -> Result<()> {
    let dir = tempdir()?;
    let doc = json!([
        {"review_id": "1", "text": "Great tacos", "stars": 5},
        {"review_id": "2", "text": "Cold soup", "stars": 2},
        {"review_id": "3", "text": null, "stars": 3},
        {"review_id": "4", "text": "fine", "stars": 4}
    ]);
    let config = test_config(2);
    let window = |offset: usize| -> Result<(Vec<Record>, BatchSource)> {
        let batch = records_from_document(&doc, offset, Some(2))?;
        let source = BatchSource {
            input_file: "reviews.json".to_string(),
            offset,
            batch_size: Some(2),
        };
        Ok((batch, source))
    };
    let (first_batch, first_source) = window(0)?;
    let (second_batch, second_source) = window(2)?;

    let first = BatchUseCase::with_inference(
        &config,
        Arc::new(KeywordInference::reliable()),
        Box::new(FileReportOutput::new(dir.path())),
    );
    let second = BatchUseCase::with_inference(
        &config,
        Arc::new(KeywordInference::reliable()),
        Box::new(FileReportOutput::new(dir.path())),
    );
    let (a, b) = tokio::join!(
        first.run(first_batch, first_source),
        second.run(second_batch, second_source)
    );
    let (a, b) = (a?, b?);
    assert_ne!(a.summary.run_info.run_id, b.summary.run_info.run_id);

    let names: Vec<String> = std::fs::read_dir(dir.path())?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()?;
    assert_eq!(names.len(), 6, "files: {:?}", names);
    for report in [&a, &b] {
        let run_id = &report.summary.run_info.run_id;
        let own: Vec<&String> = names.iter().filter(|n| n.contains(run_id.as_str())).collect();
        assert_eq!(own.len(), 3, "files for run {}: {:?}", run_id, own);
    }
    Ok(())
}

#[tokio::test]
async fn test_panicking_record_is_degraded_alone() -> Result<()> {
    let batch = records(json!([
        {"review_id": "a", "text": "Great food", "stars": 5},
        {"review_id": "b", "text": "boom", "stars": 1},
        {"review_id": "c", "text": "Love it", "stars": 4},
        {"review_id": "d", "text": null, "stars": 2}
    ]));
    let report = use_case(&test_config(2), Arc::new(PanicOnKeyword))
        .run(batch, source(4))
        .await?;

    let statuses: Vec<ProcessingStatus> = report.outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![
            ProcessingStatus::Success,
            ProcessingStatus::Degraded,
            ProcessingStatus::Success,
            ProcessingStatus::Healed
        ]
    );
    let crashed = &report.outcomes[1];
    assert_eq!(crashed.id, "b");
    assert_eq!(crashed.label, Sentiment::Neutral);
    assert_eq!(crashed.confidence, 0.5);
    assert_eq!(crashed.attempts, 0);
    assert!(crashed.failure_reason.is_some());

    assert_eq!(report.summary.totals.processed, 4);
    assert_eq!(report.summary.totals.degraded, 1);
    assert_eq!(report.health.health_status, HealthVerdict::Critical);
    Ok(())
}
