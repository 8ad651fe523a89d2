use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::app::ports::{ReportOutputPort, SentimentInferencePort};
use crate::config::PipelineConfig;
use crate::observability::metrics;
use crate::pipeline::processing::aggregate::{BatchSummary, RunInfo, SummaryAccumulator};
use crate::pipeline::processing::classify::ClassifierClient;
use crate::pipeline::processing::health::HealthReport;
use crate::pipeline::processing::record::{RecordOutcome, RecordProcessor};
use crate::types::Record;

/// Where a batch came from; copied into the summary's run info
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSource {
    pub input_file: String,
    pub offset: usize,
    pub batch_size: Option<usize>,
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub health: HealthReport,
    /// Per-record outcomes in input order
    pub outcomes: Vec<RecordOutcome>,
}

/// Runs one batch through diagnose, heal and classify, then aggregates and grades it.
///
/// Records are split into `concurrency` contiguous chunks, each processed on its
/// own task into a partial accumulator. Partials are merged in chunk order, so
/// the summary does not depend on task scheduling.
pub struct BatchUseCase {
    processor: RecordProcessor,
    output: Box<dyn ReportOutputPort>,
    pipeline_name: String,
    concurrency: usize,
}

impl BatchUseCase {
    pub fn new(processor: RecordProcessor, output: Box<dyn ReportOutputPort>, config: &PipelineConfig) -> Self {
        Self {
            processor,
            output,
            pipeline_name: config.pipeline_name.clone(),
            concurrency: config.concurrency.max(1),
        }
    }

    /// Wire a processor around an inference port using the given configuration
    pub fn with_inference(
        config: &PipelineConfig,
        inference: Arc<dyn SentimentInferencePort>,
        output: Box<dyn ReportOutputPort>,
    ) -> Self {
        let inference_config = config.inference();
        let classifier = ClassifierClient::new(inference, &inference_config);
        let processor = RecordProcessor::new(config.healing(), &inference_config, classifier);
        Self::new(processor, output, config)
    }

    pub async fn run(&self, records: Vec<Record>, source: BatchSource) -> Result<BatchReport> {
        let run_id = Uuid::new_v4().to_string();
        let timestamp = Utc::now();
        info!(
            run_id = %run_id,
            records = records.len(),
            concurrency = self.concurrency,
            "Starting batch from {}",
            source.input_file
        );

        let (accumulator, outcomes) = self.process_all(records).await?;

        let run_info = RunInfo {
            run_id,
            timestamp,
            batch_size: source.batch_size,
            offset: source.offset,
            input_file: source.input_file,
        };
        let summary = accumulator
            .finalize(run_info)
            .context("batch summary failed its consistency check")?;
        let health = HealthReport::from_summary(&self.pipeline_name, &summary);

        metrics::batch::completed(
            summary.totals.processed,
            summary.rates.healing_rate,
            summary.rates.degradation_rate,
            health.health_status.as_str(),
        );
        if health.health_status.needs_attention() {
            warn!(
                health_status = %health.health_status,
                processed = summary.totals.processed,
                degraded = summary.totals.degraded,
                degradation_rate = summary.rates.degradation_rate,
                "Batch finished with failed classifications"
            );
        } else {
            info!(
                health_status = %health.health_status,
                processed = summary.totals.processed,
                healed = summary.totals.healed,
                healing_rate = summary.rates.healing_rate,
                "Batch finished"
            );
        }

        let report = BatchReport {
            summary,
            health,
            outcomes,
        };
        self.output
            .write_report(&report)
            .await
            .context("failed to write batch report")?;
        Ok(report)
    }

    async fn process_all(&self, records: Vec<Record>) -> Result<(SummaryAccumulator, Vec<RecordOutcome>)> {
        let mut accumulator = SummaryAccumulator::new();
        let mut outcomes = Vec::with_capacity(records.len());
        if records.is_empty() {
            return Ok((accumulator, outcomes));
        }

        let chunk_size = records.len().div_ceil(self.concurrency);
        let mut handles = Vec::new();
        for chunk in records.chunks(chunk_size) {
            let processor = self.processor.clone();
            let chunk = chunk.to_vec();
            handles.push(tokio::spawn(async move {
                let mut partial = SummaryAccumulator::new();
                let mut chunk_outcomes = Vec::with_capacity(chunk.len());
                for record in chunk {
                    let outcome = process_isolated(&processor, record).await;
                    partial.add(&outcome);
                    chunk_outcomes.push(outcome);
                }
                (partial, chunk_outcomes)
            }));
        }

        for (worker, handle) in handles.into_iter().enumerate() {
            let (partial, chunk_outcomes) = handle
                .await
                .with_context(|| format!("batch worker {} did not complete", worker))?;
            accumulator.merge(&partial);
            outcomes.extend(chunk_outcomes);
        }
        Ok((accumulator, outcomes))
    }
}

// A panic inside one record's processing degrades that record only.
async fn process_isolated(processor: &RecordProcessor, record: Record) -> RecordOutcome {
    let task = {
        let processor = processor.clone();
        let record = record.clone();
        tokio::spawn(async move { processor.process(&record).await })
    };
    match task.await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(record_id = %record.id, "Record processing aborted: {}", e);
            processor.abandoned(&record, &format!("processing aborted: {}", e))
        }
    }
}
