use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::error::{PipelineError, Result};
use crate::pipeline::processing::record::RecordOutcome;
use crate::types::{ProcessingStatus, Sentiment};

/// Count per sentiment label; always serializes all three keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentCounts {
    #[serde(rename = "POSITIVE")]
    pub positive: u64,
    #[serde(rename = "NEGATIVE")]
    pub negative: u64,
    #[serde(rename = "NEUTRAL")]
    pub neutral: u64,
}

impl SentimentCounts {
    pub fn increment(&mut self, label: Sentiment) {
        match label {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Negative => self.negative += 1,
            Sentiment::Neutral => self.neutral += 1,
        }
    }

    pub fn get(&self, label: Sentiment) -> u64 {
        match label {
            Sentiment::Positive => self.positive,
            Sentiment::Negative => self.negative,
            Sentiment::Neutral => self.neutral,
        }
    }

    pub fn total(&self) -> u64 {
        self.positive + self.negative + self.neutral
    }

    fn merge(&mut self, other: &SentimentCounts) {
        self.positive += other.positive;
        self.negative += other.negative;
        self.neutral += other.neutral;
    }
}

/// Running totals for a batch or a slice of one.
///
/// Partial accumulators from concurrent workers combine with `merge`; counts
/// and confidence sums add, so the combination is associative. Rates and
/// averages are derived once in `finalize`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryAccumulator {
    processed: u64,
    success: u64,
    healed: u64,
    degraded: u64,
    sentiment: SentimentCounts,
    star_sentiment: BTreeMap<u8, SentimentCounts>,
    confidence_sum: ConfidenceSums,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ConfidenceSums {
    success: f64,
    healed: f64,
    degraded: f64,
}

impl SummaryAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_outcomes<'a, I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = &'a RecordOutcome>,
    {
        let mut acc = Self::new();
        for outcome in outcomes {
            acc.add(outcome);
        }
        acc
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn add(&mut self, outcome: &RecordOutcome) {
        self.processed += 1;
        match outcome.status {
            ProcessingStatus::Success => {
                self.success += 1;
                self.confidence_sum.success += outcome.confidence;
            }
            ProcessingStatus::Healed => {
                self.healed += 1;
                self.confidence_sum.healed += outcome.confidence;
            }
            ProcessingStatus::Degraded => {
                self.degraded += 1;
                self.confidence_sum.degraded += outcome.confidence;
            }
        }
        self.sentiment.increment(outcome.label);
        if let Some(stars) = outcome.stars {
            self.star_sentiment
                .entry(stars)
                .or_default()
                .increment(outcome.label);
        }
    }

    pub fn merge(&mut self, other: &SummaryAccumulator) {
        self.processed += other.processed;
        self.success += other.success;
        self.healed += other.healed;
        self.degraded += other.degraded;
        self.sentiment.merge(&other.sentiment);
        for (stars, counts) in &other.star_sentiment {
            self.star_sentiment.entry(*stars).or_default().merge(counts);
        }
        self.confidence_sum.success += other.confidence_sum.success;
        self.confidence_sum.healed += other.confidence_sum.healed;
        self.confidence_sum.degraded += other.confidence_sum.degraded;
    }

    /// Freeze into a summary. Fails if the status counts do not partition `processed`.
    pub fn finalize(self, run_info: RunInfo) -> Result<BatchSummary> {
        let buckets = self.success + self.healed + self.degraded;
        if buckets != self.processed {
            return Err(PipelineError::Invariant(format!(
                "success ({}) + healed ({}) + degraded ({}) != processed ({})",
                self.success, self.healed, self.degraded, self.processed
            )));
        }
        if self.sentiment.total() != self.processed {
            return Err(PipelineError::Invariant(format!(
                "sentiment distribution counts {} labels for {} processed records",
                self.sentiment.total(),
                self.processed
            )));
        }

        let rate = |count: u64| ratio(count as f64, self.processed);
        let rates = Rates {
            success_rate: rate(self.success),
            healing_rate: rate(self.healed),
            degradation_rate: rate(self.degraded),
        };
        let average_confidence = AverageConfidence {
            success: ratio(self.confidence_sum.success, self.success),
            healed: ratio(self.confidence_sum.healed, self.healed),
            degraded: ratio(self.confidence_sum.degraded, self.degraded),
        };

        Ok(BatchSummary {
            run_info,
            totals: Totals {
                processed: self.processed,
                success: self.success,
                healed: self.healed,
                degraded: self.degraded,
            },
            rates,
            sentiment_distribution: self.sentiment,
            star_sentiment_correlation: self.star_sentiment,
            average_confidence,
        })
    }
}

fn ratio(numerator: f64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        numerator / count as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunInfo {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub batch_size: Option<usize>,
    pub offset: usize,
    pub input_file: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub processed: u64,
    pub success: u64,
    pub healed: u64,
    pub degraded: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rates {
    pub success_rate: f64,
    pub healing_rate: f64,
    pub degradation_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AverageConfidence {
    pub success: f64,
    pub healed: f64,
    pub degraded: f64,
}

/// Frozen batch-level result. The health verdict is derived from it on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub run_info: RunInfo,
    pub totals: Totals,
    pub rates: Rates,
    pub sentiment_distribution: SentimentCounts,
    #[serde(serialize_with = "serialize_star_keys")]
    pub star_sentiment_correlation: BTreeMap<u8, SentimentCounts>,
    pub average_confidence: AverageConfidence,
}

// Keys render as "<n>_star", in numeric order.
fn serialize_star_keys<S>(
    map: &BTreeMap<u8, SentimentCounts>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(map.iter().map(|(stars, counts)| (format!("{}_star", stars), counts)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Defect, HealingAction};

    fn outcome(status: ProcessingStatus, label: Sentiment, confidence: f64, stars: Option<u8>) -> RecordOutcome {
        RecordOutcome {
            id: "r".to_string(),
            stars,
            defect: if status == ProcessingStatus::Healed { Defect::Missing } else { Defect::None },
            healing_action: if status == ProcessingStatus::Healed {
                HealingAction::FillPlaceholder
            } else {
                HealingAction::None
            },
            healed: status == ProcessingStatus::Healed,
            status,
            label,
            confidence,
            attempts: 1,
            failure_reason: None,
        }
    }

    fn run_info() -> RunInfo {
        RunInfo {
            run_id: "test".to_string(),
            timestamp: Utc::now(),
            batch_size: Some(10),
            offset: 0,
            input_file: "reviews.json".to_string(),
        }
    }

    fn sample() -> Vec<RecordOutcome> {
        vec![
            outcome(ProcessingStatus::Success, Sentiment::Positive, 0.9, Some(5)),
            outcome(ProcessingStatus::Success, Sentiment::Negative, 0.7, Some(1)),
            outcome(ProcessingStatus::Healed, Sentiment::Positive, 0.8, Some(5)),
            outcome(ProcessingStatus::Degraded, Sentiment::Neutral, 0.5, None),
        ]
    }

    #[test]
    fn test_empty_batch_has_zero_rates() {
        let summary = SummaryAccumulator::new().finalize(run_info()).unwrap();
        assert_eq!(summary.totals.processed, 0);
        assert_eq!(summary.rates.success_rate, 0.0);
        assert_eq!(summary.rates.healing_rate, 0.0);
        assert_eq!(summary.rates.degradation_rate, 0.0);
        assert_eq!(summary.average_confidence.degraded, 0.0);
    }

    #[test]
    fn test_fold_counts_rates_and_averages() {
        let summary = SummaryAccumulator::from_outcomes(&sample())
            .finalize(run_info())
            .unwrap();

        let t = summary.totals;
        assert_eq!((t.processed, t.success, t.healed, t.degraded), (4, 2, 1, 1));
        assert_eq!(t.success + t.healed + t.degraded, t.processed);
        assert_eq!(summary.rates.success_rate, 0.5);
        assert_eq!(summary.rates.healing_rate, 0.25);
        assert_eq!(summary.rates.degradation_rate, 0.25);
        assert!((summary.average_confidence.success - 0.8).abs() < 1e-9);
        assert_eq!(summary.average_confidence.degraded, 0.5);
        assert_eq!(summary.sentiment_distribution.get(Sentiment::Positive), 2);
    }

    #[test]
    fn test_correlation_skips_missing_stars() {
        let summary = SummaryAccumulator::from_outcomes(&sample())
            .finalize(run_info())
            .unwrap();

        assert_eq!(summary.star_sentiment_correlation.len(), 2);
        assert_eq!(summary.star_sentiment_correlation[&5u8].positive, 2);
        assert_eq!(summary.star_sentiment_correlation[&1u8].negative, 1);
        let correlated: u64 = summary.star_sentiment_correlation.values().map(|c| c.total()).sum();
        assert_eq!(correlated, 3);
    }

    #[test]
    fn test_merge_matches_sequential_fold() {
        let outcomes = sample();
        let sequential = SummaryAccumulator::from_outcomes(&outcomes);

        let mut merged = SummaryAccumulator::from_outcomes(&outcomes[2..]);
        merged.merge(&SummaryAccumulator::from_outcomes(&outcomes[..2]));
        assert_eq!(merged, sequential);

        let mut with_empty = SummaryAccumulator::new();
        with_empty.merge(&sequential);
        assert_eq!(with_empty, sequential);
    }

    #[test]
    fn test_summary_json_shape() {
        let summary = SummaryAccumulator::from_outcomes(&sample())
            .finalize(run_info())
            .unwrap();
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(value["totals"]["processed"], 4);
        assert_eq!(value["rates"]["degradation_rate"], 0.25);
        assert_eq!(value["sentiment_distribution"]["NEUTRAL"], 1);
        assert_eq!(value["star_sentiment_correlation"]["5_star"]["POSITIVE"], 2);
        assert_eq!(value["star_sentiment_correlation"]["1_star"]["NEUTRAL"], 0);
        assert_eq!(value["run_info"]["input_file"], "reviews.json");
        assert!(value["average_confidence"]["healed"].is_number());
    }

    #[test]
    fn test_status_counts_must_partition_processed() {
        let mut acc = SummaryAccumulator::from_outcomes(&sample()[..1]);
        acc.processed = 2;
        acc.sentiment.neutral += 1;

        let err = acc.finalize(run_info()).unwrap_err();
        assert!(matches!(err, PipelineError::Invariant(_)));
        assert!(err.to_string().contains("processed (2)"));
    }

    #[test]
    fn test_sentiment_counts_must_cover_processed() {
        let mut acc = SummaryAccumulator::from_outcomes(&sample());
        acc.sentiment.positive -= 1;

        let err = acc.finalize(run_info()).unwrap_err();
        assert!(matches!(err, PipelineError::Invariant(_)));
        assert!(err.to_string().contains("sentiment distribution"));
    }
}
