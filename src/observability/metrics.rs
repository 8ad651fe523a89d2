//! Metrics for the healing pipeline.
//!
//! All recording goes through the `metrics` facade. Without an installed
//! recorder the calls are no-ops, which is what tests and offline runs get.

use std::fmt;

/// Every metric name emitted by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Healing metrics
    HealingDefectsDetected,
    HealingRecordsHealed,

    // Inference metrics
    InferenceAttemptsFailed,
    InferenceRetries,
    InferenceSuccess,
    InferenceExhausted,
    InferenceDuration,

    // Record metrics
    RecordsProcessed,
    RecordConfidence,

    // Batch metrics
    BatchesCompleted,
    BatchSize,
    BatchHealingRate,
    BatchDegradationRate,
    BatchHealthStatus,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::HealingDefectsDetected => "heal_defects_detected_total",
            MetricName::HealingRecordsHealed => "heal_records_healed_total",

            MetricName::InferenceAttemptsFailed => "heal_inference_attempts_failed_total",
            MetricName::InferenceRetries => "heal_inference_retries_total",
            MetricName::InferenceSuccess => "heal_inference_success_total",
            MetricName::InferenceExhausted => "heal_inference_exhausted_total",
            MetricName::InferenceDuration => "heal_inference_duration_seconds",

            MetricName::RecordsProcessed => "heal_records_processed_total",
            MetricName::RecordConfidence => "heal_record_confidence",

            MetricName::BatchesCompleted => "heal_batches_completed_total",
            MetricName::BatchSize => "heal_batch_size",
            MetricName::BatchHealingRate => "heal_batch_healing_rate",
            MetricName::BatchDegradationRate => "heal_batch_degradation_rate",
            MetricName::BatchHealthStatus => "heal_batch_health_status_total",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            HealingDefectsDetected,
            HealingRecordsHealed,
            InferenceAttemptsFailed,
            InferenceRetries,
            InferenceSuccess,
            InferenceExhausted,
            InferenceDuration,
            RecordsProcessed,
            RecordConfidence,
            BatchesCompleted,
            BatchSize,
            BatchHealingRate,
            BatchDegradationRate,
            BatchHealthStatus,
        ]
        .into_iter()
    }

    /// Returns (phase, description)
    pub fn metadata(&self) -> (&'static str, &'static str) {
        match self {
            MetricName::HealingDefectsDetected => ("healing", "Defects detected by kind"),
            MetricName::HealingRecordsHealed => ("healing", "Records repaired by action"),
            MetricName::InferenceAttemptsFailed => ("inference", "Failed inference attempts by reason"),
            MetricName::InferenceRetries => ("inference", "Inference retries after a failed attempt"),
            MetricName::InferenceSuccess => ("inference", "Successful classifications"),
            MetricName::InferenceExhausted => ("inference", "Classifications that exhausted all retries"),
            MetricName::InferenceDuration => ("inference", "Wall time per classification including retries"),
            MetricName::RecordsProcessed => ("record", "Records processed by status"),
            MetricName::RecordConfidence => ("record", "Confidence distribution"),
            MetricName::BatchesCompleted => ("batch", "Completed batch runs"),
            MetricName::BatchSize => ("batch", "Records per batch"),
            MetricName::BatchHealingRate => ("batch", "Healing rate of the last batch"),
            MetricName::BatchDegradationRate => ("batch", "Degradation rate of the last batch"),
            MetricName::BatchHealthStatus => ("batch", "Health verdicts by status"),
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub mod healing {
    use super::MetricName;

    pub fn defect_detected(defect: &'static str) {
        ::metrics::counter!(MetricName::HealingDefectsDetected.as_str(), "defect" => defect)
            .increment(1);
    }

    pub fn record_healed(action: &'static str) {
        ::metrics::counter!(MetricName::HealingRecordsHealed.as_str(), "action" => action)
            .increment(1);
    }
}

pub mod inference {
    use super::MetricName;

    pub fn attempt_failed(reason: &'static str) {
        ::metrics::counter!(MetricName::InferenceAttemptsFailed.as_str(), "reason" => reason)
            .increment(1);
    }

    pub fn retry() {
        ::metrics::counter!(MetricName::InferenceRetries.as_str()).increment(1);
    }

    pub fn succeeded(attempts: u32) {
        ::metrics::counter!(MetricName::InferenceSuccess.as_str(), "attempts" => attempts.to_string())
            .increment(1);
    }

    pub fn exhausted() {
        ::metrics::counter!(MetricName::InferenceExhausted.as_str()).increment(1);
    }

    pub fn duration(seconds: f64) {
        ::metrics::histogram!(MetricName::InferenceDuration.as_str()).record(seconds);
    }
}

pub mod record {
    use super::MetricName;

    pub fn processed(status: &'static str, confidence: f64) {
        ::metrics::counter!(MetricName::RecordsProcessed.as_str(), "status" => status).increment(1);
        ::metrics::histogram!(MetricName::RecordConfidence.as_str(), "status" => status)
            .record(confidence);
    }
}

pub mod batch {
    use super::MetricName;

    pub fn completed(processed: u64, healing_rate: f64, degradation_rate: f64, health: &'static str) {
        ::metrics::counter!(MetricName::BatchesCompleted.as_str()).increment(1);
        ::metrics::histogram!(MetricName::BatchSize.as_str()).record(processed as f64);
        ::metrics::gauge!(MetricName::BatchHealingRate.as_str()).set(healing_rate);
        ::metrics::gauge!(MetricName::BatchDegradationRate.as_str()).set(degradation_rate);
        ::metrics::counter!(MetricName::BatchHealthStatus.as_str(), "status" => health).increment(1);
    }
}
