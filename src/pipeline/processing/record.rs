use serde::Serialize;
use tracing::{debug, warn, Instrument};

use crate::config::{HealingConfig, InferenceConfig};
use crate::observability::metrics;
use crate::pipeline::processing::classify::ClassifierClient;
use crate::pipeline::processing::diagnose::Diagnoser;
use crate::pipeline::processing::heal::Healer;
use crate::types::{Defect, HealingAction, ProcessingStatus, Record, Sentiment};

/// Everything the pipeline learned about one record. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordOutcome {
    pub id: String,
    pub stars: Option<u8>,
    pub defect: Defect,
    pub healing_action: HealingAction,
    pub healed: bool,
    pub status: ProcessingStatus,
    pub label: Sentiment,
    pub confidence: f64,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

/// Diagnose, heal and classify a single record.
///
/// Processing is infallible: inference failure becomes a `DEGRADED` outcome
/// carrying the neutral label and the configured low confidence.
#[derive(Clone)]
pub struct RecordProcessor {
    diagnoser: Diagnoser,
    healer: Healer,
    classifier: ClassifierClient,
    degraded_confidence: f64,
}

impl RecordProcessor {
    pub fn new(healing: HealingConfig, inference: &InferenceConfig, classifier: ClassifierClient) -> Self {
        Self {
            diagnoser: Diagnoser::new(healing.max_text_length),
            healer: Healer::new(healing),
            classifier,
            degraded_confidence: inference.degraded_confidence,
        }
    }

    pub async fn process(&self, record: &Record) -> RecordOutcome {
        let span = tracing::info_span!("record", id = %record.id);
        self.process_inner(record).instrument(span).await
    }

    async fn process_inner(&self, record: &Record) -> RecordOutcome {
        let defect = self.diagnoser.diagnose(&record.text);
        let healing = self.healer.heal(&record.text, defect);

        if defect.is_defect() {
            metrics::healing::defect_detected(defect.as_str());
            metrics::healing::record_healed(healing.action.as_str());
            debug!(defect = %defect, action = healing.action.as_str(), "healed record text");
        }

        let outcome = match self.classifier.classify(&healing.text).await {
            Ok(classification) => RecordOutcome {
                id: record.id.clone(),
                stars: record.stars,
                defect,
                healing_action: healing.action,
                healed: healing.healed,
                status: ProcessingStatus::from_outcome(defect, true),
                label: classification.label,
                confidence: classification.confidence,
                attempts: classification.attempts,
                failure_reason: None,
            },
            Err(failure) => {
                warn!(
                    attempts = failure.attempts,
                    reason = %failure.reason,
                    "inference exhausted retries; degrading record"
                );
                RecordOutcome {
                    id: record.id.clone(),
                    stars: record.stars,
                    defect,
                    healing_action: healing.action,
                    healed: healing.healed,
                    status: ProcessingStatus::from_outcome(defect, false),
                    label: Sentiment::Neutral,
                    confidence: self.degraded_confidence,
                    attempts: failure.attempts,
                    failure_reason: Some(failure.reason.to_string()),
                }
            }
        };

        metrics::record::processed(outcome.status.as_str(), outcome.confidence);
        outcome
    }

    /// Degraded outcome for a record whose processing task died before finishing.
    pub fn abandoned(&self, record: &Record, reason: &str) -> RecordOutcome {
        let defect = self.diagnoser.diagnose(&record.text);
        let healing = self.healer.heal(&record.text, defect);
        let outcome = RecordOutcome {
            id: record.id.clone(),
            stars: record.stars,
            defect,
            healing_action: healing.action,
            healed: healing.healed,
            status: ProcessingStatus::from_outcome(defect, false),
            label: Sentiment::Neutral,
            confidence: self.degraded_confidence,
            attempts: 0,
            failure_reason: Some(reason.to_string()),
        };
        metrics::record::processed(outcome.status.as_str(), outcome.confidence);
        outcome
    }
}
