use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::app::ports::{RawInference, SentimentInferencePort};
use crate::config::InferenceConfig;
use crate::error::InferenceError;
use crate::observability::metrics;
use crate::types::Sentiment;

/// A validated classification
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: Sentiment,
    pub confidence: f64,
    pub attempts: u32,
}

/// All attempts failed; `reason` is the error of the last one
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationFailure {
    pub reason: InferenceError,
    pub attempts: u32,
}

/// Delay before attempt `attempt + 1`, growing linearly with the attempt number.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(attempt)
}

/// Calls the inference service with a per-attempt timeout and bounded retries.
///
/// Never returns an error to the caller in the `Err`-propagation sense: an
/// exhausted retry budget comes back as `ClassificationFailure` so the record
/// processor can degrade the record instead of aborting the batch.
#[derive(Clone)]
pub struct ClassifierClient {
    port: Arc<dyn SentimentInferencePort>,
    timeout: Duration,
    retries: u32,
    backoff_base: Duration,
}

impl ClassifierClient {
    pub fn new(port: Arc<dyn SentimentInferencePort>, config: &InferenceConfig) -> Self {
        Self {
            port,
            timeout: config.timeout,
            retries: config.retries.max(1),
            backoff_base: config.backoff_base,
        }
    }

    pub async fn classify(&self, text: &str) -> Result<Classification, ClassificationFailure> {
        let started = Instant::now();
        let mut attempt = 0;
        let mut last_err = InferenceError::Transport("no attempt made".to_string());

        while attempt < self.retries {
            attempt += 1;
            match self.attempt(text).await {
                Ok((label, confidence)) => {
                    metrics::inference::succeeded(attempt);
                    metrics::inference::duration(started.elapsed().as_secs_f64());
                    debug!(attempt, label = %label, confidence, "inference succeeded");
                    return Ok(Classification {
                        label,
                        confidence,
                        attempts: attempt,
                    });
                }
                Err(err) => {
                    metrics::inference::attempt_failed(err.kind());
                    warn!(
                        attempt,
                        max_attempts = self.retries,
                        error = %err,
                        "inference attempt failed"
                    );
                    last_err = err;
                }
            }

            if attempt < self.retries {
                metrics::inference::retry();
                let delay = backoff_delay(self.backoff_base, attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        metrics::inference::exhausted();
        metrics::inference::duration(started.elapsed().as_secs_f64());
        Err(ClassificationFailure {
            reason: last_err,
            attempts: attempt,
        })
    }

    async fn attempt(&self, text: &str) -> Result<(Sentiment, f64), InferenceError> {
        let raw = tokio::time::timeout(self.timeout, self.port.infer(text))
            .await
            .map_err(|_| InferenceError::Timeout(self.timeout.as_secs_f64()))??;
        validate(raw)
    }
}

/// Label must be a known sentiment and confidence must lie in [0, 1].
pub fn validate(raw: RawInference) -> Result<(Sentiment, f64), InferenceError> {
    let label = Sentiment::parse(&raw.label).ok_or(InferenceError::UnknownLabel(raw.label))?;
    if !raw.confidence.is_finite() || !(0.0..=1.0).contains(&raw.confidence) {
        return Err(InferenceError::ConfidenceOutOfRange(raw.confidence));
    }
    Ok((label, raw.confidence))
}
