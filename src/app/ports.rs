use async_trait::async_trait;

use crate::error::InferenceError;

/// Unvalidated answer from the inference service
#[derive(Clone, Debug, PartialEq)]
pub struct RawInference {
    pub label: String,
    pub confidence: f64,
}

/// One inference attempt against the external sentiment service.
///
/// Implementations make exactly one call; retry, backoff, timeout enforcement
/// and response validation belong to the classifier client.
#[async_trait]
pub trait SentimentInferencePort: Send + Sync {
    async fn infer(&self, text: &str) -> Result<RawInference, InferenceError>;
}

/// Destination for the artifacts of a finished batch run
#[async_trait]
pub trait ReportOutputPort: Send + Sync {
    async fn write_report(&self, report: &crate::app::batch_use_case::BatchReport) -> anyhow::Result<()>;
}
