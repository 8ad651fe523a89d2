//! Default values for every recognised configuration option.
//! Environment variable names used to override them live next to the defaults.

pub const DEFAULT_CONFIG_PATH: &str = "pipeline.toml";
pub const DEFAULT_PIPELINE_NAME: &str = "self_healing_sentiment_pipeline";

pub const DEFAULT_MAX_TEXT_LENGTH: usize = 512;
pub const DEFAULT_PLACEHOLDER_TEXT: &str = "No review text provided";
pub const DEFAULT_MARKER_TEXT: &str = "[non-text content]";
/// Appended to truncated text; counts toward the maximum length
pub const ELLIPSIS: &str = "...";

pub const DEFAULT_INFERENCE_ENDPOINT: &str = "http://localhost:8000/classify";
pub const DEFAULT_INFERENCE_MODEL: &str = "distilbert-base-uncased-finetuned-sst-2-english";
pub const DEFAULT_INFERENCE_TIMEOUT_SECONDS: f64 = 10.0;
pub const DEFAULT_INFERENCE_RETRIES: u32 = 3;
pub const DEFAULT_INFERENCE_BACKOFF_MS: u64 = 500;
pub const DEFAULT_DEGRADED_CONFIDENCE: f64 = 0.5;
pub const DEFAULT_CONCURRENCY: usize = 4;

// Health thresholds
pub const CRITICAL_DEGRADATION_RATE: f64 = 0.10;
pub const WARNING_HEALING_RATE: f64 = 0.50;

// Environment overrides
pub const ENV_MAX_TEXT_LENGTH: &str = "HEAL_MAX_TEXT_LENGTH";
pub const ENV_PLACEHOLDER_TEXT: &str = "HEAL_PLACEHOLDER_TEXT";
pub const ENV_MARKER_TEXT: &str = "HEAL_MARKER_TEXT";
pub const ENV_INFERENCE_ENDPOINT: &str = "INFERENCE_ENDPOINT";
pub const ENV_INFERENCE_MODEL: &str = "INFERENCE_MODEL";
pub const ENV_INFERENCE_TIMEOUT_SECONDS: &str = "INFERENCE_TIMEOUT_SECONDS";
pub const ENV_INFERENCE_RETRIES: &str = "INFERENCE_RETRIES";
pub const ENV_INFERENCE_BACKOFF_MS: &str = "INFERENCE_BACKOFF_MS";
pub const ENV_DEGRADED_CONFIDENCE: &str = "DEGRADED_CONFIDENCE";
pub const ENV_CONCURRENCY: &str = "PIPELINE_CONCURRENCY";
pub const ENV_PIPELINE_NAME: &str = "PIPELINE_NAME";
pub const ENV_METRICS_ADDR: &str = "METRICS_ADDR";
