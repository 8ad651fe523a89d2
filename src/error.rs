use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Aggregation invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Reasons a single inference attempt can fail. These never leave the
/// record processor; they end up as the failure reason of a degraded outcome.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("inference timed out after {0:.2}s")]
    Timeout(f64),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("inference service returned status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("unknown sentiment label '{0}'")]
    UnknownLabel(String),

    #[error("confidence {0} outside [0, 1]")]
    ConfidenceOutOfRange(f64),
}

impl InferenceError {
    /// Short, stable tag used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            InferenceError::Timeout(_) => "timeout",
            InferenceError::Transport(_) => "transport",
            InferenceError::Status(_) => "status",
            InferenceError::Malformed(_) => "malformed",
            InferenceError::UnknownLabel(_) => "unknown_label",
            InferenceError::ConfidenceOutOfRange(_) => "confidence_out_of_range",
        }
    }
}
