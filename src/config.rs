use serde::Deserialize;
use std::env::VarError;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::constants::*;
use crate::error::{PipelineError, Result};

/// Immutable pipeline configuration, validated once before any record is touched.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub pipeline_name: String,
    pub max_text_length: usize,
    pub placeholder_text: String,
    pub marker_text: String,
    pub inference_endpoint: String,
    pub inference_model: String,
    pub inference_timeout_seconds: f64,
    pub inference_retries: u32,
    pub inference_backoff_ms: u64,
    pub degraded_confidence: f64,
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pipeline_name: DEFAULT_PIPELINE_NAME.to_string(),
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            placeholder_text: DEFAULT_PLACEHOLDER_TEXT.to_string(),
            marker_text: DEFAULT_MARKER_TEXT.to_string(),
            inference_endpoint: DEFAULT_INFERENCE_ENDPOINT.to_string(),
            inference_model: DEFAULT_INFERENCE_MODEL.to_string(),
            inference_timeout_seconds: DEFAULT_INFERENCE_TIMEOUT_SECONDS,
            inference_retries: DEFAULT_INFERENCE_RETRIES,
            inference_backoff_ms: DEFAULT_INFERENCE_BACKOFF_MS,
            degraded_confidence: DEFAULT_DEGRADED_CONFIDENCE,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// The slice of configuration the diagnoser and healer need
#[derive(Debug, Clone, PartialEq)]
pub struct HealingConfig {
    pub max_text_length: usize,
    pub placeholder_text: String,
    pub marker_text: String,
}

impl Default for HealingConfig {
    fn default() -> Self {
        PipelineConfig::default().healing()
    }
}

/// The slice of configuration the classifier client needs
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
    pub retries: u32,
    pub backoff_base: Duration,
    pub degraded_confidence: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        PipelineConfig::default().inference()
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file and environment overrides, then validate.
    ///
    /// An explicitly requested file must exist. When no path is given the
    /// default `pipeline.toml` is used if present, otherwise built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: PipelineConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply overrides from a key lookup shaped like `std::env::var`.
    ///
    /// Unset keys are skipped. A set but non-UTF-8 value is an error.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> std::result::Result<String, VarError>,
    {
        let lookup = |key: &str| -> Result<Option<String>> {
            match lookup(key) {
                Ok(v) => Ok(Some(v)),
                Err(VarError::NotPresent) => Ok(None),
                Err(e) => Err(PipelineError::Env(e)),
            }
        };
        if let Some(v) = lookup(ENV_PIPELINE_NAME)? {
            self.pipeline_name = v;
        }
        if let Some(v) = lookup(ENV_MAX_TEXT_LENGTH)? {
            self.max_text_length = parse_env(ENV_MAX_TEXT_LENGTH, &v)?;
        }
        if let Some(v) = lookup(ENV_PLACEHOLDER_TEXT)? {
            self.placeholder_text = v;
        }
        if let Some(v) = lookup(ENV_MARKER_TEXT)? {
            self.marker_text = v;
        }
        if let Some(v) = lookup(ENV_INFERENCE_ENDPOINT)? {
            self.inference_endpoint = v;
        }
        if let Some(v) = lookup(ENV_INFERENCE_MODEL)? {
            self.inference_model = v;
        }
        if let Some(v) = lookup(ENV_INFERENCE_TIMEOUT_SECONDS)? {
            self.inference_timeout_seconds = parse_env(ENV_INFERENCE_TIMEOUT_SECONDS, &v)?;
        }
        if let Some(v) = lookup(ENV_INFERENCE_RETRIES)? {
            self.inference_retries = parse_env(ENV_INFERENCE_RETRIES, &v)?;
        }
        if let Some(v) = lookup(ENV_INFERENCE_BACKOFF_MS)? {
            self.inference_backoff_ms = parse_env(ENV_INFERENCE_BACKOFF_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_DEGRADED_CONFIDENCE)? {
            self.degraded_confidence = parse_env(ENV_DEGRADED_CONFIDENCE, &v)?;
        }
        if let Some(v) = lookup(ENV_CONCURRENCY)? {
            self.concurrency = parse_env(ENV_CONCURRENCY, &v)?;
        }
        Ok(())
    }

    /// Reject configurations that would make healing or inference ill-defined.
    pub fn validate(&self) -> Result<()> {
        if self.pipeline_name.trim().is_empty() {
            return Err(PipelineError::Config("pipeline_name must not be empty".into()));
        }
        let min_length = ELLIPSIS.chars().count();
        if self.max_text_length <= min_length {
            return Err(PipelineError::Config(format!(
                "max_text_length must be greater than {}, got {}",
                min_length, self.max_text_length
            )));
        }
        validate_fill_text("placeholder_text", &self.placeholder_text, self.max_text_length)?;
        validate_fill_text("marker_text", &self.marker_text, self.max_text_length)?;
        if self.inference_endpoint.trim().is_empty() {
            return Err(PipelineError::Config("inference_endpoint must not be empty".into()));
        }
        if self.inference_timeout_seconds <= 0.0
            || Duration::try_from_secs_f64(self.inference_timeout_seconds).is_err()
        {
            return Err(PipelineError::Config(format!(
                "inference_timeout_seconds must be a positive number, got {}",
                self.inference_timeout_seconds
            )));
        }
        if self.inference_retries == 0 {
            return Err(PipelineError::Config("inference_retries must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.degraded_confidence) {
            return Err(PipelineError::Config(format!(
                "degraded_confidence must be within [0, 1], got {}",
                self.degraded_confidence
            )));
        }
        if self.concurrency == 0 {
            return Err(PipelineError::Config("concurrency must be at least 1".into()));
        }
        Ok(())
    }

    pub fn healing(&self) -> HealingConfig {
        HealingConfig {
            max_text_length: self.max_text_length,
            placeholder_text: self.placeholder_text.clone(),
            marker_text: self.marker_text.clone(),
        }
    }

    pub fn inference(&self) -> InferenceConfig {
        InferenceConfig {
            endpoint: self.inference_endpoint.clone(),
            model: self.inference_model.clone(),
            timeout: Duration::from_secs_f64(self.inference_timeout_seconds),
            retries: self.inference_retries,
            backoff_base: Duration::from_millis(self.inference_backoff_ms),
            degraded_confidence: self.degraded_confidence,
        }
    }
}

fn parse_env<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| PipelineError::Config(format!("Invalid value '{}' for {}: {}", raw, key, e)))
}

// Fill values must diagnose clean themselves, otherwise healing re-triggers.
fn validate_fill_text(field: &str, value: &str, max_text_length: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PipelineError::Config(format!("{} must not be blank", field)));
    }
    if !value.chars().any(char::is_alphanumeric) {
        return Err(PipelineError::Config(format!(
            "{} must contain at least one letter or digit",
            field
        )));
    }
    if value.chars().count() > max_text_length {
        return Err(PipelineError::Config(format!(
            "{} is longer than max_text_length ({})",
            field, max_text_length
        )));
    }
    Ok(())
}
