use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::app::ports::{RawInference, SentimentInferencePort};
use crate::config::InferenceConfig;
use crate::error::InferenceError;

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    text: &'a str,
    model: &'a str,
    timeout: f64,
}

#[derive(Debug, Deserialize)]
struct InferenceResponse {
    label: String,
    #[serde(alias = "score")]
    confidence: f64,
}

/// Sentiment inference over HTTP: `POST {endpoint}` with a JSON body, one call per attempt.
pub struct HttpInferenceClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    timeout: Duration,
}

impl HttpInferenceClient {
    pub fn new(config: &InferenceConfig) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| InferenceError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            timeout: config.timeout,
        })
    }
}

#[async_trait]
impl SentimentInferencePort for HttpInferenceClient {
    async fn infer(&self, text: &str) -> Result<RawInference, InferenceError> {
        let request = InferenceRequest {
            text,
            model: &self.model,
            timeout: self.timeout.as_secs_f64(),
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(InferenceError::Status(status.as_u16()));
        }

        let body = resp.bytes().await.map_err(|e| self.map_transport(e))?;
        let parsed: InferenceResponse = serde_json::from_slice(&body)
            .map_err(|e| InferenceError::Malformed(e.to_string()))?;
        Ok(RawInference {
            label: parsed.label,
            confidence: parsed.confidence,
        })
    }
}

impl HttpInferenceClient {
    fn map_transport(&self, err: reqwest::Error) -> InferenceError {
        if err.is_timeout() {
            InferenceError::Timeout(self.timeout.as_secs_f64())
        } else {
            InferenceError::Transport(err.to_string())
        }
    }
}
