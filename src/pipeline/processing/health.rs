use serde::Serialize;
use std::fmt;

use crate::constants::{CRITICAL_DEGRADATION_RATE, WARNING_HEALING_RATE};
use crate::pipeline::processing::aggregate::{BatchSummary, Rates};

/// Batch-level health. Always recomputed from a summary, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthVerdict {
    Healthy,
    Warning,
    Degraded,
    Critical,
}

impl HealthVerdict {
    /// First matching rule wins; any degradation outranks a high healing rate.
    pub fn evaluate(rates: &Rates) -> Self {
        if rates.degradation_rate > CRITICAL_DEGRADATION_RATE {
            HealthVerdict::Critical
        } else if rates.degradation_rate > 0.0 {
            HealthVerdict::Degraded
        } else if rates.healing_rate > WARNING_HEALING_RATE {
            HealthVerdict::Warning
        } else {
            HealthVerdict::Healthy
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HealthVerdict::Healthy => "HEALTHY",
            HealthVerdict::Warning => "WARNING",
            HealthVerdict::Degraded => "DEGRADED",
            HealthVerdict::Critical => "CRITICAL",
        }
    }

    /// DEGRADED and CRITICAL call for operator attention
    pub fn needs_attention(self) -> bool {
        self >= HealthVerdict::Degraded
    }
}

impl fmt::Display for HealthVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthMetrics {
    pub total_processed: u64,
    pub success_rate: f64,
    pub healing_rate: f64,
    pub degradation_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub pipeline: String,
    pub health_status: HealthVerdict,
    pub metrics: HealthMetrics,
}

impl HealthReport {
    pub fn from_summary(pipeline: &str, summary: &BatchSummary) -> Self {
        Self {
            pipeline: pipeline.to_string(),
            health_status: HealthVerdict::evaluate(&summary.rates),
            metrics: HealthMetrics {
                total_processed: summary.totals.processed,
                success_rate: summary.rates.success_rate,
                healing_rate: summary.rates.healing_rate,
                degradation_rate: summary.rates.degradation_rate,
            },
        }
    }
}
