// Record pipeline: diagnosis, healing, classification, aggregation and health grading

pub mod processing;

pub use processing::aggregate::{BatchSummary, SummaryAccumulator};
pub use processing::health::{HealthReport, HealthVerdict};
pub use processing::record::{RecordOutcome, RecordProcessor};
