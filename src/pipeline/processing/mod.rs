// Per-record stages first, then batch-level aggregation and grading

pub mod diagnose;
pub mod heal;
pub mod classify;
pub mod record;
pub mod aggregate;
pub mod health;
