pub mod ports;
pub mod batch_use_case;
pub mod diagnose_use_case;
