pub mod http_client;
pub mod record_source;
pub mod report_output_adapter;
