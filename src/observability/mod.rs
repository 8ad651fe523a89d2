// Observability: metrics recorder installation and per-phase recording helpers

pub mod metrics;

use std::net::SocketAddr;
use std::sync::Once;
use tracing::{debug, info, warn};

static INIT: Once = Once::new();

/// Install the Prometheus recorder with an HTTP scrape endpoint.
///
/// Idempotent. Only called when `METRICS_ADDR` is configured; without a
/// recorder every metric call is a no-op.
pub fn init_metrics(addr: &str) {
    INIT.call_once(|| {
        let addr: SocketAddr = match addr.parse() {
            Ok(a) => a,
            Err(e) => {
                warn!("Invalid metrics addr '{}': {}; metrics exporter disabled", addr, e);
                return;
            }
        };

        match metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
        {
            Ok(()) => {
                for metric in metrics::MetricName::all_metrics() {
                    let (phase, help) = metric.metadata();
                    debug!(metric = metric.as_str(), phase, "{}", help);
                }
                info!("Prometheus exporter listening at http://{}/metrics", addr);
            }
            Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
        }
    });
}
