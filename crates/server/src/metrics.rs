//! Prometheus metrics exposed on `/metrics` (spec §10.1).

use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder. Call once at startup.
pub fn init_metrics() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");
    let _ = HANDLE.set(handle.clone());
    handle
}

/// Renders the current metrics snapshot for the `/metrics` handler.
pub fn render() -> String {
    match HANDLE.get() {
        Some(handle) => handle.render(),
        None => String::new(),
    }
}

pub fn record_turn(tenant_id: &str, channel: &str, seconds: f64) {
    metrics::counter!("frontdesk_turns_total", "tenant_id" => tenant_id.to_string(), "channel" => channel.to_string())
        .increment(1);
    metrics::histogram!("frontdesk_turn_duration_seconds", "tenant_id" => tenant_id.to_string()).record(seconds);
}
