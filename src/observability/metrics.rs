//! Metrics collection and exposition.
//!
//! # Metrics
//! - `wallet_enable_total` (counter): enable outcomes by adapter, outcome
//! - `wallet_sign_total` (counter): signing outcomes by adapter, outcome
//! - `wallet_reconnect_attempts_total` (counter): automatic reconnection attempts by adapter
//! - `wallet_reconnect_failed_total` (counter): spent reconnect budgets by adapter
//!
//! # Design Decisions
//! - Outcome label is `ok` or the stable error code
//! - Recording is a no-op until an exporter is installed

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::WalletResult;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

fn outcome<T>(result: &WalletResult<T>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => e.code().as_str(),
    }
}

pub fn record_enable<T>(adapter: &str, result: &WalletResult<T>) {
    metrics::counter!(
        "wallet_enable_total",
        "adapter" => adapter.to_string(),
        "outcome" => outcome(result)
    )
    .increment(1);
}

pub fn record_sign<T>(adapter: &str, result: &WalletResult<T>) {
    metrics::counter!(
        "wallet_sign_total",
        "adapter" => adapter.to_string(),
        "outcome" => outcome(result)
    )
    .increment(1);
}

pub fn record_reconnect_attempt(adapter: &str) {
    metrics::counter!("wallet_reconnect_attempts_total", "adapter" => adapter.to_string())
        .increment(1);
}

pub fn record_reconnect_failed(adapter: &str) {
    metrics::counter!("wallet_reconnect_failed_total", "adapter" => adapter.to_string())
        .increment(1);
}
