//! Prometheus metrics.
//!
//! The recorder is installed once at startup; the returned handle renders
//! the scrape body for `GET /metrics`.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Total RPC dispatches, labeled by `method`.
pub const RPC_REQUESTS_TOTAL: &str = "rpc_requests_total";
/// Failed RPC dispatches, labeled by `method` and wire `code`.
pub const RPC_ERRORS_TOTAL: &str = "rpc_errors_total";
/// Chat messages accepted into the pipeline.
pub const CHAT_SENDS_TOTAL: &str = "chat_sends_total";
/// Chat sends where the gateway failed and the fallback reply was returned
/// to the pipeline's error path.
pub const CHAT_GENERATION_FAILURES_TOTAL: &str = "chat_generation_failures_total";

/// Install the global Prometheus recorder and return its render handle.
///
/// # Panics
///
/// Panics if a recorder is already installed. Called exactly once from
/// `main` before the server starts.
pub fn install_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install metrics recorder")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
