//! Metric names and the Prometheus recorder.
//!
//! Sessions and the accept loop record through the `metrics` facade; without
//! an installed recorder every call is a no-op.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the handle used to render a text snapshot. Call once at startup
/// before any metrics are recorded.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Connections accepted and handed to a session (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// Sessions currently running (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// Upgrade handshakes that failed or timed out (counter).
pub const WS_HANDSHAKE_FAILURES_TOTAL: &str = "ws_handshake_failures_total";
/// Frames echoed back (counter, labels: kind).
pub const WS_FRAMES_ECHOED_TOTAL: &str = "ws_frames_echoed_total";
/// Payload bytes echoed back (counter).
pub const WS_BYTES_ECHOED_TOTAL: &str = "ws_bytes_echoed_total";
/// Sessions that ended with an error (counter, labels: reason).
pub const WS_SESSION_ERRORS_TOTAL: &str = "ws_session_errors_total";
/// Session lifetime in seconds (histogram).
pub const WS_SESSION_DURATION_SECONDS: &str = "ws_session_duration_seconds";
/// Failed `accept` calls on the listening socket (counter).
pub const WS_ACCEPT_ERRORS_TOTAL: &str = "ws_accept_errors_total";
/// Payloads that were not valid JSON (counter).
pub const DIAGNOSTIC_DECODE_FAILURES_TOTAL: &str = "diagnostic_decode_failures_total";
