//! Structured logging setup. The MCP request/response path and the security
//! subsystems log through `tracing`; human-facing CLI banners keep plain
//! `eprintln!` output and are untouched by this module.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber that writes structured JSON lines to
/// stderr. Safe to call once per process; a second call is a no-op.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_env("REPORTALIN_LOG_LEVEL")
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .with_target(false)
        .try_init();
}

/// Fields attached to the one structured log line emitted per request, per
/// the logging contract: `{timestamp, request_id, session_id, method,
/// duration_ms, outcome}`. `timestamp` is supplied by the subscriber itself.
pub struct RequestLog<'a> {
    pub request_id: &'a str,
    pub session_id: &'a str,
    pub method: &'a str,
    pub duration_ms: u128,
    pub outcome: &'a str,
}

impl RequestLog<'_> {
    pub fn emit(&self) {
        if self.outcome == "ok" {
            tracing::info!(
                request_id = self.request_id,
                session_id = self.session_id,
                method = self.method,
                duration_ms = self.duration_ms as u64,
                outcome = self.outcome,
                "request completed"
            );
        } else {
            tracing::warn!(
                request_id = self.request_id,
                session_id = self.session_id,
                method = self.method,
                duration_ms = self.duration_ms as u64,
                outcome = self.outcome,
                "request failed"
            );
        }
    }
}
