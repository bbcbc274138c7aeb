//! Structured observability hooks for probe session lifecycle events.
//!
//! Events are emitted at `info!` level; filter with `RUST_LOG` and switch to
//! JSON lines with the binaries' `--json` flag.

use tracing::info;

/// Session-scoped span tagging every event with session id and provider.
///
/// Attach it to the session future with `tracing::Instrument` rather than
/// entering it, since the session awaits provider calls.
pub fn session_span(session_id: &str, provider: &str) -> tracing::Span {
    tracing::info_span!("probe.session", session_id = %session_id, provider = %provider)
}

/// Emit event: session started.
pub fn emit_session_started(session_id: &str, provider: &str, model: &str, probe_count: usize) {
    info!(
        event = "session.started",
        session_id = %session_id,
        provider = %provider,
        model = %model,
        probe_count = probe_count,
    );
}

/// Emit event: one probe scored. `seq` is the zero-based execution index.
pub fn emit_probe_scored(probe_id: &str, seq: usize, composite: f64) {
    info!(event = "probe.scored", probe_id = %probe_id, seq = seq, composite = composite);
}

/// Emit event: session finished.
pub fn emit_session_finished(
    session_id: &str,
    duration_ms: u64,
    probes_run: usize,
    mean_composite: f64,
) {
    info!(
        event = "session.finished",
        session_id = %session_id,
        duration_ms = duration_ms,
        probes_run = probes_run,
        mean_composite = mean_composite,
    );
}

/// Emit event: session artifact persisted.
pub fn emit_artifact_written(path: &std::path::Path, results: usize) {
    info!(event = "artifact.written", path = %path.display(), results = results);
}

/// Emit event: provider call failed (warning level).
pub fn emit_provider_error(provider: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(event = "provider.error", provider = %provider, error = %error);
}

/// Emit event: proxy request received.
pub fn emit_proxy_request(message_count: usize) {
    info!(event = "proxy.request", message_count = message_count);
}

/// Emit event: proxy upstream call failed (warning level).
pub fn emit_proxy_upstream_error(error: &dyn std::fmt::Display) {
    tracing::warn!(event = "proxy.upstream_error", error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_span_create() {
        let _entered = session_span("test-session", "openai").entered();
        emit_probe_scored("p1", 0, 0.5);
    }
}
