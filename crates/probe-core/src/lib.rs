//! Probe harness core library
//!
//! Runs scripted conversational probes against LLM providers, scores each
//! response with text-heuristic metrics, and persists a session artifact.

pub mod domain;
pub mod extract;
pub mod fakes;
pub mod keys;
pub mod metrics;
pub mod obs;
pub mod provider;
pub mod reporting;
pub mod runner;
pub mod scoring;
pub mod telemetry;

pub use domain::{
    mean, ErrorKind, Probe, ProbeError, ProbeResult, ProbeScoring, ProbeSet, Result, Scores,
    Session, SessionSummary,
};

pub use extract::{
    anthropic_text, anthropic_text_or_marker, chat_completion_text, gemini_text, NO_RESPONSE,
};
pub use keys::{
    client_for, resolve_api_key, resolve_api_key_with, validate_all, validate_all_with,
    KeyAvailability,
};
pub use provider::{HttpProvider, Provider, ProviderConfig, ProviderKind};
pub use reporting::{render_summary_text, write_session_artifact, SessionArtifact};
pub use runner::{execute, parse_probe_ids, run, ProbeRunner, RunConfig, DEFAULT_OUTPUT};
pub use scoring::{avs, default_metrics, drift, ici, jaccard_similarity, rsi, Metric};

pub use metrics::METRICS;
pub use obs::{
    emit_artifact_written, emit_probe_scored, emit_provider_error, emit_proxy_request,
    emit_proxy_upstream_error, emit_session_finished, emit_session_started, session_span,
};
pub use telemetry::init_tracing;

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
