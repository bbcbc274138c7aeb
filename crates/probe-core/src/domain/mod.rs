//! Domain models for probe sessions.
//!
//! Canonical definitions for the core entities:
//! - `Probe` / `ProbeSet`: scripted prompts and their scoring configuration
//! - `Session`: ordered execution history against one provider
//! - `ProbeResult` / `SessionSummary`: per-probe and session-level scores

pub mod error;
pub mod probe;
pub mod session;

pub use error::{ErrorKind, ProbeError, Result};
pub use probe::{Probe, ProbeScoring, ProbeSet, BUILTIN_PROBES_YAML};
pub use session::{mean, ProbeResult, Scores, Session, SessionSummary};
