//! Session artifact: the single document persisted per run.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ProbeResult, Result, Session, SessionSummary};

/// Immutable record of one session, written once at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionArtifact {
    pub provider: String,
    pub timestamp: DateTime<Utc>,
    pub results: Vec<ProbeResult>,
    pub summary: SessionSummary,
}

impl SessionArtifact {
    /// Freeze a finished session, summarizing over `metric_names`.
    pub fn from_session(session: Session, metric_names: &[&str]) -> Self {
        let provider = session.provider().to_string();
        let results = session.into_results();
        let summary = SessionSummary::from_results(metric_names, &results);
        Self {
            provider,
            timestamp: Utc::now(),
            results,
            summary,
        }
    }
}

/// Write the artifact as pretty JSON, creating parent directories.
pub fn write_session_artifact(path: &Path, artifact: &SessionArtifact) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(artifact)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Human-readable run summary printed by the CLI.
pub fn render_summary_text(artifact: &SessionArtifact) -> String {
    let mut out = String::new();
    out.push_str(&format!("Provider: {}\n", artifact.provider));
    out.push_str(&format!("Timestamp: {}\n", artifact.timestamp.to_rfc3339()));
    out.push_str(&format!("Probes run: {}\n", artifact.results.len()));
    out.push_str("Session summary:\n");
    for (key, value) in artifact.summary.fields() {
        out.push_str(&format!("  - {}: {:.3}\n", key, value));
    }
    out
}
