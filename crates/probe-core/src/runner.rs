//! Probe runner: sequences probes against one provider and scores them.
//!
//! Probes run strictly one after another. Each probe is scored against the
//! responses of the probes before it, never its own, and its response joins
//! the history only after scoring.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use crate::domain::{mean, Probe, ProbeResult, ProbeSet, Result, Session};
use crate::keys;
use crate::metrics::METRICS;
use crate::obs;
use crate::provider::{Provider, ProviderConfig, ProviderKind};
use crate::reporting::{write_session_artifact, SessionArtifact};
use crate::scoring::{default_metrics, Metric};

/// Default artifact location.
pub const DEFAULT_OUTPUT: &str = "out/results.json";

/// Executes probes against a single provider.
pub struct ProbeRunner {
    provider: Arc<dyn Provider>,
    model: String,
    metrics: Vec<Arc<dyn Metric>>,
}

impl ProbeRunner {
    /// Runner with the default metric list (RSI, AVS, ICI).
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            metrics: default_metrics(),
        }
    }

    /// Replace the metric list. Metrics are applied in the given order.
    pub fn with_metrics(mut self, metrics: Vec<Arc<dyn Metric>>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metric_names(&self) -> Vec<&'static str> {
        self.metrics.iter().map(|m| m.name()).collect()
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Select `probe_ids` from `probe_set` (all when empty) and run them.
    ///
    /// Unknown ids fail before any provider call.
    pub async fn run(&self, probe_set: &ProbeSet, probe_ids: &[String]) -> Result<Session> {
        let selected = probe_set.select(probe_ids)?;
        self.run_probes(&selected).await
    }

    /// Run the given probes in order. Any provider failure aborts the session.
    pub async fn run_probes(&self, probes: &[&Probe]) -> Result<Session> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let span = obs::session_span(&session_id, self.provider.name());
        self.run_session(&session_id, probes).instrument(span).await
    }

    async fn run_session(&self, session_id: &str, probes: &[&Probe]) -> Result<Session> {
        let started = Instant::now();
        obs::emit_session_started(session_id, self.provider.name(), &self.model, probes.len());

        let mut session = Session::new(self.provider.name());
        for (seq, probe) in probes.iter().enumerate() {
            let result = self.run_probe(probe, session.history()).await?;
            obs::emit_probe_scored(&result.probe_id, seq, result.composite);
            METRICS.inc_probes_executed();
            session.record(result);
        }

        obs::emit_session_finished(
            session_id,
            started.elapsed().as_millis() as u64,
            session.results().len(),
            mean(session.results().iter().map(|r| r.composite)),
        );
        METRICS.flush();
        Ok(session)
    }

    async fn run_probe(&self, probe: &Probe, history: &[String]) -> Result<ProbeResult> {
        let prompt = probe.prompt.clone();
        let response = self.provider.generate(&prompt, &self.model).await?;

        let scores: Vec<(String, f64)> = self
            .metrics
            .iter()
            .map(|metric| {
                (
                    metric.name().to_string(),
                    metric.score(&response, &probe.scoring, history),
                )
            })
            .collect();
        let composite = mean(scores.iter().map(|(_, score)| *score));

        Ok(ProbeResult {
            probe_id: probe.id.clone(),
            prompt,
            response,
            scores: scores.into_iter().collect(),
            composite,
        })
    }
}

/// Everything needed for one run from the process boundary.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Provider name, validated against the supported set.
    pub provider: String,
    pub output: PathBuf,
    /// Probe id subset; empty runs every probe.
    pub probe_ids: Vec<String>,
    /// Probe file; the built-in set when `None`.
    pub probes_path: Option<PathBuf>,
    /// Model override; the provider default when `None`.
    pub model: Option<String>,
}

impl RunConfig {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            probe_ids: Vec::new(),
            probes_path: None,
            model: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_probe_ids(mut self, probe_ids: Vec<String>) -> Self {
        self.probe_ids = probe_ids;
        self
    }

    pub fn with_probes_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.probes_path = Some(path.into());
        self
    }

    pub fn load_probes(&self) -> Result<ProbeSet> {
        match &self.probes_path {
            Some(path) => ProbeSet::load(path),
            None => ProbeSet::builtin(),
        }
    }
}

/// Split a comma-separated id list, dropping blanks.
pub fn parse_probe_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Run a full session: validate input, resolve the provider's credential,
/// run the probes, and write the artifact.
///
/// Input errors (unknown provider, unknown probe ids) are raised before the
/// credential is read or any provider call is made.
pub async fn run(config: &RunConfig) -> Result<SessionArtifact> {
    let kind: ProviderKind = config.provider.parse()?;
    let probe_set = config.load_probes()?;
    let selected = probe_set.select(&config.probe_ids)?;

    let provider = keys::client_for(kind, &ProviderConfig::from_env(kind))?;
    let model = config
        .model
        .clone()
        .unwrap_or_else(|| kind.default_model().to_string());

    execute(Arc::new(provider), &model, &selected, &config.output).await
}

/// Run already-selected probes with a ready provider and persist the result.
/// Nothing is written if any probe fails.
pub async fn execute(
    provider: Arc<dyn Provider>,
    model: &str,
    probes: &[&Probe],
    output: &Path,
) -> Result<SessionArtifact> {
    let runner = ProbeRunner::new(provider, model);
    let session = runner.run_probes(probes).await?;
    let artifact = SessionArtifact::from_session(session, &runner.metric_names());
    write_session_artifact(output, &artifact)?;
    obs::emit_artifact_written(output, artifact.results.len());
    Ok(artifact)
}
