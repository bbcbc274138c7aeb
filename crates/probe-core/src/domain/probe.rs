//! Probe definitions and probe-set loading.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{ProbeError, Result};

/// Probe set compiled into the crate, used when no probe file is given.
pub const BUILTIN_PROBES_YAML: &str = include_str!("../../probes/baseline.yaml");

/// Scoring configuration attached to a probe.
///
/// This is also the view of a probe that metrics receive.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProbeScoring {
    /// Substrings whose presence marks the response as unstable.
    #[serde(default)]
    pub instability_signals: Vec<String>,
}

impl ProbeScoring {
    pub fn with_signals<I, S>(signals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            instability_signals: signals.into_iter().map(Into::into).collect(),
        }
    }
}

/// A single scripted prompt plus its scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Probe {
    /// Unique identifier within a probe set.
    pub id: String,

    /// Prompt text sent to the provider.
    pub prompt: String,

    /// Scoring configuration.
    #[serde(default)]
    pub scoring: ProbeScoring,
}

impl Probe {
    pub fn new(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            scoring: ProbeScoring::default(),
        }
    }

    pub fn with_signals<I, S>(mut self, signals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scoring = ProbeScoring::with_signals(signals);
        self
    }
}

#[derive(Deserialize)]
struct ProbeFile {
    probes: Option<Vec<Probe>>,
}

/// Ordered, immutable collection of probes. File order is execution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeSet {
    probes: Vec<Probe>,
}

impl ProbeSet {
    /// Build a probe set, rejecting duplicate ids.
    pub fn new(probes: Vec<Probe>) -> Result<Self> {
        let mut seen = HashSet::new();
        for probe in &probes {
            if !seen.insert(probe.id.as_str()) {
                return Err(ProbeError::InvalidProbeFile(format!(
                    "duplicate probe id '{}'",
                    probe.id
                )));
            }
        }
        Ok(Self { probes })
    }

    /// Parse a YAML document with a top-level `probes` list.
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let file: Option<ProbeFile> = serde_yaml::from_str(source)?;
        let probes = file.and_then(|f| f.probes).ok_or_else(|| {
            ProbeError::InvalidProbeFile("expected list at 'probes'".to_string())
        })?;
        Self::new(probes)
    }

    /// Load probes from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&source).map_err(|err| match err {
            ProbeError::InvalidProbeFile(msg) => {
                ProbeError::InvalidProbeFile(format!("{msg} in {}", path.display()))
            }
            other => other,
        })
    }

    /// The probe set shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_PROBES_YAML)
    }

    pub fn probes(&self) -> &[Probe] {
        &self.probes
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Select probes by id, preserving file order.
    ///
    /// Blank ids are ignored; an empty request selects every probe. Any
    /// requested id not in the set fails with the sorted missing ids.
    pub fn select(&self, requested: &[String]) -> Result<Vec<&Probe>> {
        let wanted: BTreeSet<&str> = requested
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .collect();

        if wanted.is_empty() {
            return Ok(self.probes.iter().collect());
        }

        let selected: Vec<&Probe> = self
            .probes
            .iter()
            .filter(|p| wanted.contains(p.id.as_str()))
            .collect();

        let found: BTreeSet<&str> = selected.iter().map(|p| p.id.as_str()).collect();
        let missing: Vec<String> = wanted
            .difference(&found)
            .map(|id| id.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(ProbeError::UnknownProbeIds(missing));
        }
        Ok(selected)
    }
}
