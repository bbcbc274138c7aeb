//! Session state: per-probe results, response history, and summaries.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::scoring::{AVS, ICI, RSI};

/// Named scores kept in metric-list order.
///
/// Serializes as a JSON object whose keys follow that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scores(Vec<(String, f64)>);

impl Scores {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| *v)
    }

    /// Set `name`, keeping its position if already present.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Scores {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut scores = Scores::default();
        for (name, value) in iter {
            scores.insert(name, value);
        }
        scores
    }
}

impl Serialize for Scores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

impl<'de> Deserialize<'de> for Scores {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScoresVisitor;

        impl<'de> Visitor<'de> for ScoresVisitor {
            type Value = Scores;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of metric names to scores")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Scores, A::Error> {
                let mut scores = Scores::default();
                while let Some((name, value)) = map.next_entry::<String, f64>()? {
                    scores.insert(name, value);
                }
                Ok(scores)
            }
        }

        deserializer.deserialize_map(ScoresVisitor)
    }
}

/// Scores for one executed probe.
///
/// Metric scores are keyed by metric name and serialized inline, so the
/// default metric list yields `rsi`, `avs` and `ici` fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeResult {
    pub probe_id: String,
    pub prompt: String,
    pub response: String,
    #[serde(flatten)]
    pub scores: Scores,
    /// Arithmetic mean of `scores`.
    pub composite: f64,
}

impl ProbeResult {
    pub fn score(&self, metric: &str) -> Option<f64> {
        self.scores.get(metric)
    }

    pub fn rsi(&self) -> f64 {
        self.score(RSI).unwrap_or_default()
    }

    pub fn avs(&self) -> f64 {
        self.score(AVS).unwrap_or_default()
    }

    pub fn ici(&self) -> f64 {
        self.score(ICI).unwrap_or_default()
    }
}

/// Session-level means of every per-probe score.
///
/// Keys are `mean_<metric>` plus `mean_composite`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    #[serde(flatten)]
    pub means: Scores,
    pub mean_composite: f64,
}

impl SessionSummary {
    /// Summarize `results` over the given metric names. Every mean is 0.0
    /// when `results` is empty.
    pub fn from_results(metric_names: &[&str], results: &[ProbeResult]) -> Self {
        let means = metric_names
            .iter()
            .map(|name| {
                let mean = mean(results.iter().map(|r| r.score(name).unwrap_or_default()));
                (format!("mean_{name}"), mean)
            })
            .collect();

        Self {
            means,
            mean_composite: mean(results.iter().map(|r| r.composite)),
        }
    }

    pub fn mean_of(&self, metric: &str) -> Option<f64> {
        self.means.get(&format!("mean_{metric}"))
    }

    /// All summary fields in display order: metric means, then composite.
    pub fn fields(&self) -> Vec<(String, f64)> {
        let mut fields: Vec<(String, f64)> =
            self.means.iter().map(|(k, v)| (k.to_string(), v)).collect();
        fields.push(("mean_composite".to_string(), self.mean_composite));
        fields
    }
}

/// An in-progress session against one provider.
///
/// `history` only grows, in execution order, and a response is appended
/// only after its own result has been recorded.
#[derive(Debug, Clone)]
pub struct Session {
    provider: String,
    history: Vec<String>,
    results: Vec<ProbeResult>,
}

impl Session {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            history: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Responses of all probes recorded so far, earliest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn results(&self) -> &[ProbeResult] {
        &self.results
    }

    pub fn record(&mut self, result: ProbeResult) {
        self.history.push(result.response.clone());
        self.results.push(result);
    }

    pub fn into_results(self) -> Vec<ProbeResult> {
        self.results
    }
}

/// Arithmetic mean, 0.0 for an empty sequence.
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
