//! Session drift relative to the earliest response.

use super::tokens::jaccard_similarity;
use super::{clamp_unit, Metric, DRIFT};
use crate::domain::ProbeScoring;

/// `1 - similarity(response, earliest prior)`. Drift needs an earliest
/// response distinct from the most recent context, so fewer than two prior
/// responses score 0.0.
pub fn drift(response: &str, history: &[String]) -> f64 {
    match history {
        [earliest, _, ..] => clamp_unit(1.0 - jaccard_similarity(response, earliest)),
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Drift;

impl Metric for Drift {
    fn name(&self) -> &'static str {
        DRIFT
    }

    fn score(&self, response: &str, _probe: &ProbeScoring, history: &[String]) -> f64 {
        drift(response, history)
    }
}
