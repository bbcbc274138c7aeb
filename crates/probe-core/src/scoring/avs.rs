//! Anchored Value Score: presence of grounded, self-locating language.

use super::{clamp_unit, Metric, AVS};
use crate::domain::ProbeScoring;

/// Phrases taken as evidence of grounded language.
pub const ANCHOR_PHRASES: [&str; 5] = [
    "I think",
    "my understanding",
    "I'm uncertain",
    "I don't know",
    "in this conversation",
];

/// Number of distinct anchor phrases that saturates the score.
const SATURATION: f64 = 3.0;

/// Score is `min(1, matches / 3)` where each anchor phrase found
/// (case-insensitive substring) counts once.
pub fn avs(response: &str) -> f64 {
    let response_lower = response.to_lowercase();
    let matches = ANCHOR_PHRASES
        .iter()
        .filter(|phrase| response_lower.contains(&phrase.to_lowercase()))
        .count();
    clamp_unit(matches as f64 / SATURATION)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Avs;

impl Metric for Avs {
    fn name(&self) -> &'static str {
        AVS
    }

    fn score(&self, response: &str, _probe: &ProbeScoring, _history: &[String]) -> f64 {
        avs(response)
    }
}
