//! Internal Consistency Index: agreement with earlier session responses.

use super::tokens::jaccard_similarity;
use super::{clamp_unit, Metric, ICI};
use crate::domain::{mean, ProbeScoring};

/// Mean Jaccard similarity between `response` and each prior response.
/// Consistency holds vacuously (1.0) when there is no history.
pub fn ici(response: &str, history: &[String]) -> f64 {
    if history.is_empty() {
        return 1.0;
    }
    clamp_unit(mean(
        history
            .iter()
            .map(|prior| jaccard_similarity(response, prior)),
    ))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Ici;

impl Metric for Ici {
    fn name(&self) -> &'static str {
        ICI
    }

    fn score(&self, response: &str, _probe: &ProbeScoring, history: &[String]) -> f64 {
        ici(response, history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_history_is_consistent() {
        assert_eq!(ici("anything at all", &[]), 1.0);
    }

    #[test]
    fn test_single_prior_is_jaccard() {
        let prior = vec!["I think this is grounded.".to_string()];
        let response = "I think my understanding is stable.";
        assert_eq!(
            ici(response, &prior),
            jaccard_similarity(response, &prior[0])
        );
    }

    #[test]
    fn test_mean_over_priors_is_order_independent() {
        let response = "a b c";
        let forward = vec!["a b c".to_string(), "x y z".to_string(), "a x".to_string()];
        let mut reversed = forward.clone();
        reversed.reverse();

        let expected = (1.0 + 0.0 + 0.25) / 3.0;
        assert!((ici(response, &forward) - expected).abs() < 1e-12);
        assert!((ici(response, &reversed) - expected).abs() < 1e-12);
    }
}
