//! Text-heuristic response metrics.
//!
//! Every metric shares one contract: score a response against the probe's
//! scoring configuration and the session's prior responses, returning a value
//! in `[0.0, 1.0]`. The runner iterates a configured metric list rather than
//! naming metrics individually.

pub mod avs;
pub mod drift;
pub mod ici;
pub mod rsi;
pub mod tokens;

use std::sync::Arc;

use crate::domain::ProbeScoring;

pub use avs::{avs, Avs, ANCHOR_PHRASES};
pub use drift::{drift, Drift};
pub use ici::{ici, Ici};
pub use rsi::{rsi, Rsi};
pub use tokens::{jaccard_similarity, tokenize};

pub const RSI: &str = "rsi";
pub const AVS: &str = "avs";
pub const ICI: &str = "ici";
pub const DRIFT: &str = "drift";

/// A single response metric.
pub trait Metric: Send + Sync {
    /// Stable name used as the result/summary key.
    fn name(&self) -> &'static str;

    /// Score `response` given the probe's scoring view and the responses
    /// recorded earlier in the session (earliest first).
    fn score(&self, response: &str, probe: &ProbeScoring, history: &[String]) -> f64;
}

/// The metrics the runner applies by default, in scoring order.
pub fn default_metrics() -> Vec<Arc<dyn Metric>> {
    vec![Arc::new(Rsi), Arc::new(Avs), Arc::new(Ici)]
}

pub(crate) fn clamp_unit(score: f64) -> f64 {
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_metric_order() {
        let names: Vec<&str> = default_metrics().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec![RSI, AVS, ICI]);
    }

    #[test]
    fn test_all_metrics_stay_in_unit_interval() {
        let metrics: Vec<Arc<dyn Metric>> = vec![
            Arc::new(Rsi),
            Arc::new(Avs),
            Arc::new(Ici),
            Arc::new(Drift),
        ];
        let probes = [
            ProbeScoring::default(),
            ProbeScoring::with_signals(["panic", "PANIC", ""]),
        ];
        let responses = [
            "",
            "I think my understanding is that I don't know",
            "panic panic panic",
            "I think I think I think in this conversation I'm uncertain",
        ];
        let histories: Vec<Vec<String>> = vec![
            vec![],
            vec!["".to_string()],
            vec!["a b".to_string(), "panic".to_string(), "".to_string()],
        ];

        for metric in &metrics {
            for probe in &probes {
                for response in responses {
                    for history in &histories {
                        let score = metric.score(response, probe, history);
                        assert!(
                            (0.0..=1.0).contains(&score),
                            "{} out of range: {score}",
                            metric.name()
                        );
                    }
                }
            }
        }
    }
}
