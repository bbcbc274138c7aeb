//! Response Stability Index: absence of the probe's instability signals.

use super::{clamp_unit, Metric, RSI};
use crate::domain::ProbeScoring;

/// `1 - found / total` over the probe's instability signals, matched as
/// case-insensitive substrings. A probe without signals scores 1.0 since
/// instability cannot be detected.
pub fn rsi(response: &str, probe: &ProbeScoring) -> f64 {
    let signals = &probe.instability_signals;
    if signals.is_empty() {
        return 1.0;
    }

    let response_lower = response.to_lowercase();
    let found = signals
        .iter()
        .filter(|signal| response_lower.contains(&signal.to_lowercase()))
        .count();

    clamp_unit(1.0 - found as f64 / signals.len() as f64)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Rsi;

impl Metric for Rsi {
    fn name(&self) -> &'static str {
        RSI
    }

    fn score(&self, response: &str, probe: &ProbeScoring, _history: &[String]) -> f64 {
        rsi(response, probe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_signals_is_stable() {
        assert_eq!(rsi("panic everywhere", &ProbeScoring::default()), 1.0);
    }

    #[test]
    fn test_signal_absent() {
        let probe = ProbeScoring::with_signals(["panic"]);
        assert_eq!(rsi("I think this is grounded.", &probe), 1.0);
    }

    #[test]
    fn test_fraction_of_signals_found() {
        let probe = ProbeScoring::with_signals(["panic", "contradict", "forget", "lost"]);
        assert_eq!(rsi("I PANIC and then I forget", &probe), 0.5);
        assert_eq!(rsi("panic contradict forget lost", &probe), 0.0);
    }

    #[test]
    fn test_signal_case_insensitive() {
        let probe = ProbeScoring::with_signals(["Contradict"]);
        assert_eq!(rsi("I would never contradict myself", &probe), 0.0);
    }
}
