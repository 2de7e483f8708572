use crate::config::{RangeConfig, ReliabilityConfig};
use crate::domain::services::statistics::relative_standard_deviation;

/// Reliability of an estimate built from real core indices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReliabilityScore {
    pub core_sources: usize,
    pub relative_dispersion: f64,
    pub value: f64,
}

/// Score the confidence in a core rate from the values that produced it.
///
/// More agreeing sources raise the score (bonus capped); disagreement,
/// measured as relative standard deviation, lowers it (penalty capped).
/// The result is clamped into `[config.min, config.max]`.
pub fn score(config: &ReliabilityConfig, core_values: &[f64]) -> ReliabilityScore {
    let core_sources = core_values.len();
    let relative_dispersion = relative_standard_deviation(core_values);

    let bonus = (core_sources as f64 * config.per_source_bonus).min(config.max_source_bonus);
    let penalty =
        (relative_dispersion * config.dispersion_penalty_factor).min(config.max_dispersion_penalty);

    let raw = config.base + bonus - penalty;
    let value = if raw.is_finite() {
        raw.clamp(config.min, config.max)
    } else {
        config.min
    };

    ReliabilityScore {
        core_sources,
        relative_dispersion,
        value,
    }
}

/// Range half-width as a fraction of the rate; wider when reliability is lower
pub fn spread(config: &RangeConfig, reliability: f64) -> f64 {
    config.spread_base + (1.0 - reliability.clamp(0.0, 1.0)) * config.spread_scale
}

/// Rounded `(min, max)` around an already rounded, non-negative rate
pub fn range(rate: f64, spread: f64) -> (f64, f64) {
    let min_rate = (rate * (1.0 - spread)).round().min(rate);
    let max_rate = (rate * (1.0 + spread)).round().max(rate);
    (min_rate, max_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateEngineConfig;

    fn config() -> ReliabilityConfig {
        RateEngineConfig::default().reliability
    }

    #[test]
    fn test_single_source_score() {
        let s = score(&config(), &[1000.0]);
        assert_eq!(s.core_sources, 1);
        assert_eq!(s.relative_dispersion, 0.0);
        assert!((s.value - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_adding_agreeing_source_never_lowers_reliability() {
        let cfg = config();
        let mut values = vec![1000.0];
        let mut previous = score(&cfg, &values).value;
        for _ in 0..8 {
            values.push(1000.0);
            let next = score(&cfg, &values).value;
            assert!(next >= previous);
            previous = next;
        }
        assert!((previous - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_adding_source_at_the_mean_never_lowers_reliability() {
        let cfg = config();
        let a = score(&cfg, &[1000.0, 1100.0]);
        let b = score(&cfg, &[1000.0, 1100.0, 1050.0]);
        assert!(b.value >= a.value);
    }

    #[test]
    fn test_more_disagreement_never_raises_reliability() {
        let cfg = config();
        let tight = score(&cfg, &[1000.0, 1010.0, 990.0]).value;
        let loose = score(&cfg, &[1000.0, 1200.0, 800.0]).value;
        let wild = score(&cfg, &[1000.0, 3000.0, 200.0]).value;
        assert!(tight >= loose);
        assert!(loose >= wild);
    }

    #[test]
    fn test_score_always_inside_band() {
        let cfg = config();
        let inputs: [&[f64]; 5] = [
            &[],
            &[1.0],
            &[1.0, 1_000_000.0],
            &[1000.0; 20],
            &[0.0, 0.0],
        ];
        for values in inputs {
            let s = score(&cfg, values);
            assert!(s.value >= cfg.min && s.value <= cfg.max, "{:?}", s);
        }
    }

    #[test]
    fn test_spread_widens_as_reliability_drops() {
        let range_cfg = RateEngineConfig::default().range;
        assert!((spread(&range_cfg, 1.0) - 0.10).abs() < 1e-12);
        assert!((spread(&range_cfg, 0.4) - 0.16).abs() < 1e-12);
        assert!(spread(&range_cfg, 0.5) > spread(&range_cfg, 0.9));
    }

    #[test]
    fn test_range_contains_rate() {
        for rate in [0.0, 1.0, 3.0, 1077.0, 2999.0] {
            for s in [0.0, 0.1, 0.16, 0.2] {
                let (min_rate, max_rate) = range(rate, s);
                assert!(min_rate <= rate && rate <= max_rate);
            }
        }
        assert_eq!(range(1000.0, 0.1), (900.0, 1100.0));
    }
}
