//! Reduction of per-iteration outcomes into summary statistics.

use crate::domain::{ClipCounts, HeatFlowEstimate, SimulationResult, Summary};

/// Everything one iteration contributes to the aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationOutcome {
    pub uncorrected: HeatFlowEstimate,
    pub corrected: HeatFlowEstimate,
    pub corrected_temperature: Vec<f64>,
    pub clips: ClipCounts,
}

/// Mean and population standard deviation over all outcomes.
///
/// Heat flows are reported in mW/m². The reduction is order-insensitive up
/// to floating-point rounding.
pub fn aggregate(outcomes: &[IterationOutcome]) -> SimulationResult {
    let column = |f: &dyn Fn(&IterationOutcome) -> f64| -> Vec<f64> { outcomes.iter().map(f).collect() };

    let uncorrected = Summary::from_values(&column(&|o| o.uncorrected.heat_flow_mw()));
    let corrected = Summary::from_values(&column(&|o| o.corrected.heat_flow_mw()));
    let uncorrected_intercept = Summary::from_values(&column(&|o| o.uncorrected.intercept));
    let corrected_intercept = Summary::from_values(&column(&|o| o.corrected.intercept));

    let depths = outcomes.first().map(|o| o.corrected_temperature.len()).unwrap_or(0);
    let per_depth: Vec<Summary> = (0..depths)
        .map(|i| Summary::from_values(&column(&|o| o.corrected_temperature[i])))
        .collect();

    let clips = outcomes
        .iter()
        .fold(ClipCounts::default(), |acc, o| acc.merge(o.clips));

    SimulationResult {
        nsim: outcomes.len(),
        uncorrected,
        corrected,
        uncorrected_intercept,
        corrected_intercept,
        corrected_temperature_mean: per_depth.iter().map(|s| s.mean).collect(),
        corrected_temperature_rms: per_depth.iter().map(|s| s.std_dev).collect(),
        clips,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(m: f64, mc: f64, temps: [f64; 2]) -> IterationOutcome {
        IterationOutcome {
            uncorrected: HeatFlowEstimate {
                gradient: m,
                intercept: 10.0,
            },
            corrected: HeatFlowEstimate {
                gradient: mc,
                intercept: 12.0,
            },
            corrected_temperature: temps.to_vec(),
            clips: ClipCounts {
                conductivity_floor: 1,
                time_floor: 0,
                time_ceiling: 0,
            },
        }
    }

    #[test]
    fn aggregates_in_milliwatts_with_population_spread() {
        let result = aggregate(&[outcome(0.06, 0.07, [1.0, 3.0]), outcome(0.08, 0.09, [3.0, 3.0])]);
        assert_eq!(result.nsim, 2);
        assert!((result.uncorrected.mean - 70.0).abs() < 1e-9);
        assert!((result.uncorrected.std_dev - 10.0).abs() < 1e-9);
        assert!((result.corrected.mean - 80.0).abs() < 1e-9);
        assert_eq!(result.corrected_temperature_mean, vec![2.0, 3.0]);
        assert!((result.corrected_temperature_rms[0] - 1.0).abs() < 1e-12);
        assert_eq!(result.corrected_temperature_rms[1], 0.0);
        assert_eq!(result.clips.conductivity_floor, 2);
    }

    #[test]
    fn order_does_not_matter() {
        let a = outcome(0.061, 0.071, [1.5, 2.0]);
        let b = outcome(0.058, 0.069, [1.1, 2.2]);
        let c = outcome(0.065, 0.074, [1.9, 2.1]);
        let forward = aggregate(&[a.clone(), b.clone(), c.clone()]);
        let backward = aggregate(&[c, b, a]);
        assert!((forward.corrected.mean - backward.corrected.mean).abs() < 1e-9);
        assert!((forward.corrected.std_dev - backward.corrected.std_dev).abs() < 1e-9);
    }
}
