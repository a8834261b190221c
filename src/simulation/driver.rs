//! Monte Carlo driver.
//!
//! Iterations are independent: each one gets its own `StdRng` seeded from
//! `(seed, iteration index)`, so a run is repeatable for a seed regardless of
//! how rayon schedules the work. Results are collected in iteration order and
//! reduced afterwards.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::climate::correction::EpochDraw;
use crate::domain::{
    ClipCounts, EpochSet, HeatFlowEstimate, SimulationConfig, SimulationResult,
    ThermalResistanceProfile,
};
use crate::error::HeatFlowError;
use crate::fit::fit_with_mode;
use crate::simulation::aggregate::{IterationOutcome, aggregate};
use crate::simulation::perturb::{
    CorrectedState, PerturbedState, SimulationInputs, apply_corrections, perturb_inputs,
};

/// Single unperturbed pass: nominal inputs and nominal epochs.
#[derive(Debug, Clone, PartialEq)]
pub struct DeterministicFit {
    pub resistance: ThermalResistanceProfile,
    pub uncorrected: HeatFlowEstimate,
    pub corrected: HeatFlowEstimate,
    pub corrected_temperature: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct MonteCarloDriver {
    config: SimulationConfig,
}

impl MonteCarloDriver {
    pub fn new(config: SimulationConfig) -> Result<Self, HeatFlowError> {
        if config.nsim == 0 {
            return Err(HeatFlowError::InsufficientData {
                needed: 1,
                available: 0,
            });
        }
        for (quantity, value) in [("heat capacity", config.heat_capacity), ("density", config.density)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(HeatFlowError::NumericDomain {
                    quantity,
                    value,
                    bound: 0.0,
                });
            }
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run `nsim` perturbed iterations and aggregate them.
    pub fn run(&self, inputs: &SimulationInputs, epoch_sets: &[EpochSet]) -> Result<SimulationResult, HeatFlowError> {
        ensure_inputs(inputs)?;
        let cfg = &self.config;
        info!(
            nsim = cfg.nsim,
            depths = inputs.len(),
            epoch_sets = epoch_sets.len(),
            threads = rayon::current_num_threads(),
            "running monte carlo"
        );

        let outcomes = (0..cfg.nsim)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(iteration_seed(cfg.seed, i));
                let state = perturb_inputs(inputs, epoch_sets, cfg.strict_numeric, &mut rng)?;
                self.evaluate(&state, inputs)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let result = aggregate(&outcomes);
        log_clips(&result.clips, cfg.nsim);
        info!(
            uncorrected_mw = result.uncorrected.mean,
            corrected_mw = result.corrected.mean,
            "monte carlo complete"
        );
        Ok(result)
    }

    /// Fit the nominal profile once, without any perturbation.
    pub fn deterministic(&self, inputs: &SimulationInputs, epoch_sets: &[EpochSet]) -> Result<DeterministicFit, HeatFlowError> {
        ensure_inputs(inputs)?;
        let state = PerturbedState {
            temperature: inputs.temperature.clone(),
            conductivity: inputs.conductivity.clone(),
            epoch_sets: epoch_sets
                .iter()
                .map(|set| set.epochs.iter().map(EpochDraw::from).collect())
                .collect(),
            clips: ClipCounts::default(),
        };
        let CorrectedState {
            resistance,
            corrected_temperature,
        } = apply_corrections(&state, inputs, self.config.heat_capacity, self.config.density)?;

        let uncorrected = self.regress(&resistance, &state.temperature, inputs)?;
        let corrected = self.regress(&resistance, &corrected_temperature, inputs)?;
        debug!(
            uncorrected_mw = uncorrected.heat_flow_mw(),
            corrected_mw = corrected.heat_flow_mw(),
            "deterministic fit"
        );

        Ok(DeterministicFit {
            resistance,
            uncorrected,
            corrected,
            corrected_temperature,
        })
    }

    fn evaluate(&self, state: &PerturbedState, inputs: &SimulationInputs) -> Result<IterationOutcome, HeatFlowError> {
        let corrected_state = apply_corrections(state, inputs, self.config.heat_capacity, self.config.density)?;
        let uncorrected = self.regress(&corrected_state.resistance, &state.temperature, inputs)?;
        let corrected = self.regress(
            &corrected_state.resistance,
            &corrected_state.corrected_temperature,
            inputs,
        )?;
        Ok(IterationOutcome {
            uncorrected,
            corrected,
            corrected_temperature: corrected_state.corrected_temperature,
            clips: state.clips,
        })
    }

    fn regress(
        &self,
        resistance: &ThermalResistanceProfile,
        temperature: &[f64],
        inputs: &SimulationInputs,
    ) -> Result<HeatFlowEstimate, HeatFlowError> {
        fit_with_mode(
            self.config.regression,
            &resistance.resistance,
            &resistance.uncertainty,
            temperature,
            &inputs.temperature_sigma,
        )
    }
}

fn ensure_inputs(inputs: &SimulationInputs) -> Result<(), HeatFlowError> {
    let n = inputs.len();
    let shortest = [
        inputs.temperature.len(),
        inputs.temperature_sigma.len(),
        inputs.conductivity.len(),
        inputs.conductivity_sigma.len(),
        inputs.depth_sigma.len(),
    ]
    .into_iter()
    .min()
    .unwrap_or(0);
    if n < 2 || shortest != n {
        return Err(HeatFlowError::InsufficientData {
            needed: n.max(2),
            available: shortest.min(n),
        });
    }
    Ok(())
}

fn log_clips(clips: &ClipCounts, nsim: usize) {
    if clips.conductivity_floor > 0 {
        warn!(
            count = clips.conductivity_floor,
            nsim, "conductivity draws clipped to the floor"
        );
    }
    if clips.time_floor > 0 || clips.time_ceiling > 0 {
        debug!(
            floor = clips.time_floor,
            ceiling = clips.time_ceiling,
            "epoch times clipped"
        );
    }
}

/// Per-iteration seed; stable across runs and thread counts.
fn iteration_seed(seed: u64, iteration: usize) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    iteration.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ClimateEpoch, ConductivitySample, ConductivitySeries, DepthSample, DepthSeries, RegressionMode,
        SECONDS_PER_KA, SECONDS_PER_YEAR,
    };
    use crate::profile::interpolate_to_depths;

    fn config(nsim: usize) -> SimulationConfig {
        SimulationConfig {
            nsim,
            ..SimulationConfig::default()
        }
    }

    fn scenario(temperature_sigma: f64, conductivity_sigma: f64) -> SimulationInputs {
        let series = DepthSeries::new(
            [(0.0, 10.0), (10.0, 10.5), (20.0, 11.0)]
                .into_iter()
                .map(|(depth, temperature)| DepthSample {
                    depth,
                    temperature,
                    uncertainty: temperature_sigma,
                })
                .collect(),
        )
        .unwrap();
        let conductivity = ConductivitySeries::new(
            [(5.0, 3.0), (15.0, 3.2)]
                .into_iter()
                .map(|(depth, conductivity)| ConductivitySample {
                    depth,
                    conductivity,
                    uncertainty: conductivity_sigma,
                })
                .collect(),
        )
        .unwrap();
        let profile = interpolate_to_depths(&series, &conductivity.depths(), 0.0).unwrap();
        SimulationInputs::assemble(&profile, &conductivity, &series.depths()).unwrap()
    }

    fn glacial(delta_sigma: f64, timing_sigma: f64) -> EpochSet {
        EpochSet::new(
            "palaeo",
            vec![ClimateEpoch::new(0, 100.0 * SECONDS_PER_KA, 0.0, -2.0, delta_sigma).unwrap()],
            timing_sigma,
        )
    }

    #[test]
    fn rejects_invalid_config() {
        assert_eq!(
            MonteCarloDriver::new(config(0)).unwrap_err().kind(),
            "InsufficientDataError"
        );
        let bad = SimulationConfig {
            density: 0.0,
            ..config(10)
        };
        assert_eq!(MonteCarloDriver::new(bad).unwrap_err().kind(), "NumericDomainError");
    }

    #[test]
    fn deterministic_scenario_matches_hand_calculation() {
        let inputs = scenario(0.1, 0.1);
        let driver = MonteCarloDriver::new(config(1)).unwrap();
        let fit = driver.deterministic(&inputs, &[glacial(0.1, 0.0)]).unwrap();

        assert!((fit.resistance.resistance[0] - 5.0 / 3.0).abs() < 1e-12);
        assert!((fit.resistance.resistance[1] - (5.0 / 3.0 + 10.0 / 3.2)).abs() < 1e-12);
        assert!((fit.uncorrected.heat_flow_mw() - 160.0).abs() < 1e-6);

        assert!(fit.corrected.heat_flow_mw() > 0.0);
        // The correction decays with depth, so the corrected gradient is shallower.
        assert!(fit.corrected.gradient < fit.uncorrected.gradient);
        for (c, t) in fit.corrected_temperature.iter().zip(inputs.temperature.iter()) {
            assert!(c > t);
        }
    }

    #[test]
    fn zero_uncertainty_reproduces_deterministic_fit() {
        let inputs = scenario(0.0, 0.0);
        let sets = [glacial(0.0, 0.0)];
        for nsim in [1, 50] {
            let driver = MonteCarloDriver::new(config(nsim)).unwrap();
            let reference = driver.deterministic(&inputs, &sets).unwrap();
            let result = driver.run(&inputs, &sets).unwrap();

            assert_eq!(result.nsim, nsim);
            assert!((result.uncorrected.mean - reference.uncorrected.heat_flow_mw()).abs() < 1e-9);
            assert!((result.corrected.mean - reference.corrected.heat_flow_mw()).abs() < 1e-9);
            assert!((result.corrected_intercept.mean - reference.corrected.intercept).abs() < 1e-9);
            assert!(result.uncorrected.std_dev < 1e-9);
            assert!(result.corrected.std_dev < 1e-9);
            for (m, r) in result
                .corrected_temperature_mean
                .iter()
                .zip(reference.corrected_temperature.iter())
            {
                assert!((m - r).abs() < 1e-9);
            }
            assert!(result.corrected_temperature_rms.iter().all(|v| *v < 1e-9));
        }
    }

    #[test]
    fn noisy_scenario_keeps_corrected_temperature_above_observed() {
        let inputs = scenario(0.1, 0.1);
        let driver = MonteCarloDriver::new(config(400)).unwrap();
        let result = driver
            .run(&inputs, &[glacial(0.1, 1000.0 * SECONDS_PER_YEAR)])
            .unwrap();

        assert!(result.corrected.mean > 0.0);
        assert!(result.uncorrected.std_dev > 0.0);
        for (c, t) in result.corrected_temperature_mean.iter().zip(inputs.temperature.iter()) {
            assert!(c > t, "corrected {c} <= observed {t}");
        }
        // Roughly half of the end-time draws fall before present.
        assert!(result.clips.time_floor > 0);
    }

    #[test]
    fn same_seed_same_result() {
        let inputs = scenario(0.1, 0.2);
        let sets = [glacial(0.1, 500.0 * SECONDS_PER_YEAR)];
        let driver = MonteCarloDriver::new(config(64)).unwrap();
        let a = driver.run(&inputs, &sets).unwrap();
        let b = driver.run(&inputs, &sets).unwrap();
        assert_eq!(a, b);

        let other = MonteCarloDriver::new(SimulationConfig { seed: 7, ..config(64) }).unwrap();
        let c = other.run(&inputs, &sets).unwrap();
        assert_ne!(a.corrected.mean, c.corrected.mean);
    }

    #[test]
    fn every_regression_mode_runs() {
        let inputs = scenario(0.1, 0.1);
        let sets = [glacial(0.1, 0.0)];
        for regression in [RegressionMode::Ols, RegressionMode::Weighted, RegressionMode::Odr] {
            let driver = MonteCarloDriver::new(SimulationConfig {
                regression,
                ..config(20)
            })
            .unwrap();
            let result = driver.run(&inputs, &sets).unwrap();
            assert!(result.corrected.mean.is_finite());
        }
    }

    #[test]
    fn iteration_seeds_differ() {
        assert_ne!(iteration_seed(42, 0), iteration_seed(42, 1));
        assert_eq!(iteration_seed(42, 3), iteration_seed(42, 3));
    }
}
