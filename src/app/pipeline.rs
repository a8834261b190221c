//! Shared single-borehole pipeline.
//!
//! load -> trim -> interpolate onto conductivity depths -> deterministic fit
//! -> Monte Carlo -> aggregate
//!
//! Numerical failures are wrapped with the borehole name so a caller
//! iterating over many boreholes can report which one failed and why.

use tracing::{info, warn};

use crate::climate::aggregate_instrumental;
use crate::domain::{EpochSet, RunConfig, SECONDS_PER_YEAR, SimulationResult};
use crate::error::{AppError, HeatFlowError};
use crate::io::{BoreholeData, load_borehole, load_instrumental, load_palaeo};
use crate::profile::interpolate_to_depths;
use crate::simulation::{DeterministicFit, MonteCarloDriver, SimulationInputs};

/// All computed outputs of a single `heatflow run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub borehole: BoreholeData,
    pub epoch_sets: Vec<EpochSet>,
    pub inputs: SimulationInputs,
    pub deterministic: DeterministicFit,
    pub result: SimulationResult,
}

/// Load every input named by `config` and run the pipeline.
pub fn run_borehole(config: &RunConfig) -> Result<RunOutput, AppError> {
    let borehole = load_borehole(&config.borehole_path, config.name.as_deref())?;
    let epoch_sets = load_epoch_sets(config)?;
    run_loaded(borehole, epoch_sets, config)
}

/// Climate histories named by `config`, each with its own timing uncertainty.
pub fn load_epoch_sets(config: &RunConfig) -> Result<Vec<EpochSet>, AppError> {
    let mut sets = Vec::new();

    if let Some(path) = &config.palaeo_path {
        let history = load_palaeo(path)?;
        sets.push(EpochSet::new(
            "palaeo",
            history.epochs,
            config.palaeo_timing_sigma_years * SECONDS_PER_YEAR,
        ));
    }

    if let Some(path) = &config.instrumental_path {
        let record = load_instrumental(path)?;
        let epochs = aggregate_instrumental(&record.years, config.instrumental_block_years, config.present_year)?;
        sets.push(EpochSet::new(
            "instrumental",
            epochs,
            config.instrumental_timing_sigma_years * SECONDS_PER_YEAR,
        ));
    }

    if sets.is_empty() {
        warn!("no climate history given; corrected heat flow equals uncorrected");
    }
    Ok(sets)
}

/// Run the pipeline on an already loaded borehole.
pub fn run_loaded(
    borehole: BoreholeData,
    epoch_sets: Vec<EpochSet>,
    config: &RunConfig,
) -> Result<RunOutput, AppError> {
    let name = borehole.name.clone();
    let fail = |e: HeatFlowError| AppError::for_borehole(&name, e);

    let depths = borehole.conductivity.depths();
    let profile =
        interpolate_to_depths(&borehole.temperature, &depths, config.spline_smoothing).map_err(fail)?;
    let inputs =
        SimulationInputs::assemble(&profile, &borehole.conductivity, &borehole.temperature.depths())
            .map_err(fail)?;

    info!(
        borehole = %name,
        temperature_points = borehole.temperature.len(),
        conductivity_points = inputs.len(),
        epoch_sets = epoch_sets.len(),
        "starting heat flow estimate"
    );

    let driver = MonteCarloDriver::new(config.simulation.clone()).map_err(fail)?;
    let deterministic = driver.deterministic(&inputs, &epoch_sets).map_err(fail)?;
    let result = driver.run(&inputs, &epoch_sets).map_err(fail)?;

    Ok(RunOutput {
        borehole,
        epoch_sets,
        inputs,
        deterministic,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClimateEpoch, SECONDS_PER_KA, SimulationConfig};
    use crate::io::read_borehole;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn config(nsim: usize) -> RunConfig {
        RunConfig {
            borehole_path: PathBuf::from("unused.csv"),
            name: None,
            palaeo_path: None,
            instrumental_path: None,
            palaeo_timing_sigma_years: 1000.0,
            instrumental_timing_sigma_years: 0.0,
            instrumental_block_years: 10,
            present_year: None,
            spline_smoothing: 0.0,
            simulation: SimulationConfig {
                nsim,
                ..SimulationConfig::default()
            },
            export_summary: None,
            export_bullard: None,
        }
    }

    fn glacial() -> Vec<EpochSet> {
        vec![EpochSet::new(
            "palaeo",
            vec![ClimateEpoch::new(0, 100.0 * SECONDS_PER_KA, 0.0, -2.0, 0.1).unwrap()],
            0.0,
        )]
    }

    #[test]
    fn scenario_runs_end_to_end() {
        let csv = "\
depth,temperature,temperature_uncertainty,conductivity_depth,conductivity,conductivity_uncertainty
0,10.0,0.1,5,3.0,0.1
10,10.5,0.1,15,3.2,0.1
20,11.0,0.1,,,
";
        let borehole = read_borehole(Cursor::new(csv), "BH1").unwrap();
        let out = run_loaded(borehole, glacial(), &config(200)).unwrap();
        assert_eq!(out.inputs.depths, vec![5.0, 15.0]);
        assert!((out.deterministic.uncorrected.heat_flow_mw() - 160.0).abs() < 1e-6);
        assert!(out.result.corrected.mean > 0.0);
        assert_eq!(out.result.nsim, 200);
    }

    #[test]
    fn failure_names_the_borehole() {
        // A single conductivity sample cannot define a Bullard line.
        let csv = "depth,temperature,conductivity_depth,conductivity\n0,10,5,3.0\n10,10.5,,\n";
        let borehole = read_borehole(Cursor::new(csv), "BH-short").unwrap();
        let err = run_loaded(borehole, glacial(), &config(10)).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("BH-short"), "{msg}");
        assert!(msg.contains("InsufficientDataError"), "{msg}");
        assert_eq!(err.exit_code(), 3);
    }
}
