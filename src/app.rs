//! Top-level application orchestration.
//!
//! `src/main.rs` only sets up logging; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the borehole and climate histories
//! - runs the deterministic fit and the Monte Carlo simulation
//! - prints reports and writes optional exports

use clap::Parser;
use tracing::info;

use crate::cli::{Command, EpochArgs, RunArgs};
use crate::climate::{diffusivity, epoch_envelope};
use crate::domain::{ClimateEpoch, RunConfig, SECONDS_PER_KA, SECONDS_PER_YEAR, SimulationConfig};
use crate::error::AppError;
use crate::io::{BullardExport, SummaryRecord, export_bullard, export_summary};

pub mod pipeline;

/// Entry point for the `heatflow` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Run(args) => handle_run(&args),
        Command::Epoch(args) => handle_epoch(&args),
    }
}

fn handle_run(args: &RunArgs) -> Result<(), AppError> {
    let config = run_config_from_args(args);
    let run = pipeline::run_borehole(&config)?;

    println!("{}", crate::report::format_ingest(&run.borehole));
    println!(
        "{}",
        crate::report::format_summary(&run.inputs, &run.deterministic, &run.result, &config.simulation)
    );

    if let Some(path) = &config.export_summary {
        export_summary(path, &[SummaryRecord::new(&run.borehole.name, &run.result)])?;
        info!(path = %path.display(), "wrote summary CSV");
    }
    if let Some(path) = &config.export_bullard {
        let export = BullardExport::new(&run.borehole.name, &run.inputs, &run.deterministic, &run.result);
        export_bullard(path, &export)?;
        info!(path = %path.display(), "wrote Bullard JSON");
    }

    Ok(())
}

fn handle_epoch(args: &EpochArgs) -> Result<(), AppError> {
    let epoch = ClimateEpoch::new(
        0,
        args.t_start_ka * SECONDS_PER_KA,
        args.t_end_ka * SECONDS_PER_KA,
        args.delta,
        args.sigma,
    )?;
    let depths = depth_grid(args.max_depth, args.step)?;
    let kappa = diffusivity(args.conductivity, args.heat_capacity, args.density);

    let points = epoch_envelope(
        &epoch,
        &depths,
        kappa,
        args.timing_sigma_years * SECONDS_PER_YEAR,
        args.nsim,
        args.seed,
    )?;
    println!("{}", crate::report::format_envelope(&epoch, &points, args.nsim));
    Ok(())
}

pub fn run_config_from_args(args: &RunArgs) -> RunConfig {
    RunConfig {
        borehole_path: args.borehole.clone(),
        name: args.name.clone(),
        palaeo_path: args.palaeo.clone(),
        instrumental_path: args.instrumental.clone(),

        palaeo_timing_sigma_years: args.palaeo_timing_sigma_years,
        instrumental_timing_sigma_years: args.instrumental_timing_sigma_years,
        instrumental_block_years: args.block_years,
        present_year: args.present_year,

        spline_smoothing: args.spline_smoothing,
        simulation: SimulationConfig {
            heat_capacity: args.heat_capacity,
            density: args.density,
            nsim: args.nsim,
            seed: args.seed,
            regression: args.regression,
            strict_numeric: args.strict,
        },

        export_summary: args.export_summary.clone(),
        export_bullard: args.export_bullard.clone(),
    }
}

/// Depths `0, step, 2·step, …` up to and including `max_depth`.
fn depth_grid(max_depth: f64, step: f64) -> Result<Vec<f64>, AppError> {
    if !(step.is_finite() && step > 0.0 && max_depth.is_finite() && max_depth >= 0.0) {
        return Err(AppError::new(
            2,
            format!("Invalid depth grid: max depth {max_depth} m, step {step} m."),
        ));
    }
    let n = (max_depth / step + 1e-9).floor() as usize;
    Ok((0..=n).map(|i| i as f64 * step).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    #[test]
    fn run_args_map_into_config() {
        let cli = Cli::parse_from([
            "heatflow",
            "run",
            "data/bh1.csv",
            "--nsim",
            "500",
            "--regression",
            "odr",
            "--strict",
            "--density",
            "2650",
        ]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        let config = run_config_from_args(&args);
        assert_eq!(config.simulation.nsim, 500);
        assert_eq!(config.simulation.density, 2650.0);
        assert!(config.simulation.strict_numeric);
        assert_eq!(config.simulation.regression, crate::domain::RegressionMode::Odr);
        assert_eq!(config.instrumental_block_years, 10);
        assert!(config.name.is_none());
    }

    #[test]
    fn depth_grid_includes_endpoint() {
        assert_eq!(depth_grid(300.0, 100.0).unwrap(), vec![0.0, 100.0, 200.0, 300.0]);
        assert_eq!(depth_grid(250.0, 100.0).unwrap(), vec![0.0, 100.0, 200.0]);
        assert!(depth_grid(100.0, 0.0).is_err());
    }
}
