//! Command-line parsing for the borehole heat flow estimator.
//!
//! Argument parsing and command dispatch stay separate from the numerical code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::RegressionMode;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "heatflow",
    version,
    about = "Borehole heat flow with palaeoclimate correction and Monte Carlo uncertainty"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Estimate uncorrected and climate-corrected heat flow for one borehole.
    Run(RunArgs),
    /// Simulate the correction envelope of a single climate epoch over depth.
    Epoch(EpochArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Borehole CSV with temperature and conductivity columns.
    #[arg(value_name = "CSV")]
    pub borehole: PathBuf,

    /// Borehole name used in reports (defaults to the file stem).
    #[arg(long)]
    pub name: Option<String>,

    /// Palaeoclimate history CSV (end_ka, start_ka, delta_t, delta_t_uncertainty).
    #[arg(long, value_name = "CSV")]
    pub palaeo: Option<PathBuf>,

    /// Instrumental record CSV (year, anomaly[, uncertainty]).
    #[arg(long, value_name = "CSV")]
    pub instrumental: Option<PathBuf>,

    /// Number of Monte Carlo iterations.
    #[arg(short = 'n', long, default_value_t = 10_000)]
    pub nsim: usize,

    /// Random seed; each iteration derives its own stream from it.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Specific heat capacity (J/kg/K).
    #[arg(long, default_value_t = 1000.0)]
    pub heat_capacity: f64,

    /// Rock density (kg/m3).
    #[arg(long, default_value_t = 2700.0)]
    pub density: f64,

    /// One-sigma timing uncertainty of palaeoclimate epochs (years).
    #[arg(long, default_value_t = 1000.0)]
    pub palaeo_timing_sigma_years: f64,

    /// One-sigma timing uncertainty of instrumental epochs (years).
    #[arg(long, default_value_t = 0.0)]
    pub instrumental_timing_sigma_years: f64,

    /// Width of the instrumental averaging blocks (years).
    #[arg(long, default_value_t = 10)]
    pub block_years: u32,

    /// Year treated as present for the instrumental record (default: last year + 1).
    #[arg(long)]
    pub present_year: Option<i32>,

    /// Regression used for the Bullard line.
    #[arg(long, value_enum, default_value_t = RegressionMode::Ols)]
    pub regression: RegressionMode,

    /// Smoothing weight of the temperature spline (0 interpolates exactly).
    #[arg(long, default_value_t = 0.0)]
    pub spline_smoothing: f64,

    /// Fail on non-physical conductivity draws instead of clipping them.
    #[arg(long)]
    pub strict: bool,

    /// Write the summary record to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_summary: Option<PathBuf>,

    /// Write Bullard-plot data to JSON.
    #[arg(long, value_name = "JSON")]
    pub export_bullard: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct EpochArgs {
    /// Epoch start (ka before present); `inf` for an unbounded past.
    #[arg(long, allow_hyphen_values = true)]
    pub t_start_ka: f64,

    /// Epoch end (ka before present).
    #[arg(long, default_value_t = 0.0)]
    pub t_end_ka: f64,

    /// Surface temperature relative to present (C).
    #[arg(long, allow_hyphen_values = true)]
    pub delta: f64,

    /// One-sigma uncertainty of `delta` (C).
    #[arg(long, default_value_t = 0.0)]
    pub sigma: f64,

    /// One-sigma timing uncertainty (years).
    #[arg(long, default_value_t = 1000.0)]
    pub timing_sigma_years: f64,

    /// Thermal conductivity (W/m/K).
    #[arg(long, default_value_t = 2.5)]
    pub conductivity: f64,

    #[arg(long, default_value_t = 1000.0)]
    pub heat_capacity: f64,

    #[arg(long, default_value_t = 2700.0)]
    pub density: f64,

    /// Deepest depth of the grid (m).
    #[arg(long, default_value_t = 2000.0)]
    pub max_depth: f64,

    /// Grid spacing (m).
    #[arg(long, default_value_t = 100.0)]
    pub step: f64,

    #[arg(short = 'n', long, default_value_t = 1000)]
    pub nsim: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults() {
        let cli = Cli::parse_from(["heatflow", "run", "bh.csv", "--palaeo", "glacial.csv"]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.nsim, 10_000);
        assert_eq!(args.seed, 42);
        assert_eq!(args.regression, RegressionMode::Ols);
        assert_eq!(args.palaeo_timing_sigma_years, 1000.0);
        assert_eq!(args.palaeo, Some(PathBuf::from("glacial.csv")));
    }

    #[test]
    fn epoch_accepts_negative_delta() {
        let cli = Cli::parse_from(["heatflow", "epoch", "--t-start-ka", "100", "--delta", "-2"]);
        let Command::Epoch(args) = cli.command else {
            panic!("expected epoch");
        };
        assert_eq!(args.delta, -2.0);
        assert_eq!(args.t_end_ka, 0.0);
    }
}
