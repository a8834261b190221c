//! Result exports.
//!
//! - summary CSV: one record per borehole, easy to collect in a spreadsheet
//! - Bullard JSON: the data behind a Bullard plot (no rendering)

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{HeatFlowEstimate, SimulationResult};
use crate::error::AppError;
use crate::simulation::{DeterministicFit, SimulationInputs};

/// One row of the summary CSV; heat flows in mW/m².
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub name: String,
    pub uncorrected_mean: f64,
    pub uncorrected_std: f64,
    pub corrected_mean: f64,
    pub corrected_std: f64,
    pub nsim: usize,
}

impl SummaryRecord {
    pub fn new(name: &str, result: &SimulationResult) -> Self {
        Self {
            name: name.to_string(),
            uncorrected_mean: result.uncorrected.mean,
            uncorrected_std: result.uncorrected.std_dev,
            corrected_mean: result.corrected.mean,
            corrected_std: result.corrected.std_dev,
            nsim: result.nsim,
        }
    }
}

/// A regression line as written to JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BullardLine {
    pub gradient: f64,
    pub intercept: f64,
    pub heat_flow_mw: f64,
}

impl From<HeatFlowEstimate> for BullardLine {
    fn from(est: HeatFlowEstimate) -> Self {
        Self {
            gradient: est.gradient,
            intercept: est.intercept,
            heat_flow_mw: est.heat_flow_mw(),
        }
    }
}

/// Bullard-plot data for one borehole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BullardExport {
    pub tool: String,
    pub name: String,
    pub generated_at: DateTime<Utc>,
    pub depths: Vec<f64>,
    pub resistance: Vec<f64>,
    pub resistance_uncertainty: Vec<f64>,
    pub observed_temperature: Vec<f64>,
    pub corrected_temperature: Vec<f64>,
    pub uncorrected: BullardLine,
    pub corrected: BullardLine,
    /// Monte Carlo mean and RMS of the corrected temperature per depth.
    pub simulated_corrected_mean: Vec<f64>,
    pub simulated_corrected_rms: Vec<f64>,
    pub nsim: usize,
}

impl BullardExport {
    pub fn new(name: &str, inputs: &SimulationInputs, fit: &DeterministicFit, result: &SimulationResult) -> Self {
        Self {
            tool: "heatflow".to_string(),
            name: name.to_string(),
            generated_at: Utc::now(),
            depths: inputs.depths.clone(),
            resistance: fit.resistance.resistance.clone(),
            resistance_uncertainty: fit.resistance.uncertainty.clone(),
            observed_temperature: inputs.temperature.clone(),
            corrected_temperature: fit.corrected_temperature.clone(),
            uncorrected: fit.uncorrected.into(),
            corrected: fit.corrected.into(),
            simulated_corrected_mean: result.corrected_temperature_mean.clone(),
            simulated_corrected_rms: result.corrected_temperature_rms.clone(),
            nsim: result.nsim,
        }
    }
}

pub fn write_summary_csv<W: Write>(out: W, records: &[SummaryRecord]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| AppError::new(2, format!("Failed to write summary CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush summary CSV: {e}")))?;
    Ok(())
}

pub fn export_summary(path: &Path, records: &[SummaryRecord]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create summary CSV '{}': {e}", path.display())))?;
    write_summary_csv(file, records)
}

pub fn write_bullard_json<W: Write>(out: W, export: &BullardExport) -> Result<(), AppError> {
    serde_json::to_writer_pretty(out, export)
        .map_err(|e| AppError::new(2, format!("Failed to write Bullard JSON: {e}")))
}

pub fn export_bullard(path: &Path, export: &BullardExport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create Bullard JSON '{}': {e}", path.display())))?;
    write_bullard_json(file, export)
}
