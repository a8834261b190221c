//! Shared domain types.
//!
//! Series types validate their ordering invariants on construction so the
//! numerical modules can rely on them without re-checking.

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::HeatFlowError;

/// Seconds in one year (365.25-day tropical-year approximation).
pub const SECONDS_PER_YEAR: f64 = 3.15567e7;

/// Seconds in one thousand years.
pub const SECONDS_PER_KA: f64 = 3.15567e10;

/// One temperature log entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthSample {
    /// Depth below surface (m).
    pub depth: f64,
    /// Temperature (°C).
    pub temperature: f64,
    /// One-sigma temperature uncertainty (°C).
    pub uncertainty: f64,
}

/// Raw borehole temperature log, depth strictly increasing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepthSeries {
    samples: Vec<DepthSample>,
}

impl DepthSeries {
    pub fn new(samples: Vec<DepthSample>) -> Result<Self, HeatFlowError> {
        ensure_strictly_increasing(samples.iter().map(|s| s.depth))?;
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[DepthSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn depths(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.depth).collect()
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.temperature).collect()
    }

    pub fn uncertainties(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.uncertainty).collect()
    }

    pub fn max_depth(&self) -> Option<f64> {
        self.samples.last().map(|s| s.depth)
    }
}

/// One conductivity measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConductivitySample {
    /// Depth below surface (m).
    pub depth: f64,
    /// Thermal conductivity (W/m/K).
    pub conductivity: f64,
    /// One-sigma conductivity uncertainty (W/m/K).
    pub uncertainty: f64,
}

/// Conductivity profile, depth strictly increasing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConductivitySeries {
    samples: Vec<ConductivitySample>,
}

impl ConductivitySeries {
    pub fn new(samples: Vec<ConductivitySample>) -> Result<Self, HeatFlowError> {
        ensure_strictly_increasing(samples.iter().map(|s| s.depth))?;
        Ok(Self { samples })
    }

    /// Drop every sample deeper than `max_depth`.
    ///
    /// Returns the trimmed series and the number of samples removed.
    pub fn trimmed_to(&self, max_depth: f64) -> (Self, usize) {
        let kept: Vec<ConductivitySample> = self
            .samples
            .iter()
            .copied()
            .filter(|s| s.depth <= max_depth)
            .collect();
        let removed = self.samples.len() - kept.len();
        (Self { samples: kept }, removed)
    }

    pub fn samples(&self) -> &[ConductivitySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn depths(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.depth).collect()
    }

    pub fn conductivities(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.conductivity).collect()
    }

    pub fn uncertainties(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.uncertainty).collect()
    }
}

fn ensure_strictly_increasing(depths: impl Iterator<Item = f64>) -> Result<(), HeatFlowError> {
    let mut prev: Option<f64> = None;
    for d in depths {
        if !d.is_finite() {
            return Err(HeatFlowError::NumericDomain {
                quantity: "depth",
                value: d,
                bound: 0.0,
            });
        }
        if let Some(p) = prev {
            if d <= p {
                return Err(HeatFlowError::MismatchedDepths {
                    depth: d,
                    reason: format!("depths must be strictly increasing (previous {p})"),
                });
            }
        }
        prev = Some(d);
    }
    Ok(())
}

/// A historical interval of constant surface temperature, relative to present.
///
/// Times are seconds before present, so `t_end < t_start`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateEpoch {
    pub t_start: f64,
    pub t_end: f64,
    /// Surface temperature during the epoch minus present surface temperature (°C).
    pub delta: f64,
    /// One-sigma uncertainty of `delta` (°C).
    pub uncertainty: f64,
}

impl ClimateEpoch {
    /// Validate and build an epoch. `index` only feeds the error message.
    pub fn new(
        index: usize,
        t_start: f64,
        t_end: f64,
        delta: f64,
        uncertainty: f64,
    ) -> Result<Self, HeatFlowError> {
        if t_start.is_nan() || !t_end.is_finite() || t_end < 0.0 || t_end >= t_start {
            return Err(HeatFlowError::InvalidEpochOrdering { index, t_start, t_end });
        }
        if !delta.is_finite() || !uncertainty.is_finite() || uncertainty < 0.0 {
            return Err(HeatFlowError::NumericDomain {
                quantity: "epoch temperature",
                value: if delta.is_finite() { uncertainty } else { delta },
                bound: 0.0,
            });
        }
        Ok(Self {
            t_start,
            t_end,
            delta,
            uncertainty,
        })
    }
}

/// An ordered collection of epochs sharing one timing uncertainty.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochSet {
    pub name: String,
    pub epochs: Vec<ClimateEpoch>,
    /// One-sigma uncertainty applied to every epoch boundary time (s).
    pub timing_sigma: f64,
}

impl EpochSet {
    pub fn new(name: impl Into<String>, epochs: Vec<ClimateEpoch>, timing_sigma: f64) -> Self {
        Self {
            name: name.into(),
            epochs,
            timing_sigma: timing_sigma.max(0.0),
        }
    }
}

/// Cumulative thermal resistance aligned 1:1 with a conductivity profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalResistanceProfile {
    /// Cumulative resistance (m²·K/W).
    pub resistance: Vec<f64>,
    /// One-sigma uncertainty of each cumulative value.
    pub uncertainty: Vec<f64>,
}

/// Result of regressing temperature on thermal resistance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatFlowEstimate {
    /// Slope dT/dR, i.e. heat flow in W/m².
    pub gradient: f64,
    /// Surface temperature intercept (°C).
    pub intercept: f64,
}

impl HeatFlowEstimate {
    pub fn heat_flow_mw(&self) -> f64 {
        self.gradient * 1000.0
    }

    pub fn predict(&self, resistance: f64) -> f64 {
        self.gradient * resistance + self.intercept
    }
}

/// Mean and population standard deviation of a simulated quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f64,
    pub std_dev: f64,
}

impl Summary {
    /// Mean and population standard deviation; NaN for an empty slice.
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            mean: Statistics::mean(values.iter()),
            std_dev: Statistics::population_std_dev(values.iter()),
        }
    }
}

/// Times a perturbed quantity hit a clipping bound during a simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipCounts {
    pub conductivity_floor: usize,
    pub time_floor: usize,
    pub time_ceiling: usize,
}

impl ClipCounts {
    pub fn merge(self, other: ClipCounts) -> ClipCounts {
        ClipCounts {
            conductivity_floor: self.conductivity_floor + other.conductivity_floor,
            time_floor: self.time_floor + other.time_floor,
            time_ceiling: self.time_ceiling + other.time_ceiling,
        }
    }
}

/// Aggregated Monte Carlo output for one borehole.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub nsim: usize,
    /// Uncorrected heat flow (mW/m²).
    pub uncorrected: Summary,
    /// Climate-corrected heat flow (mW/m²).
    pub corrected: Summary,
    pub uncorrected_intercept: Summary,
    pub corrected_intercept: Summary,
    /// Mean corrected temperature at each conductivity depth.
    pub corrected_temperature_mean: Vec<f64>,
    /// RMS deviation of the corrected temperature at each conductivity depth.
    pub corrected_temperature_rms: Vec<f64>,
    pub clips: ClipCounts,
}

/// How temperature is regressed on resistance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RegressionMode {
    /// Ordinary least squares.
    Ols,
    /// Least squares weighted by 1/σ_T².
    Weighted,
    /// Orthogonal-distance (York) regression with errors in R and T.
    Odr,
}

/// Parameters of the Monte Carlo driver.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Specific heat capacity (J/kg/K).
    pub heat_capacity: f64,
    /// Rock density (kg/m³).
    pub density: f64,
    pub nsim: usize,
    pub seed: u64,
    pub regression: RegressionMode,
    /// Fail instead of clipping non-physical conductivity draws.
    pub strict_numeric: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            heat_capacity: 1000.0,
            density: 2700.0,
            nsim: 10_000,
            seed: 42,
            regression: RegressionMode::Ols,
            strict_numeric: false,
        }
    }
}

/// A full `heatflow run` configuration as understood by the pipeline.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub borehole_path: PathBuf,
    /// Borehole name; defaults to the file stem.
    pub name: Option<String>,
    pub palaeo_path: Option<PathBuf>,
    pub instrumental_path: Option<PathBuf>,

    pub palaeo_timing_sigma_years: f64,
    pub instrumental_timing_sigma_years: f64,
    pub instrumental_block_years: u32,
    pub present_year: Option<i32>,

    /// Smoothing weight λ of the temperature spline (0 interpolates).
    pub spline_smoothing: f64,
    pub simulation: SimulationConfig,

    pub export_summary: Option<PathBuf>,
    pub export_bullard: Option<PathBuf>,
}
