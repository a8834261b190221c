//! One Monte Carlo iteration as two pure steps.
//!
//! - [`perturb_inputs`] draws every noisy input from its distribution
//! - [`apply_corrections`] turns one set of draws into resistance and
//!   climate-corrected temperature
//!
//! Neither step touches shared state, so iterations can run in any order
//! and on any thread.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::climate::correction::{
    EpochDraw, clip_time, correction_profile, corrected_temperatures, diffusivity,
};
use crate::domain::{ClipCounts, ConductivitySeries, EpochSet, ThermalResistanceProfile};
use crate::error::HeatFlowError;
use crate::profile::{InterpolatedProfile, depth_placement_sigma, resistance_from_slices};

/// Lowest conductivity a draw may take (W/m/K).
pub const CONDUCTIVITY_FLOOR: f64 = 0.001;

/// Nominal inputs of the simulation, aligned on the conductivity depths.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationInputs {
    pub depths: Vec<f64>,
    pub temperature: Vec<f64>,
    pub temperature_sigma: Vec<f64>,
    pub conductivity: Vec<f64>,
    pub conductivity_sigma: Vec<f64>,
    /// Depth placement uncertainty of each conductivity sample (m).
    pub depth_sigma: Vec<f64>,
}

impl SimulationInputs {
    /// Align an interpolated temperature profile with its conductivity series.
    ///
    /// `measurement_depths` are the measured temperature log depths, used for
    /// the depth placement uncertainty.
    pub fn assemble(
        profile: &InterpolatedProfile,
        conductivity: &ConductivitySeries,
        measurement_depths: &[f64],
    ) -> Result<Self, HeatFlowError> {
        let depths = conductivity.depths();
        if profile.depths.len() != depths.len()
            || profile.depths.iter().zip(depths.iter()).any(|(a, b)| (a - b).abs() > 1e-9)
        {
            return Err(HeatFlowError::MismatchedDepths {
                depth: profile.depths.first().copied().unwrap_or(f64::NAN),
                reason: "interpolated profile does not match the conductivity depths".to_string(),
            });
        }

        Ok(Self {
            depth_sigma: depth_placement_sigma(&depths, measurement_depths),
            depths,
            temperature: profile.temperature.clone(),
            temperature_sigma: profile.uncertainty.clone(),
            conductivity: conductivity.conductivities(),
            conductivity_sigma: conductivity.uncertainties(),
        })
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }
}

/// All random draws of one iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct PerturbedState {
    pub temperature: Vec<f64>,
    pub conductivity: Vec<f64>,
    /// Drawn epochs, one vector per epoch set.
    pub epoch_sets: Vec<Vec<EpochDraw>>,
    pub clips: ClipCounts,
}

/// Resistance and corrected temperature derived from one [`PerturbedState`].
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectedState {
    pub resistance: ThermalResistanceProfile,
    pub corrected_temperature: Vec<f64>,
}

fn normal<R: Rng + ?Sized>(mean: f64, sigma: f64, rng: &mut R) -> f64 {
    let z: f64 = StandardNormal.sample(rng);
    mean + sigma * z
}

/// Draw temperature, conductivity and epochs for one iteration.
///
/// Conductivity draws below [`CONDUCTIVITY_FLOOR`] are clipped and counted,
/// or rejected with `NumericDomain` when `strict` is set. Epoch times are
/// clipped to the step-response range.
pub fn perturb_inputs<R: Rng + ?Sized>(
    inputs: &SimulationInputs,
    epoch_sets: &[EpochSet],
    strict: bool,
    rng: &mut R,
) -> Result<PerturbedState, HeatFlowError> {
    let mut clips = ClipCounts::default();

    let temperature: Vec<f64> = inputs
        .temperature
        .iter()
        .zip(inputs.temperature_sigma.iter())
        .map(|(&t, &s)| normal(t, s, &mut *rng))
        .collect();

    let mut conductivity = Vec::with_capacity(inputs.len());
    for (&k, &s) in inputs.conductivity.iter().zip(inputs.conductivity_sigma.iter()) {
        let draw = normal(k, s, &mut *rng);
        if draw < CONDUCTIVITY_FLOOR || draw.is_nan() {
            if strict {
                return Err(HeatFlowError::NumericDomain {
                    quantity: "conductivity",
                    value: draw,
                    bound: CONDUCTIVITY_FLOOR,
                });
            }
            clips.conductivity_floor += 1;
            conductivity.push(CONDUCTIVITY_FLOOR);
        } else {
            conductivity.push(draw);
        }
    }

    let epoch_sets = epoch_sets
        .iter()
        .map(|set| {
            set.epochs
                .iter()
                .map(|e| EpochDraw {
                    t_start: clip_time(normal(e.t_start, set.timing_sigma, &mut *rng), &mut clips),
                    t_end: clip_time(normal(e.t_end, set.timing_sigma, &mut *rng), &mut clips),
                    delta: normal(e.delta, e.uncertainty, &mut *rng),
                })
                .collect()
        })
        .collect();

    Ok(PerturbedState {
        temperature,
        conductivity,
        epoch_sets,
        clips,
    })
}

/// Resistance from the drawn conductivity and the climate-corrected temperature.
///
/// Diffusivity is evaluated per depth from that depth's drawn conductivity.
pub fn apply_corrections(
    state: &PerturbedState,
    inputs: &SimulationInputs,
    heat_capacity: f64,
    density: f64,
) -> Result<CorrectedState, HeatFlowError> {
    let resistance = resistance_from_slices(
        &inputs.depths,
        &state.conductivity,
        &inputs.conductivity_sigma,
        &inputs.depth_sigma,
    )?;

    let kappas: Vec<f64> = state
        .conductivity
        .iter()
        .map(|&k| diffusivity(k, heat_capacity, density))
        .collect();

    let corrections: Vec<Vec<f64>> = state
        .epoch_sets
        .iter()
        .map(|epochs| correction_profile(&inputs.depths, &kappas, epochs))
        .collect();

    Ok(CorrectedState {
        resistance,
        corrected_temperature: corrected_temperatures(&state.temperature, &corrections),
    })
}
