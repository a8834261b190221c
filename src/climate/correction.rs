//! Palaeoclimate correction of present-day temperatures.
//!
//! A surface temperature step in a conducting half-space propagates as
//! `erfc(z / (2√(κt)))`. An epoch holding the surface at `Tk` (relative to
//! present) between `t_start` and `t_end` seconds before present contributes
//!
//! ```text
//! ΔT(z) = Tk · [erfc(z / (2√(κ t_end))) - erfc(z / (2√(κ t_start)))]
//! ```
//!
//! and contributions from any number of epochs (and epoch sets) add. The
//! corrected temperature is `observed + Σ ΔT`.
//!
//! Numerical notes:
//! - Times are clipped to `[TIME_FLOOR, TIME_CEILING]` before the square root,
//!   so an epoch ending at present (`t = 0`) or starting in the unbounded past
//!   (`t = ∞`) evaluates cleanly.
//! - `ΔT(0) = 0` for every epoch: the surface is pinned to the present value.

use statrs::function::erf::erfc;

use crate::domain::{ClimateEpoch, ClipCounts};

/// Smallest elapsed time used in the step response (s).
pub const TIME_FLOOR: f64 = 1e-6;

/// Largest elapsed time used in the step response (s).
pub const TIME_CEILING: f64 = 1e30;

/// One epoch's boundary times and temperature as used for a single evaluation.
///
/// Unlike [`ClimateEpoch`] this carries no ordering invariant: Monte Carlo
/// draws of the boundaries may cross.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochDraw {
    pub t_start: f64,
    pub t_end: f64,
    pub delta: f64,
}

impl From<&ClimateEpoch> for EpochDraw {
    fn from(epoch: &ClimateEpoch) -> Self {
        Self {
            t_start: epoch.t_start,
            t_end: epoch.t_end,
            delta: epoch.delta,
        }
    }
}

/// Thermal diffusivity κ = k / (cp·ρ) in m²/s.
pub fn diffusivity(conductivity: f64, heat_capacity: f64, density: f64) -> f64 {
    conductivity / (heat_capacity * density)
}

/// Clip an elapsed time into the evaluable range, counting bound hits.
pub fn clip_time(t: f64, clips: &mut ClipCounts) -> f64 {
    if t.is_nan() || t < TIME_FLOOR {
        clips.time_floor += 1;
        TIME_FLOOR
    } else if t > TIME_CEILING {
        clips.time_ceiling += 1;
        TIME_CEILING
    } else {
        t
    }
}

/// Step response `erfc(z / (2√(κt)))` with `t` already clipped.
fn step_response(z: f64, kappa: f64, t: f64) -> f64 {
    erfc(z / (2.0 * (kappa * t).sqrt()))
}

/// Temperature perturbation at depth `z` from a single epoch.
pub fn epoch_perturbation(z: f64, kappa: f64, epoch: &EpochDraw) -> f64 {
    let mut clips = ClipCounts::default();
    let t_end = clip_time(epoch.t_end, &mut clips);
    let t_start = clip_time(epoch.t_start, &mut clips);
    epoch.delta * (step_response(z, kappa, t_end) - step_response(z, kappa, t_start))
}

/// Summed perturbation at depth `z` from a sequence of epochs.
pub fn correction_at(z: f64, kappa: f64, epochs: &[EpochDraw]) -> f64 {
    epochs.iter().map(|e| epoch_perturbation(z, kappa, e)).sum()
}

/// Correction at each depth, with a per-depth diffusivity.
pub fn correction_profile(depths: &[f64], kappas: &[f64], epochs: &[EpochDraw]) -> Vec<f64> {
    depths
        .iter()
        .zip(kappas.iter())
        .map(|(&z, &kappa)| correction_at(z, kappa, epochs))
        .collect()
}

/// Observed temperatures plus every correction profile.
pub fn corrected_temperatures(observed: &[f64], corrections: &[Vec<f64>]) -> Vec<f64> {
    observed
        .iter()
        .enumerate()
        .map(|(i, &t)| t + corrections.iter().map(|c| c[i]).sum::<f64>())
        .collect()
}
