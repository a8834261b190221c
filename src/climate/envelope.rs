//! Uncertainty envelope of a single epoch's correction.
//!
//! Resamples one epoch's boundary times (with its own timing σ) and
//! temperature, and reports the mean and spread of the resulting correction
//! at each depth. This isolates how much of a borehole's correction
//! uncertainty comes from a single climate epoch.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};
use tracing::debug;

use crate::climate::correction::{EpochDraw, epoch_perturbation};
use crate::domain::{ClimateEpoch, Summary};
use crate::error::HeatFlowError;

/// Correction statistics at one depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopePoint {
    pub depth: f64,
    pub correction: Summary,
}

/// Monte Carlo envelope of `epoch`'s correction over `depths`.
pub fn epoch_envelope(
    epoch: &ClimateEpoch,
    depths: &[f64],
    kappa: f64,
    timing_sigma: f64,
    nsim: usize,
    seed: u64,
) -> Result<Vec<EnvelopePoint>, HeatFlowError> {
    if nsim == 0 {
        return Err(HeatFlowError::InsufficientData {
            needed: 1,
            available: 0,
        });
    }
    if !(kappa.is_finite() && kappa > 0.0) {
        return Err(HeatFlowError::NumericDomain {
            quantity: "diffusivity",
            value: kappa,
            bound: 0.0,
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let timing_sigma = timing_sigma.max(0.0);
    let mut samples = vec![Vec::with_capacity(nsim); depths.len()];

    for _ in 0..nsim {
        let z0: f64 = StandardNormal.sample(&mut rng);
        let z1: f64 = StandardNormal.sample(&mut rng);
        let z2: f64 = StandardNormal.sample(&mut rng);
        let draw = EpochDraw {
            t_start: epoch.t_start + timing_sigma * z0,
            t_end: epoch.t_end + timing_sigma * z1,
            delta: epoch.delta + epoch.uncertainty * z2,
        };
        for (column, &z) in samples.iter_mut().zip(depths.iter()) {
            column.push(epoch_perturbation(z, kappa, &draw));
        }
    }
    debug!(nsim, depths = depths.len(), "epoch envelope simulated");

    Ok(depths
        .iter()
        .zip(samples.iter())
        .map(|(&depth, values)| EnvelopePoint {
            depth,
            correction: Summary::from_values(values),
        })
        .collect())
}
