//! Cumulative thermal resistance.
//!
//! ```text
//! R_i = Σ_{j≤i} Δz_j / k_j,     Δz_j = z_j - z_{j-1},  z_0 = 0
//! ```
//!
//! Each segment's uncertainty combines the conductivity error with a depth
//! placement error σ_z (distance from the conductivity sample to the nearest
//! temperature measurement):
//!
//! ```text
//! δ_j = (Δz_j/k_j) · sqrt((σ_k/k_j)^2 + (σ_z/Δz_j)^2)
//! ```
//!
//! Segment errors are treated as independent, so `σ_R_i = sqrt(Σ_{j≤i} δ_j^2)`.

use crate::domain::{ConductivitySeries, ThermalResistanceProfile};
use crate::error::HeatFlowError;

/// Resistance profile of a measured conductivity series.
pub fn thermal_resistance(
    series: &ConductivitySeries,
    depth_sigma: &[f64],
) -> Result<ThermalResistanceProfile, HeatFlowError> {
    resistance_from_slices(
        &series.depths(),
        &series.conductivities(),
        &series.uncertainties(),
        depth_sigma,
    )
}

/// Resistance profile from raw arrays (used per Monte Carlo iteration).
pub fn resistance_from_slices(
    depths: &[f64],
    conductivity: &[f64],
    conductivity_sigma: &[f64],
    depth_sigma: &[f64],
) -> Result<ThermalResistanceProfile, HeatFlowError> {
    let n = depths.len();
    if conductivity.len() != n || conductivity_sigma.len() != n || depth_sigma.len() != n {
        return Err(HeatFlowError::InsufficientData {
            needed: n,
            available: conductivity.len().min(conductivity_sigma.len()).min(depth_sigma.len()),
        });
    }

    let mut resistance = Vec::with_capacity(n);
    let mut uncertainty = Vec::with_capacity(n);
    let mut r = 0.0;
    let mut var = 0.0;
    let mut prev_depth = 0.0;

    for i in 0..n {
        let k = conductivity[i];
        if !(k.is_finite() && k > 0.0) {
            return Err(HeatFlowError::NumericDomain {
                quantity: "conductivity",
                value: k,
                bound: 0.0,
            });
        }
        let dz = depths[i] - prev_depth;
        prev_depth = depths[i];

        r += dz / k;
        // (Δz/k)·sqrt((σk/k)² + (σz/Δz)²) without dividing by Δz.
        let from_k = dz * conductivity_sigma[i] / (k * k);
        let from_z = depth_sigma[i] / k;
        var += from_k * from_k + from_z * from_z;

        resistance.push(r);
        uncertainty.push(var.sqrt());
    }

    Ok(ThermalResistanceProfile {
        resistance,
        uncertainty,
    })
}

/// Distance from each conductivity depth to the nearest temperature depth.
pub fn depth_placement_sigma(conductivity_depths: &[f64], measurement_depths: &[f64]) -> Vec<f64> {
    conductivity_depths
        .iter()
        .map(|&z| {
            measurement_depths
                .iter()
                .map(|&m| (m - z).abs())
                .fold(f64::INFINITY, f64::min)
        })
        .map(|d| if d.is_finite() { d } else { 0.0 })
        .collect()
}
