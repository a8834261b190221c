//! Heat flow from a Bullard plot.
//!
//! Fourier's law in resistance coordinates gives `T(R) = q·R + T0`, so the
//! slope of temperature against cumulative thermal resistance is the heat
//! flow `q` (W/m²) and the intercept is the surface temperature.

use crate::domain::{HeatFlowEstimate, RegressionMode};
use crate::error::HeatFlowError;
use crate::fit::odr::fit_york;
use crate::math::fit_line;

/// Minimum relative separation for two resistance values to count as distinct.
const DISTINCT_REL_TOL: f64 = 1e-12;

/// Ordinary least squares fit of `temperature = m·resistance + c`.
pub fn fit_heat_flow(resistance: &[f64], temperature: &[f64]) -> Result<HeatFlowEstimate, HeatFlowError> {
    let w = vec![1.0; resistance.len()];
    fit_weighted_line(resistance, temperature, &w)
}

/// Least squares weighted by `1/σ_T²`.
///
/// Zero uncertainties fall back to uniform weights, since an exact point
/// would otherwise carry infinite weight.
pub fn fit_heat_flow_weighted(
    resistance: &[f64],
    temperature: &[f64],
    temperature_sigma: &[f64],
) -> Result<HeatFlowEstimate, HeatFlowError> {
    if temperature_sigma.len() != temperature.len() {
        return Err(HeatFlowError::InsufficientData {
            needed: temperature.len(),
            available: temperature_sigma.len(),
        });
    }
    let w: Vec<f64> = if temperature_sigma.iter().all(|s| s.is_finite() && *s > 0.0) {
        temperature_sigma.iter().map(|s| 1.0 / (s * s)).collect()
    } else {
        vec![1.0; temperature.len()]
    };
    fit_weighted_line(resistance, temperature, &w)
}

/// Dispatch on the configured regression mode.
pub fn fit_with_mode(
    mode: RegressionMode,
    resistance: &[f64],
    resistance_sigma: &[f64],
    temperature: &[f64],
    temperature_sigma: &[f64],
) -> Result<HeatFlowEstimate, HeatFlowError> {
    match mode {
        RegressionMode::Ols => fit_heat_flow(resistance, temperature),
        RegressionMode::Weighted => fit_heat_flow_weighted(resistance, temperature, temperature_sigma),
        RegressionMode::Odr => {
            let seed = fit_heat_flow(resistance, temperature)?;
            fit_york(resistance, resistance_sigma, temperature, temperature_sigma, seed)
        }
    }
}

fn fit_weighted_line(resistance: &[f64], temperature: &[f64], w: &[f64]) -> Result<HeatFlowEstimate, HeatFlowError> {
    ensure_fit_inputs(resistance, temperature)?;
    let (gradient, intercept) = fit_line(resistance, temperature, w).ok_or(HeatFlowError::NumericDomain {
        quantity: "least squares solution",
        value: f64::NAN,
        bound: 0.0,
    })?;
    Ok(HeatFlowEstimate { gradient, intercept })
}

/// Shared preconditions: equal lengths, at least two points, two distinct R values.
pub(crate) fn ensure_fit_inputs(resistance: &[f64], temperature: &[f64]) -> Result<(), HeatFlowError> {
    let n = resistance.len().min(temperature.len());
    if resistance.len() != temperature.len() || n < 2 {
        return Err(HeatFlowError::InsufficientData {
            needed: resistance.len().max(2),
            available: n,
        });
    }
    if let Some(bad) = resistance.iter().chain(temperature.iter()).find(|v| !v.is_finite()) {
        return Err(HeatFlowError::NumericDomain {
            quantity: "regression input",
            value: *bad,
            bound: 0.0,
        });
    }

    let distinct = count_distinct(resistance);
    if distinct < 2 {
        return Err(HeatFlowError::UnderdeterminedFit { distinct });
    }
    Ok(())
}

/// Number of distinct values, saturating at 2 (all the check needs).
fn count_distinct(values: &[f64]) -> usize {
    let Some(&first) = values.first() else {
        return 0;
    };
    let scale = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())).max(1.0);
    if values.iter().any(|v| (v - first).abs() > DISTINCT_REL_TOL * scale) {
        2
    } else {
        1
    }
}
