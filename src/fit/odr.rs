//! Straight-line orthogonal-distance regression (York et al., 2004).
//!
//! Both thermal resistance and temperature carry uncertainty. York's method
//! finds the line minimizing the error-weighted orthogonal misfit for
//! uncorrelated errors:
//!
//! ```text
//! W_i = 1 / (σ_T,i² + m² σ_R,i²)
//! β_i = W_i (U_i σ_T,i² + m V_i σ_R,i²)
//! m   = Σ W_i β_i V_i / Σ W_i β_i U_i
//! ```
//!
//! with `U`, `V` the deviations from the `W`-weighted centroid. The slope is
//! iterated from an OLS seed until it stops changing.

use tracing::debug;

use crate::domain::HeatFlowEstimate;
use crate::error::HeatFlowError;
use crate::fit::estimator::ensure_fit_inputs;

const MAX_ITERS: usize = 100;
const REL_TOL: f64 = 1e-12;

/// Variance floor so exact points do not produce infinite weights.
const VAR_FLOOR: f64 = 1e-24;

/// York regression of `temperature` on `resistance`, seeded with `seed`.
pub fn fit_york(
    resistance: &[f64],
    resistance_sigma: &[f64],
    temperature: &[f64],
    temperature_sigma: &[f64],
    seed: HeatFlowEstimate,
) -> Result<HeatFlowEstimate, HeatFlowError> {
    ensure_fit_inputs(resistance, temperature)?;
    let n = resistance.len();
    if resistance_sigma.len() != n || temperature_sigma.len() != n {
        return Err(HeatFlowError::InsufficientData {
            needed: n,
            available: resistance_sigma.len().min(temperature_sigma.len()),
        });
    }

    let var_r: Vec<f64> = resistance_sigma.iter().map(|s| s * s).collect();
    let var_t: Vec<f64> = temperature_sigma.iter().map(|s| s * s).collect();

    // Without any stated error the OLS seed is already the answer.
    if var_r.iter().chain(var_t.iter()).all(|v| *v <= VAR_FLOOR) {
        return Ok(seed);
    }

    let mut m = seed.gradient;
    let mut centroid = (0.0, 0.0);

    for iter in 0..MAX_ITERS {
        let w: Vec<f64> = (0..n)
            .map(|i| 1.0 / (var_t[i] + m * m * var_r[i]).max(VAR_FLOOR))
            .collect();
        let sw: f64 = w.iter().sum();
        let x_bar = (0..n).map(|i| w[i] * resistance[i]).sum::<f64>() / sw;
        let y_bar = (0..n).map(|i| w[i] * temperature[i]).sum::<f64>() / sw;
        centroid = (x_bar, y_bar);

        let mut num = 0.0;
        let mut den = 0.0;
        for i in 0..n {
            let u = resistance[i] - x_bar;
            let v = temperature[i] - y_bar;
            let beta = w[i] * (u * var_t[i] + m * v * var_r[i]);
            num += w[i] * beta * v;
            den += w[i] * beta * u;
        }
        if !(den.is_finite() && den != 0.0) {
            return Err(HeatFlowError::UnderdeterminedFit { distinct: 1 });
        }

        let next = num / den;
        if !next.is_finite() {
            return Err(HeatFlowError::NumericDomain {
                quantity: "odr slope",
                value: next,
                bound: 0.0,
            });
        }
        let converged = (next - m).abs() <= REL_TOL * next.abs().max(1e-300);
        m = next;
        if converged {
            debug!(iterations = iter + 1, "odr converged");
            break;
        }
    }

    Ok(HeatFlowEstimate {
        gradient: m,
        intercept: centroid.1 - m * centroid.0,
    })
}
