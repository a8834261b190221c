//! Weighted least squares for straight lines.
//!
//! Every regression in this crate has the form
//!
//! ```text
//! minimize Σ w_i (y_i - (a x_i + b))^2
//! ```
//!
//! We scale rows by `sqrt(w_i)` and solve the resulting ordinary problem with
//! SVD. Nalgebra's `QR::solve` only handles square systems, while the design
//! matrix here is tall (n × 2).

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Start strict and relax; resistance columns can span several orders of
    // magnitude relative to the intercept column.
    for &tol in &[1e-14, 1e-12, 1e-10] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `y = slope * x + intercept` with per-point weights.
///
/// Returns `(slope, intercept)`, or `None` when the inputs are empty, of
/// unequal length, carry a non-positive weight, or the solve fails.
pub fn fit_line(x: &[f64], y: &[f64], w: &[f64]) -> Option<(f64, f64)> {
    let n = x.len();
    if n == 0 || y.len() != n || w.len() != n {
        return None;
    }
    if w.iter().any(|v| !v.is_finite() || *v <= 0.0) {
        return None;
    }

    let mut xw = DMatrix::<f64>::zeros(n, 2);
    let mut yw = DVector::<f64>::zeros(n);
    for i in 0..n {
        let sw = w[i].sqrt();
        xw[(i, 0)] = x[i] * sw;
        xw[(i, 1)] = sw;
        yw[i] = y[i] * sw;
    }

    let beta = solve_least_squares(&xw, &yw)?;
    Some((beta[0], beta[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn weighted_line_ignores_downweighted_outlier() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 5.0, 100.0];
        let w = [1.0, 1.0, 1.0, 1e-12];
        let (slope, intercept) = fit_line(&x, &y, &w).unwrap();
        assert!((slope - 2.0).abs() < 1e-6, "slope {slope}");
        assert!((intercept - 1.0).abs() < 1e-6, "intercept {intercept}");
    }

    #[test]
    fn fit_line_rejects_bad_weights() {
        assert!(fit_line(&[0.0, 1.0], &[0.0, 1.0], &[1.0, 0.0]).is_none());
        assert!(fit_line(&[0.0, 1.0], &[0.0], &[1.0, 1.0]).is_none());
    }
}
