//! Cubic smoothing spline (Reinsch formulation).
//!
//! For knots `x_1 < … < x_n`, values `y_i` and weights `w_i` the spline `g`
//! minimizes
//!
//! ```text
//! Σ w_i (y_i - g(x_i))^2 + λ ∫ g''(x)^2 dx
//! ```
//!
//! with natural end conditions (`g'' = 0` at both ends). Following Green &
//! Silverman, the second derivatives `γ` at the interior knots solve
//!
//! ```text
//! (R + λ Qᵀ W⁻¹ Q) γ = Qᵀ y,        g = y - λ W⁻¹ Q γ
//! ```
//!
//! where `Q` is n × (n-2) tridiagonal and `R` is (n-2) × (n-2) tridiagonal, so
//! the system is a symmetric positive-definite band of half-width 2 and is
//! solved by banded Cholesky in O(n). `λ = 0` gives the interpolating natural
//! cubic spline. Outside the knot range the spline continues linearly.

/// A fitted smoothing spline, ready for evaluation.
#[derive(Debug, Clone)]
pub struct SmoothingSpline {
    x: Vec<f64>,
    /// Fitted values at the knots.
    g: Vec<f64>,
    /// Second derivatives at the knots (zero at both ends).
    gamma: Vec<f64>,
}

impl SmoothingSpline {
    /// Fit a spline through `(x, y)` with uniform weights.
    ///
    /// Returns `None` when fewer than 3 knots are given, lengths differ,
    /// `x` is not strictly increasing, or `lambda` is negative/non-finite.
    pub fn fit(x: &[f64], y: &[f64], lambda: f64) -> Option<Self> {
        let w = vec![1.0; x.len()];
        Self::fit_weighted(x, y, &w, lambda)
    }

    pub fn fit_weighted(x: &[f64], y: &[f64], w: &[f64], lambda: f64) -> Option<Self> {
        let n = x.len();
        if n < 3 || y.len() != n || w.len() != n {
            return None;
        }
        if !(lambda.is_finite() && lambda >= 0.0) {
            return None;
        }
        if w.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return None;
        }
        if y.iter().chain(x.iter()).any(|v| !v.is_finite()) {
            return None;
        }
        let h: Vec<f64> = x.windows(2).map(|p| p[1] - p[0]).collect();
        if h.iter().any(|&d| d <= 0.0) {
            return None;
        }

        let m = n - 2;
        let winv: Vec<f64> = w.iter().map(|v| 1.0 / v).collect();

        // Column c of Q touches knots c, c+1, c+2.
        let q = |c: usize| -> [f64; 3] {
            [1.0 / h[c], -1.0 / h[c] - 1.0 / h[c + 1], 1.0 / h[c + 1]]
        };

        // Band storage: a0[c] = A[c][c], a1[c] = A[c][c-1], a2[c] = A[c][c-2].
        let mut a0 = vec![0.0; m];
        let mut a1 = vec![0.0; m];
        let mut a2 = vec![0.0; m];
        let mut rhs = vec![0.0; m];

        for c in 0..m {
            let qc = q(c);
            a0[c] = (h[c] + h[c + 1]) / 3.0;
            if c >= 1 {
                a1[c] = h[c] / 6.0;
            }

            rhs[c] = qc[0] * y[c] + qc[1] * y[c + 1] + qc[2] * y[c + 2];

            if lambda > 0.0 {
                // (QᵀW⁻¹Q)[c][c - d] for d = 0, 1, 2.
                for d in 0..=2usize {
                    if d > c {
                        break;
                    }
                    let cp = c - d;
                    let qp = q(cp);
                    let mut s = 0.0;
                    // Knots shared by columns c and cp: c .. cp + 2.
                    for i in c..=(cp + 2) {
                        s += qc[i - c] * qp[i - cp] * winv[i];
                    }
                    match d {
                        0 => a0[c] += lambda * s,
                        1 => a1[c] += lambda * s,
                        _ => a2[c] += lambda * s,
                    }
                }
            }
        }

        let interior = band_cholesky_solve(&a0, &a1, &a2, &rhs)?;

        let mut gamma = vec![0.0; n];
        gamma[1..(m + 1)].copy_from_slice(&interior);

        let mut g = y.to_vec();
        if lambda > 0.0 {
            for (i, gi) in g.iter_mut().enumerate() {
                // Row i of Q has entries in columns i-2, i-1, i.
                let qg: f64 = (i.saturating_sub(2)..=i.min(m - 1))
                    .map(|c| q(c)[i - c] * interior[c])
                    .sum();
                *gi -= lambda * winv[i] * qg;
            }
        }

        Some(Self {
            x: x.to_vec(),
            g,
            gamma,
        })
    }

    /// Fitted value at the knots.
    pub fn fitted(&self) -> &[f64] {
        &self.g
    }

    /// Evaluate the spline at `t`.
    pub fn eval(&self, t: f64) -> f64 {
        let n = self.x.len();
        let x = &self.x;
        let g = &self.g;
        let gm = &self.gamma;

        if t <= x[0] {
            let h = x[1] - x[0];
            let slope = (g[1] - g[0]) / h - h * gm[1] / 6.0;
            return g[0] + slope * (t - x[0]);
        }
        if t >= x[n - 1] {
            let h = x[n - 1] - x[n - 2];
            let slope = (g[n - 1] - g[n - 2]) / h + h * gm[n - 2] / 6.0;
            return g[n - 1] + slope * (t - x[n - 1]);
        }

        // Interval i with x[i] <= t < x[i+1].
        let i = x.partition_point(|&v| v <= t) - 1;
        let h = x[i + 1] - x[i];
        let a = t - x[i];
        let b = x[i + 1] - t;
        (a * g[i + 1] + b * g[i]) / h
            - a * b / 6.0 * ((1.0 + a / h) * gm[i + 1] + (1.0 + b / h) * gm[i])
    }
}

/// Solve `A x = b` for a symmetric positive-definite band of half-width 2.
///
/// `a0` holds the diagonal, `a1[i] = A[i][i-1]`, `a2[i] = A[i][i-2]`.
fn band_cholesky_solve(a0: &[f64], a1: &[f64], a2: &[f64], b: &[f64]) -> Option<Vec<f64>> {
    let m = a0.len();
    let mut l0 = vec![0.0; m];
    let mut l1 = vec![0.0; m];
    let mut l2 = vec![0.0; m];

    for i in 0..m {
        if i >= 2 {
            l2[i] = a2[i] / l0[i - 2];
        }
        if i >= 1 {
            let prev_l1 = if i >= 2 { l1[i - 1] } else { 0.0 };
            l1[i] = (a1[i] - l2[i] * prev_l1) / l0[i - 1];
        }
        let d = a0[i] - l1[i] * l1[i] - l2[i] * l2[i];
        if !(d.is_finite() && d > 0.0) {
            return None;
        }
        l0[i] = d.sqrt();
    }

    let mut u = vec![0.0; m];
    for i in 0..m {
        let mut s = b[i];
        if i >= 1 {
            s -= l1[i] * u[i - 1];
        }
        if i >= 2 {
            s -= l2[i] * u[i - 2];
        }
        u[i] = s / l0[i];
    }

    let mut out = vec![0.0; m];
    for i in (0..m).rev() {
        let mut s = u[i];
        if i + 1 < m {
            s -= l1[i + 1] * out[i + 1];
        }
        if i + 2 < m {
            s -= l2[i + 2] * out[i + 2];
        }
        out[i] = s / l0[i];
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolating_spline_passes_through_knots() {
        let x = [0.0, 3.0, 4.5, 10.0, 12.0];
        let y = [1.0, 2.5, 2.0, 6.0, 5.5];
        let s = SmoothingSpline::fit(&x, &y, 0.0).unwrap();
        for (xi, yi) in x.iter().zip(y.iter()) {
            assert!((s.eval(*xi) - yi).abs() < 1e-12, "at {xi}");
        }
    }

    #[test]
    fn linear_data_is_reproduced_for_any_smoothing() {
        let x = [0.0, 7.0, 9.0, 20.0, 31.0, 40.0];
        let y: Vec<f64> = x.iter().map(|v| 10.0 + 0.03 * v).collect();
        for &lambda in &[0.0, 1.0, 1e4] {
            let s = SmoothingSpline::fit(&x, &y, lambda).unwrap();
            for &t in &[-5.0, 0.0, 8.0, 25.0, 40.0, 45.0] {
                let expect = 10.0 + 0.03 * t;
                assert!((s.eval(t) - expect).abs() < 1e-9, "λ={lambda} t={t}");
            }
        }
    }

    #[test]
    fn heavy_smoothing_approaches_least_squares_line() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [0.0, 1.2, 1.8, 3.3, 3.9, 5.1];
        let s = SmoothingSpline::fit(&x, &y, 1e9).unwrap();
        // A huge λ suppresses curvature, leaving the least-squares line.
        let (slope, intercept) =
            crate::math::fit_line(&x, &y, &[1.0; 6]).unwrap();
        for &t in &x {
            assert!((s.eval(t) - (slope * t + intercept)).abs() < 1e-4, "t={t}");
        }
    }

    #[test]
    fn rejects_degenerate_inputs() {
        assert!(SmoothingSpline::fit(&[0.0, 1.0], &[0.0, 1.0], 0.0).is_none());
        assert!(SmoothingSpline::fit(&[0.0, 1.0, 1.0], &[0.0, 1.0, 2.0], 0.0).is_none());
        assert!(SmoothingSpline::fit(&[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0], -1.0).is_none());
    }
}
