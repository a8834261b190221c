//! Reporting utilities: Bullard residuals and formatted terminal output.

use crate::domain::HeatFlowEstimate;

pub mod format;

pub use format::*;

/// Observed minus fitted temperature at each resistance value.
pub fn bullard_residuals(resistance: &[f64], temperature: &[f64], line: &HeatFlowEstimate) -> Vec<f64> {
    resistance
        .iter()
        .zip(temperature.iter())
        .map(|(&r, &t)| t - line.predict(r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residuals_against_line() {
        let line = HeatFlowEstimate {
            gradient: 0.1,
            intercept: 10.0,
        };
        let res = bullard_residuals(&[0.0, 10.0, 20.0], &[10.0, 11.5, 11.5], &line);
        assert!(res[0].abs() < 1e-12);
        assert!((res[1] - 0.5).abs() < 1e-12);
        assert!((res[2] + 0.5).abs() < 1e-12);
    }
}
