//! Temperature at the conductivity sample depths.
//!
//! Temperature logs and conductivity samples are taken at different depths.
//! Before building the Bullard plot we need temperature (and its uncertainty)
//! at every conductivity depth:
//!
//! - more than 3 measurements: cubic smoothing spline through the log
//! - 2 or 3 measurements: no spline; targets must coincide with a measurement
//!   or lie between two of them (piecewise-linear)
//! - fewer than 2: nothing to interpolate

use tracing::debug;

use crate::domain::DepthSeries;
use crate::error::HeatFlowError;
use crate::math::SmoothingSpline;

/// Largest series treated as too short for a spline.
const MAX_DEGENERATE_LEN: usize = 3;

/// Depths closer than this (m) are treated as the same depth.
const DEPTH_TOL: f64 = 1e-9;

/// Temperature interpolated onto the conductivity depths.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedProfile {
    pub depths: Vec<f64>,
    pub temperature: Vec<f64>,
    pub uncertainty: Vec<f64>,
}

/// Interpolate `series` onto `targets`.
///
/// `smoothing` is the spline weight λ (0 interpolates the log exactly).
/// Targets deeper than the deepest measurement are rejected; loaders trim
/// conductivity samples to the logged range beforehand.
pub fn interpolate_to_depths(
    series: &DepthSeries,
    targets: &[f64],
    smoothing: f64,
) -> Result<InterpolatedProfile, HeatFlowError> {
    let n = series.len();
    if n < 2 {
        return Err(HeatFlowError::InsufficientData {
            needed: 2,
            available: n,
        });
    }

    let depths = series.depths();
    let max_depth = depths[n - 1];
    if let Some(&deep) = targets.iter().find(|&&t| t > max_depth + DEPTH_TOL) {
        return Err(HeatFlowError::MismatchedDepths {
            depth: deep,
            reason: format!("deeper than the deepest temperature measurement ({max_depth} m)"),
        });
    }

    if n <= MAX_DEGENERATE_LEN {
        return degenerate(series, targets);
    }

    let temperature = series.temperatures();
    let sigma = series.uncertainties();

    let t_spline = SmoothingSpline::fit(&depths, &temperature, smoothing).ok_or(
        HeatFlowError::NumericDomain {
            quantity: "spline smoothing",
            value: smoothing,
            bound: 0.0,
        },
    )?;
    let s_spline = SmoothingSpline::fit(&depths, &sigma, smoothing).ok_or(
        HeatFlowError::NumericDomain {
            quantity: "spline smoothing",
            value: smoothing,
            bound: 0.0,
        },
    )?;

    Ok(InterpolatedProfile {
        depths: targets.to_vec(),
        temperature: targets.iter().map(|&z| t_spline.eval(z)).collect(),
        uncertainty: targets.iter().map(|&z| s_spline.eval(z).max(0.0)).collect(),
    })
}

fn degenerate(series: &DepthSeries, targets: &[f64]) -> Result<InterpolatedProfile, HeatFlowError> {
    let samples = series.samples();
    let mut temperature = Vec::with_capacity(targets.len());
    let mut uncertainty = Vec::with_capacity(targets.len());

    for &z in targets {
        if let Some(s) = samples.iter().find(|s| (s.depth - z).abs() <= DEPTH_TOL) {
            temperature.push(s.temperature);
            uncertainty.push(s.uncertainty);
            continue;
        }

        let Some(upper) = samples.iter().position(|s| s.depth > z).filter(|&i| i > 0) else {
            return Err(HeatFlowError::MismatchedDepths {
                depth: z,
                reason: format!(
                    "outside the measured range [{}, {}] m and too few points for a spline",
                    samples[0].depth,
                    samples[samples.len() - 1].depth
                ),
            });
        };
        let (a, b) = (samples[upper - 1], samples[upper]);
        let u = (z - a.depth) / (b.depth - a.depth);
        debug!(depth = z, "linear temperature interpolation ({} measurements)", samples.len());
        temperature.push(a.temperature + u * (b.temperature - a.temperature));
        uncertainty.push(a.uncertainty + u * (b.uncertainty - a.uncertainty));
    }

    Ok(InterpolatedProfile {
        depths: targets.to_vec(),
        temperature,
        uncertainty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DepthSample;

    fn series(points: &[(f64, f64, f64)]) -> DepthSeries {
        DepthSeries::new(
            points
                .iter()
                .map(|&(depth, temperature, uncertainty)| DepthSample {
                    depth,
                    temperature,
                    uncertainty,
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn single_point_is_insufficient() {
        let s = series(&[(0.0, 10.0, 0.1)]);
        let err = interpolate_to_depths(&s, &[0.0], 0.0).unwrap_err();
        assert_eq!(
            err,
            HeatFlowError::InsufficientData {
                needed: 2,
                available: 1
            }
        );
    }

    #[test]
    fn short_series_returns_measurements_at_matching_depths() {
        let s = series(&[(0.0, 10.0, 0.1), (10.0, 10.5, 0.2), (20.0, 11.0, 0.3)]);
        let out = interpolate_to_depths(&s, &[10.0, 20.0], 0.0).unwrap();
        assert_eq!(out.temperature, vec![10.5, 11.0]);
        assert_eq!(out.uncertainty, vec![0.2, 0.3]);
    }

    #[test]
    fn short_series_interpolates_between_measurements() {
        let s = series(&[(0.0, 10.0, 0.1), (10.0, 10.5, 0.1), (20.0, 11.0, 0.1)]);
        let out = interpolate_to_depths(&s, &[5.0, 15.0], 0.0).unwrap();
        assert!((out.temperature[0] - 10.25).abs() < 1e-12);
        assert!((out.temperature[1] - 10.75).abs() < 1e-12);
        assert!((out.uncertainty[0] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn short_series_rejects_targets_outside_range() {
        let s = series(&[(5.0, 10.0, 0.1), (10.0, 10.5, 0.1)]);
        let err = interpolate_to_depths(&s, &[2.0], 0.0).unwrap_err();
        assert_eq!(err.kind(), "MismatchedDepthsError");
    }

    #[test]
    fn targets_below_log_are_rejected() {
        let s = series(&[(0.0, 10.0, 0.1), (10.0, 10.5, 0.1), (20.0, 11.0, 0.1), (30.0, 11.5, 0.1)]);
        let err = interpolate_to_depths(&s, &[31.0], 0.0).unwrap_err();
        assert_eq!(err.kind(), "MismatchedDepthsError");
    }

    #[test]
    fn spline_recovers_linear_geotherm() {
        let pts: Vec<(f64, f64, f64)> = [0.0, 12.0, 25.0, 31.0, 47.0, 60.0]
            .iter()
            .map(|&z| (z, 8.0 + 0.025 * z, 0.05))
            .collect();
        let s = series(&pts);
        let targets = [3.0, 18.5, 40.0, 60.0];
        let out = interpolate_to_depths(&s, &targets, 0.5).unwrap();
        for (z, t) in targets.iter().zip(out.temperature.iter()) {
            assert!((t - (8.0 + 0.025 * z)).abs() < 1e-9, "z={z}");
        }
        for u in &out.uncertainty {
            assert!((u - 0.05).abs() < 1e-9);
        }
    }
}
