//! Formatted terminal output.
//!
//! Formatting lives in one place so the numerical code stays free of
//! presentation concerns.

use crate::climate::EnvelopePoint;
use crate::domain::{ClimateEpoch, SECONDS_PER_KA, SimulationConfig, SimulationResult};
use crate::io::BoreholeData;
use crate::report::bullard_residuals;
use crate::simulation::{DeterministicFit, SimulationInputs};

/// What the loader kept and dropped.
pub fn format_ingest(borehole: &BoreholeData) -> String {
    let mut out = String::new();

    out.push_str("=== heatflow - borehole heat flow ===\n");
    out.push_str(&format!("Borehole: {}\n", borehole.name));
    out.push_str(&format!(
        "Rows: read={} | temperature={} | conductivity={}\n",
        borehole.rows_read,
        borehole.temperature.len(),
        borehole.conductivity.len(),
    ));
    if let Some(max_depth) = borehole.temperature.max_depth() {
        out.push_str(&format!("Deepest temperature: {max_depth:.2} m\n"));
    }
    if borehole.conductivity_trimmed > 0 {
        out.push_str(&format!(
            "Trimmed {} conductivity sample(s) below the temperature log\n",
            borehole.conductivity_trimmed
        ));
    }
    if borehole.duplicates_dropped > 0 {
        out.push_str(&format!("Dropped {} duplicate depth(s)\n", borehole.duplicates_dropped));
    }
    for e in &borehole.row_errors {
        out.push_str(&format!("  (skipped line {}) {}\n", e.line, e.message));
    }

    out
}

/// Depth table, deterministic Bullard lines and Monte Carlo statistics.
pub fn format_summary(
    inputs: &SimulationInputs,
    fit: &DeterministicFit,
    result: &SimulationResult,
    config: &SimulationConfig,
) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Simulation: nsim={} | seed={} | regression={:?} | cp={} J/kg/K | rho={} kg/m3\n\n",
        result.nsim, config.seed, config.regression, config.heat_capacity, config.density
    ));

    out.push_str(&format_depth_table(inputs, fit, result));
    out.push('\n');

    let misfit = rms(&bullard_residuals(&fit.resistance.resistance, &inputs.temperature, &fit.uncorrected));
    out.push_str("Bullard fit (nominal inputs):\n");
    out.push_str(&format!(
        "- uncorrected: q={:.2} mW/m2 | T0={:.3} C | rms misfit={:.4} C\n",
        fit.uncorrected.heat_flow_mw(),
        fit.uncorrected.intercept,
        misfit
    ));
    out.push_str(&format!(
        "- corrected  : q={:.2} mW/m2 | T0={:.3} C\n",
        fit.corrected.heat_flow_mw(),
        fit.corrected.intercept
    ));

    out.push_str("\nMonte Carlo:\n");
    out.push_str(&format!(
        "- uncorrected: q={:.2} +/- {:.2} mW/m2 | T0={:.3} +/- {:.3} C\n",
        result.uncorrected.mean,
        result.uncorrected.std_dev,
        result.uncorrected_intercept.mean,
        result.uncorrected_intercept.std_dev
    ));
    out.push_str(&format!(
        "- corrected  : q={:.2} +/- {:.2} mW/m2 | T0={:.3} +/- {:.3} C\n",
        result.corrected.mean,
        result.corrected.std_dev,
        result.corrected_intercept.mean,
        result.corrected_intercept.std_dev
    ));

    let clips = result.clips;
    if clips.conductivity_floor > 0 || clips.time_floor > 0 || clips.time_ceiling > 0 {
        out.push_str(&format!(
            "- clipped draws: conductivity={} | time floor={} | time ceiling={}\n",
            clips.conductivity_floor, clips.time_floor, clips.time_ceiling
        ));
    }

    out
}

/// Correction envelope of a single epoch.
pub fn format_envelope(epoch: &ClimateEpoch, points: &[EnvelopePoint], nsim: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Epoch {}-{} ka | delta={:+.2} +/- {:.2} C | nsim={nsim}\n",
        fmt_ka(epoch.t_start),
        fmt_ka(epoch.t_end),
        epoch.delta,
        epoch.uncertainty
    ));
    out.push_str(&format!("{:>10} {:>12} {:>12}\n", "depth_m", "mean_C", "std_C"));
    out.push_str(&format!("{:-<10} {:-<12} {:-<12}\n", "", "", ""));
    for p in points {
        out.push_str(&format!(
            "{:>10.1} {:>12.4} {:>12.4}\n",
            p.depth, p.correction.mean, p.correction.std_dev
        ));
    }
    out
}

fn format_depth_table(inputs: &SimulationInputs, fit: &DeterministicFit, result: &SimulationResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>9} {:>9} {:>7} {:>7} {:>10} {:>10} {:>9}\n",
        "depth_m", "T_C", "sT_C", "k", "R", "Tcorr_C", "rms_C"
    ));
    out.push_str(&format!(
        "{:-<9} {:-<9} {:-<7} {:-<7} {:-<10} {:-<10} {:-<9}\n",
        "", "", "", "", "", "", ""
    ));
    for i in 0..inputs.len() {
        out.push_str(&format!(
            "{:>9.2} {:>9.3} {:>7.3} {:>7.3} {:>10.3} {:>10.3} {:>9.4}\n",
            inputs.depths[i],
            inputs.temperature[i],
            inputs.temperature_sigma[i],
            inputs.conductivity[i],
            fit.resistance.resistance.get(i).copied().unwrap_or(f64::NAN),
            result.corrected_temperature_mean.get(i).copied().unwrap_or(f64::NAN),
            result.corrected_temperature_rms.get(i).copied().unwrap_or(f64::NAN),
        ));
    }
    out
}

fn fmt_ka(seconds: f64) -> String {
    if seconds.is_infinite() {
        "inf".to_string()
    } else {
        format!("{:.3}", seconds / SECONDS_PER_KA)
    }
}

fn rms(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    (v.iter().map(|x| x * x).sum::<f64>() / v.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClipCounts, HeatFlowEstimate, Summary, ThermalResistanceProfile};

    fn fixture() -> (SimulationInputs, DeterministicFit, SimulationResult) {
        let inputs = SimulationInputs {
            depths: vec![5.0, 15.0],
            temperature: vec![10.25, 10.75],
            temperature_sigma: vec![0.1; 2],
            conductivity: vec![3.0, 3.2],
            conductivity_sigma: vec![0.1; 2],
            depth_sigma: vec![5.0; 2],
        };
        let fit = DeterministicFit {
            resistance: ThermalResistanceProfile {
                resistance: vec![5.0 / 3.0, 5.0 / 3.0 + 10.0 / 3.2],
                uncertainty: vec![0.1; 2],
            },
            uncorrected: HeatFlowEstimate {
                gradient: 0.16,
                intercept: 10.25 - 0.16 * 5.0 / 3.0,
            },
            corrected: HeatFlowEstimate {
                gradient: 0.158,
                intercept: 12.0,
            },
            corrected_temperature: vec![12.25, 12.74],
        };
        let result = SimulationResult {
            nsim: 10,
            uncorrected: Summary { mean: 160.1, std_dev: 4.0 },
            corrected: Summary { mean: 158.0, std_dev: 4.2 },
            uncorrected_intercept: Summary { mean: 10.0, std_dev: 0.1 },
            corrected_intercept: Summary { mean: 12.0, std_dev: 0.1 },
            corrected_temperature_mean: vec![12.2, 12.7],
            corrected_temperature_rms: vec![0.1, 0.1],
            clips: ClipCounts {
                conductivity_floor: 0,
                time_floor: 10,
                time_ceiling: 0,
            },
        };
        (inputs, fit, result)
    }

    #[test]
    fn summary_lists_both_heat_flows() {
        let (inputs, fit, result) = fixture();
        let text = format_summary(&inputs, &fit, &result, &SimulationConfig::default());
        assert!(text.contains("q=160.00 mW/m2"), "{text}");
        assert!(text.contains("q=158.00 +/- 4.20 mW/m2"), "{text}");
        assert!(text.contains("rms misfit=0.0000"), "{text}");
        assert!(text.contains("time floor=10"), "{text}");
    }

    #[test]
    fn envelope_prints_unbounded_start() {
        let epoch = ClimateEpoch::new(0, f64::INFINITY, 10.0 * SECONDS_PER_KA, -5.0, 1.0).unwrap();
        let points = [EnvelopePoint {
            depth: 100.0,
            correction: Summary { mean: 1.5, std_dev: 0.25 },
        }];
        let text = format_envelope(&epoch, &points, 50);
        assert!(text.starts_with("Epoch inf-10.000 ka"), "{text}");
        assert!(text.contains("1.5000"));
    }
}
