//! Instrumental temperature record → climate epochs.
//!
//! Annual anomalies are grouped into fixed-width blocks aligned to multiples
//! of the block width (decades by default). Each block becomes one epoch:
//!
//! - `t_start = present - block_start` years, `t_end = max(present - block_end, 0)`
//! - `Tk` = block mean minus the most recent block's mean, so the latest block
//!   is the "present" reference and contributes nothing
//! - σ = sqrt(population variance within the block + mean(annual σ²))
//!
//! `present` defaults to the year after the last record.

use std::collections::BTreeMap;

use crate::domain::{ClimateEpoch, SECONDS_PER_YEAR};
use crate::error::HeatFlowError;

/// One year of the instrumental record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnualAnomaly {
    pub year: i32,
    /// Temperature anomaly (°C) against the record's own baseline.
    pub anomaly: f64,
    pub uncertainty: Option<f64>,
}

/// Aggregate an annual record into block epochs, oldest first.
pub fn aggregate_instrumental(
    record: &[AnnualAnomaly],
    block_years: u32,
    present_year: Option<i32>,
) -> Result<Vec<ClimateEpoch>, HeatFlowError> {
    if record.is_empty() {
        return Err(HeatFlowError::InsufficientData {
            needed: 1,
            available: 0,
        });
    }
    let width = i32::try_from(block_years.max(1)).unwrap_or(i32::MAX);

    let last_year = record.iter().map(|r| r.year).max().unwrap_or_default();
    let present = present_year.unwrap_or(last_year + 1);

    let mut blocks: BTreeMap<i32, Vec<&AnnualAnomaly>> = BTreeMap::new();
    for r in record.iter().filter(|r| r.year < present && r.anomaly.is_finite()) {
        blocks.entry(r.year.div_euclid(width) * width).or_default().push(r);
    }
    if blocks.is_empty() {
        return Err(HeatFlowError::InsufficientData {
            needed: 1,
            available: 0,
        });
    }

    let stats: Vec<(i32, f64, f64)> = blocks
        .iter()
        .map(|(&start, years)| {
            let n = years.len() as f64;
            let mean = years.iter().map(|r| r.anomaly).sum::<f64>() / n;
            let var = years.iter().map(|r| (r.anomaly - mean).powi(2)).sum::<f64>() / n;
            let meas = years
                .iter()
                .map(|r| r.uncertainty.unwrap_or(0.0).powi(2))
                .sum::<f64>()
                / n;
            (start, mean, (var + meas).sqrt())
        })
        .collect();

    let reference = stats.last().map(|s| s.1).unwrap_or(0.0);

    stats
        .iter()
        .enumerate()
        .map(|(index, &(start, mean, sigma))| {
            let t_start = f64::from(present - start) * SECONDS_PER_YEAR;
            let t_end = f64::from((present - (start + width)).max(0)) * SECONDS_PER_YEAR;
            ClimateEpoch::new(index, t_start, t_end, mean - reference, sigma)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year(year: i32, anomaly: f64) -> AnnualAnomaly {
        AnnualAnomaly {
            year,
            anomaly,
            uncertainty: None,
        }
    }

    #[test]
    fn decades_become_epochs_relative_to_latest_block() {
        let mut record = Vec::new();
        for y in 1990..2000 {
            record.push(year(y, 0.2));
        }
        for y in 2000..2010 {
            record.push(year(y, 0.5));
        }
        for y in 2010..2015 {
            record.push(year(y, 0.9));
        }

        let epochs = aggregate_instrumental(&record, 10, None).unwrap();
        assert_eq!(epochs.len(), 3);

        // Present is 2015.
        assert!((epochs[0].t_start - 25.0 * SECONDS_PER_YEAR).abs() < 1e-3);
        assert!((epochs[0].t_end - 15.0 * SECONDS_PER_YEAR).abs() < 1e-3);
        assert!((epochs[0].delta - (0.2 - 0.9)).abs() < 1e-12);
        assert!((epochs[1].delta - (0.5 - 0.9)).abs() < 1e-12);
        assert_eq!(epochs[2].delta, 0.0);
        assert_eq!(epochs[2].t_end, 0.0);
        assert!(epochs[0].uncertainty < 1e-12);
    }

    #[test]
    fn block_sigma_combines_spread_and_measurement_error() {
        let record = vec![
            AnnualAnomaly { year: 1950, anomaly: 0.0, uncertainty: Some(0.3) },
            AnnualAnomaly { year: 1951, anomaly: 0.8, uncertainty: Some(0.3) },
            AnnualAnomaly { year: 1960, anomaly: 0.4, uncertainty: None },
        ];
        let epochs = aggregate_instrumental(&record, 10, Some(1970)).unwrap();
        let expect = (0.16_f64 + 0.09).sqrt();
        assert!((epochs[0].uncertainty - expect).abs() < 1e-12);
        assert!((epochs[1].t_end - 0.0).abs() < 1e-12);
    }

    #[test]
    fn empty_record_is_insufficient() {
        let err = aggregate_instrumental(&[], 10, None).unwrap_err();
        assert_eq!(err.kind(), "InsufficientDataError");
    }
}
