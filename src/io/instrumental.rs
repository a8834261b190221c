//! Instrumental record CSV: `year, anomaly[, uncertainty]`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{info, warn};

use crate::climate::AnnualAnomaly;
use crate::error::AppError;
use crate::io::table::{Column, RowError, cell, parse_number, read_headers, reader};

const YEAR: Column = Column::new("year", &["yr"]);
const ANOMALY: Column = Column::new("anomaly", &["temperature_anomaly", "delta_t", "dt"]);
const UNCERTAINTY: Column = Column::new("uncertainty", &["anomaly_uncertainty", "sigma"]);

#[derive(Debug, Clone)]
pub struct InstrumentalRecord {
    /// Annual anomalies sorted by year.
    pub years: Vec<AnnualAnomaly>,
    pub row_errors: Vec<RowError>,
}

pub fn load_instrumental(path: &Path) -> Result<InstrumentalRecord, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open instrumental CSV '{}': {e}", path.display())))?;
    read_instrumental(file, &path.display().to_string())
}

pub fn read_instrumental<R: Read>(input: R, source: &str) -> Result<InstrumentalRecord, AppError> {
    let mut csv = reader(input);
    let headers = read_headers(source, &mut csv)?;
    let year_idx = headers.require(YEAR)?;
    let anomaly_idx = headers.require(ANOMALY)?;
    let sigma_idx = headers.find(UNCERTAINTY);

    let mut years = Vec::new();
    let mut row_errors = Vec::new();

    for (idx, result) in csv.records().enumerate() {
        let line = idx + 2;
        let parsed = result.map_err(|e| format!("CSV parse error: {e}")).and_then(|record| {
            let year = cell(&record, Some(year_idx))
                .ok_or_else(|| "missing `year` value".to_string())?;
            let year = year
                .parse::<i32>()
                .map_err(|_| format!("invalid `year` value '{year}'"))?;
            let anomaly = cell(&record, Some(anomaly_idx))
                .ok_or_else(|| "missing `anomaly` value".to_string())
                .and_then(|raw| parse_number(raw, ANOMALY.name))?;
            if !anomaly.is_finite() {
                return Err(format!("anomaly {anomaly} is not finite"));
            }
            let uncertainty = cell(&record, sigma_idx)
                .map(|raw| parse_number(raw, UNCERTAINTY.name))
                .transpose()?;
            if uncertainty.is_some_and(|u| !(u.is_finite() && u >= 0.0)) {
                return Err("uncertainty must be a non-negative finite number".to_string());
            }
            Ok(AnnualAnomaly {
                year,
                anomaly,
                uncertainty,
            })
        });
        match parsed {
            Ok(a) => years.push(a),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    years.sort_by_key(|a| a.year);

    if !row_errors.is_empty() {
        warn!(source, count = row_errors.len(), "skipped invalid instrumental rows");
    }
    info!(source, years = years.len(), "loaded instrumental record");

    Ok(InstrumentalRecord { years, row_errors })
}
