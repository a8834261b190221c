//! Borehole CSV ingest.
//!
//! A borehole file carries two independent column groups side by side:
//!
//! - temperature log: `depth, temperature[, temperature_uncertainty]`
//! - conductivity profile: `conductivity_depth, conductivity[, conductivity_uncertainty]`
//!
//! The groups usually have different lengths, so a row may fill only one of
//! them. Loading never fails on bad rows: they are recorded as [`RowError`]s
//! and skipped. Depths are sorted, duplicates dropped, and conductivity
//! samples deeper than the deepest temperature are trimmed.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::domain::{ConductivitySample, ConductivitySeries, DepthSample, DepthSeries};
use crate::error::AppError;
use crate::io::table::{Column, HeaderMap, RowError, cell, parse_number, read_headers, reader};

const DEPTH: Column = Column::new("depth", &["temperature_depth", "depth_m", "z"]);
const TEMPERATURE: Column = Column::new("temperature", &["temp", "temperature_c", "t"]);
const TEMPERATURE_SIGMA: Column = Column::new(
    "temperature_uncertainty",
    &["temperature_sigma", "temperature_error", "sigma_t", "t_err"],
);
const CONDUCTIVITY_DEPTH: Column = Column::new("conductivity_depth", &["k_depth", "tc_depth"]);
const CONDUCTIVITY: Column = Column::new("conductivity", &["k", "tc"]);
const CONDUCTIVITY_SIGMA: Column = Column::new(
    "conductivity_uncertainty",
    &["conductivity_sigma", "conductivity_error", "sigma_k", "k_err"],
);

/// Depths closer than this (m) are duplicates.
const DUPLICATE_TOL: f64 = 1e-9;

/// A loaded, cleaned borehole.
#[derive(Debug, Clone)]
pub struct BoreholeData {
    pub name: String,
    pub temperature: DepthSeries,
    /// Conductivity profile, already trimmed to the logged depth range.
    pub conductivity: ConductivitySeries,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub duplicates_dropped: usize,
    pub conductivity_trimmed: usize,
}

/// Open and load a borehole file; the name defaults to the file stem.
pub fn load_borehole(path: &Path, name: Option<&str>) -> Result<BoreholeData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open borehole CSV '{}': {e}", path.display())))?;
    let name = name
        .map(str::to_string)
        .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "borehole".to_string());
    read_borehole(file, &name)
}

/// Load a borehole from any CSV source.
pub fn read_borehole<R: Read>(input: R, name: &str) -> Result<BoreholeData, AppError> {
    let mut csv = reader(input);
    let headers = read_headers(name, &mut csv)?;
    let columns = BoreholeColumns::resolve(&headers)?;

    let mut temperature = Vec::new();
    let mut conductivity = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in csv.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_temperature(&record, &columns) {
            Ok(Some(sample)) => temperature.push(sample),
            Ok(None) => {}
            Err(message) => row_errors.push(RowError { line, message }),
        }
        match parse_conductivity(&record, &columns) {
            Ok(Some(sample)) => conductivity.push(sample),
            Ok(None) => {}
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let mut duplicates_dropped = 0;
    let temperature = sorted_unique(temperature, |s| s.depth, &mut duplicates_dropped);
    let conductivity = sorted_unique(conductivity, |s| s.depth, &mut duplicates_dropped);

    let temperature = DepthSeries::new(temperature).map_err(|e| AppError::for_borehole(name, e))?;
    let conductivity = ConductivitySeries::new(conductivity).map_err(|e| AppError::for_borehole(name, e))?;

    let max_depth = temperature.max_depth().ok_or_else(|| {
        AppError::new(3, format!("borehole '{name}' has no usable temperature rows"))
    })?;
    let (conductivity, conductivity_trimmed) = conductivity.trimmed_to(max_depth);

    if !row_errors.is_empty() {
        warn!(borehole = name, count = row_errors.len(), "skipped invalid rows");
        for e in &row_errors {
            debug!(borehole = name, line = e.line, "{}", e.message);
        }
    }
    if conductivity_trimmed > 0 {
        info!(
            borehole = name,
            trimmed = conductivity_trimmed,
            max_depth,
            "dropped conductivity samples below the temperature log"
        );
    }

    Ok(BoreholeData {
        name: name.to_string(),
        temperature,
        conductivity,
        row_errors,
        rows_read,
        duplicates_dropped,
        conductivity_trimmed,
    })
}

struct BoreholeColumns {
    depth: usize,
    temperature: usize,
    temperature_sigma: Option<usize>,
    conductivity_depth: usize,
    conductivity: usize,
    conductivity_sigma: Option<usize>,
}

impl BoreholeColumns {
    fn resolve(headers: &HeaderMap) -> Result<Self, AppError> {
        Ok(Self {
            depth: headers.require(DEPTH)?,
            temperature: headers.require(TEMPERATURE)?,
            temperature_sigma: headers.find(TEMPERATURE_SIGMA),
            conductivity_depth: headers.require(CONDUCTIVITY_DEPTH)?,
            conductivity: headers.require(CONDUCTIVITY)?,
            conductivity_sigma: headers.find(CONDUCTIVITY_SIGMA),
        })
    }
}

/// One column group of a row: `(depth, value, sigma)` or nothing if blank.
fn parse_group(
    record: &StringRecord,
    depth_idx: usize,
    value_idx: usize,
    sigma_idx: Option<usize>,
    value_name: &str,
) -> Result<Option<(f64, f64, f64)>, String> {
    let depth = cell(record, Some(depth_idx));
    let value = cell(record, Some(value_idx));
    let sigma = cell(record, sigma_idx);

    let (depth, value) = match (depth, value) {
        (None, None) if sigma.is_none() => return Ok(None),
        (Some(d), Some(v)) => (d, v),
        _ => return Err(format!("incomplete {value_name} entry (depth and value are both required)")),
    };

    let depth = parse_number(depth, "depth")?;
    let value = parse_number(value, value_name)?;
    let sigma = sigma.map(|s| parse_number(s, "uncertainty")).transpose()?.unwrap_or(0.0);

    if !(depth.is_finite() && depth >= 0.0) {
        return Err(format!("{value_name} depth {depth} is not a non-negative finite number"));
    }
    if !value.is_finite() {
        return Err(format!("{value_name} {value} is not finite"));
    }
    if !(sigma.is_finite() && sigma >= 0.0) {
        return Err(format!("{value_name} uncertainty {sigma} is negative or not finite"));
    }
    Ok(Some((depth, value, sigma)))
}

fn parse_temperature(record: &StringRecord, columns: &BoreholeColumns) -> Result<Option<DepthSample>, String> {
    Ok(parse_group(
        record,
        columns.depth,
        columns.temperature,
        columns.temperature_sigma,
        "temperature",
    )?
    .map(|(depth, temperature, uncertainty)| DepthSample {
        depth,
        temperature,
        uncertainty,
    }))
}

fn parse_conductivity(
    record: &StringRecord,
    columns: &BoreholeColumns,
) -> Result<Option<ConductivitySample>, String> {
    let Some((depth, conductivity, uncertainty)) = parse_group(
        record,
        columns.conductivity_depth,
        columns.conductivity,
        columns.conductivity_sigma,
        "conductivity",
    )?
    else {
        return Ok(None);
    };
    if conductivity <= 0.0 {
        return Err(format!("conductivity {conductivity} must be positive"));
    }
    Ok(Some(ConductivitySample {
        depth,
        conductivity,
        uncertainty,
    }))
}

/// Sort by depth (stable) and keep the first sample at each depth.
fn sorted_unique<T>(mut samples: Vec<T>, depth: impl Fn(&T) -> f64, dropped: &mut usize) -> Vec<T> {
    samples.sort_by(|a, b| depth(a).total_cmp(&depth(b)));
    let before = samples.len();
    samples.dedup_by(|later, kept| (depth(later) - depth(kept)).abs() <= DUPLICATE_TOL);
    *dropped += before - samples.len();
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SCENARIO: &str = "\
depth,temperature,temperature_uncertainty,conductivity_depth,conductivity,conductivity_uncertainty
0,10.0,0.1,5,3.0,0.1
10,10.5,0.1,15,3.2,0.1
20,11.0,0.1,,,
";

    #[test]
    fn reads_both_column_groups() {
        let data = read_borehole(Cursor::new(SCENARIO), "BH1").unwrap();
        assert_eq!(data.name, "BH1");
        assert_eq!(data.rows_read, 3);
        assert_eq!(data.temperature.depths(), vec![0.0, 10.0, 20.0]);
        assert_eq!(data.conductivity.conductivities(), vec![3.0, 3.2]);
        assert!(data.row_errors.is_empty());
        assert_eq!(data.conductivity_trimmed, 0);
    }

    #[test]
    fn trims_conductivity_below_deepest_temperature() {
        let csv = "\
Depth,Temp,K_Depth,K
0,10.0,5,3.0
10,10.5,10,3.1
20,11.0,20,3.2
,,20.5,3.3
,,40,3.4
";
        let data = read_borehole(Cursor::new(csv), "BH2").unwrap();
        // The sample exactly at the deepest temperature is kept.
        assert_eq!(data.conductivity.depths(), vec![5.0, 10.0, 20.0]);
        assert_eq!(data.conductivity_trimmed, 2);
        assert_eq!(data.temperature.uncertainties(), vec![0.0; 3]);
    }

    #[test]
    fn bad_rows_are_skipped_and_recorded() {
        let csv = "\
depth,temperature,conductivity_depth,conductivity
0,10.0,5,3.0
10,abc,15,-1.0
15,,,
20,11.0,18,3.2
";
        let data = read_borehole(Cursor::new(csv), "BH3").unwrap();
        assert_eq!(data.temperature.len(), 2);
        assert_eq!(data.conductivity.len(), 2);
        let lines: Vec<usize> = data.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 3, 4]);
    }

    #[test]
    fn unsorted_and_duplicate_depths_are_normalized() {
        let csv = "\
depth,temperature,conductivity_depth,conductivity
20,11.0,15,3.2
0,10.0,5,3.0
10,10.5,5,2.9
10,10.6,,
";
        let data = read_borehole(Cursor::new(csv), "BH4").unwrap();
        assert_eq!(data.temperature.depths(), vec![0.0, 10.0, 20.0]);
        assert_eq!(data.temperature.temperatures()[1], 10.5);
        assert_eq!(data.conductivity.conductivities(), vec![3.0, 3.2]);
        assert_eq!(data.duplicates_dropped, 2);
    }

    #[test]
    fn missing_required_column_is_a_schema_error() {
        let csv = "depth,temperature\n0,10\n";
        let err = read_borehole(Cursor::new(csv), "BH5").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn empty_temperature_log_is_reported() {
        let csv = "depth,temperature,conductivity_depth,conductivity\n,,5,3.0\n";
        let err = read_borehole(Cursor::new(csv), "BH6").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
