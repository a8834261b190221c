//! Palaeoclimate history CSV.
//!
//! Columns: `end_ka, start_ka, delta_t, delta_t_uncertainty`, times in
//! thousands of years before present. `start_ka` may be `inf` for an epoch
//! reaching back indefinitely. Unparseable rows are skipped and recorded;
//! a parsed epoch whose end is not more recent than its start is an error.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{info, warn};

use crate::domain::{ClimateEpoch, SECONDS_PER_KA};
use crate::error::AppError;
use crate::io::table::{Column, RowError, cell, parse_number, read_headers, reader};

const END_KA: Column = Column::new("end_ka", &["t_end_ka", "end"]);
const START_KA: Column = Column::new("start_ka", &["t_start_ka", "start"]);
const DELTA_T: Column = Column::new("delta_t", &["dt", "tk", "delta"]);
const DELTA_T_SIGMA: Column = Column::new(
    "delta_t_uncertainty",
    &["delta_t_sigma", "dt_uncertainty", "dt_sigma", "sigma"],
);

#[derive(Debug, Clone)]
pub struct PalaeoHistory {
    /// Epochs in file order, times in seconds before present.
    pub epochs: Vec<ClimateEpoch>,
    pub row_errors: Vec<RowError>,
}

pub fn load_palaeo(path: &Path) -> Result<PalaeoHistory, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open palaeoclimate CSV '{}': {e}", path.display())))?;
    read_palaeo(file, &path.display().to_string())
}

pub fn read_palaeo<R: Read>(input: R, source: &str) -> Result<PalaeoHistory, AppError> {
    let mut csv = reader(input);
    let headers = read_headers(source, &mut csv)?;
    let end_idx = headers.require(END_KA)?;
    let start_idx = headers.require(START_KA)?;
    let delta_idx = headers.require(DELTA_T)?;
    let sigma_idx = headers.find(DELTA_T_SIGMA);

    let mut epochs = Vec::new();
    let mut row_errors = Vec::new();

    for (idx, result) in csv.records().enumerate() {
        let line = idx + 2;
        let parsed = result.map_err(|e| format!("CSV parse error: {e}")).and_then(|record| {
            let field = |i: Option<usize>, name: &str| -> Result<f64, String> {
                let raw = cell(&record, i).ok_or_else(|| format!("missing `{name}` value"))?;
                parse_number(raw, name)
            };
            let end = field(Some(end_idx), END_KA.name)?;
            let start = field(Some(start_idx), START_KA.name)?;
            let delta = field(Some(delta_idx), DELTA_T.name)?;
            let sigma = match cell(&record, sigma_idx) {
                Some(raw) => parse_number(raw, DELTA_T_SIGMA.name)?,
                None => 0.0,
            };
            Ok((end, start, delta, sigma))
        });

        match parsed {
            Ok((end_ka, start_ka, delta, sigma)) => {
                let epoch = ClimateEpoch::new(
                    epochs.len(),
                    start_ka * SECONDS_PER_KA,
                    end_ka * SECONDS_PER_KA,
                    delta,
                    sigma,
                )
                .map_err(|e| AppError::new(2, format!("{source} line {line}: {e}")))?;
                epochs.push(epoch);
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if !row_errors.is_empty() {
        warn!(source, count = row_errors.len(), "skipped invalid palaeoclimate rows");
    }
    info!(source, epochs = epochs.len(), "loaded palaeoclimate history");

    Ok(PalaeoHistory { epochs, row_errors })
}
