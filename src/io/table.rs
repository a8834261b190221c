//! Shared CSV plumbing for the loaders.
//!
//! Headers are matched case-insensitively after trimming (and after dropping
//! a UTF-8 BOM), and every logical column may be known under several aliases.

use std::collections::HashMap;
use std::io::Read;

use csv::{Reader, StringRecord};

use crate::error::AppError;

/// A row that could not be used, with its 1-based line number.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// A logical column and the header names it is accepted under.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

impl Column {
    pub const fn new(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self { name, aliases }
    }
}

/// Header lookup for one CSV source.
#[derive(Debug, Clone)]
pub struct HeaderMap {
    source: String,
    index: HashMap<String, usize>,
}

impl HeaderMap {
    pub fn from_headers(source: &str, headers: &StringRecord) -> Self {
        Self {
            source: source.to_string(),
            index: headers
                .iter()
                .enumerate()
                .map(|(idx, name)| (normalize_header_name(name), idx))
                .collect(),
        }
    }

    /// Position of `column`, trying its canonical name first.
    pub fn find(&self, column: Column) -> Option<usize> {
        std::iter::once(column.name)
            .chain(column.aliases.iter().copied())
            .find_map(|name| self.index.get(name).copied())
    }

    pub fn require(&self, column: Column) -> Result<usize, AppError> {
        self.find(column).ok_or_else(|| {
            AppError::new(
                2,
                format!("{}: missing required column `{}`", self.source, column.name),
            )
        })
    }
}

/// CSV reader with the loaders' shared settings.
pub fn reader<R: Read>(input: R) -> Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(input)
}

pub fn read_headers<R: Read>(source: &str, reader: &mut Reader<R>) -> Result<HeaderMap, AppError> {
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("{source}: failed to read CSV headers: {e}")))?;
    Ok(HeaderMap::from_headers(source, headers))
}

/// Trimmed, non-empty cell at `idx`.
pub fn cell(record: &StringRecord, idx: Option<usize>) -> Option<&str> {
    record.get(idx?).map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a numeric cell, naming the column in the error.
///
/// `inf`/`infinity` parse to infinity; callers decide whether that is allowed.
pub fn parse_number(raw: &str, column: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .map_err(|_| format!("invalid `{column}` value '{raw}'"))
}

fn normalize_header_name(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}
