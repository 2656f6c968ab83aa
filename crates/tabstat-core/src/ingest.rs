//! CSV ingestion into a collection.
//!
//! Every row becomes one flat document keyed by the header names. Cells that
//! parse completely as a finite number are stored as numbers, anything else
//! stays a string. Empty cells and `NaN` literals become `null` so the
//! missing-value scan can find them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::document::Body;
use crate::error::{Error, Result};
use crate::store::DocumentStore;
use crate::util::json::finite_number;

/// CSV parsing options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    /// Field delimiter.
    pub delimiter: char,
    /// Store empty cells as `null` instead of `""`.
    pub empty_as_null: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            empty_as_null: true,
        }
    }
}

impl IngestOptions {
    fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                Error::Csv(format!(
                    "delimiter {:?} must be a single ASCII character",
                    self.delimiter
                ))
            })
    }
}

/// Converts one CSV cell into a JSON value.
#[must_use]
pub fn parse_cell(raw: &str, options: &IngestOptions) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return if options.empty_as_null {
            Value::Null
        } else {
            Value::String(raw.to_string())
        };
    }
    if trimmed.eq_ignore_ascii_case("nan") {
        return Value::Null;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => finite_number(n),
        _ => Value::String(raw.to_string()),
    }
}

/// Parses CSV from any reader. The first row must be the header.
///
/// # Errors
///
/// Returns `Csv` on malformed input (ragged rows, bad quoting, invalid UTF-8).
pub fn parse_reader<R: Read>(reader: R, options: &IngestOptions) -> Result<Vec<Body>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter_byte()?)
        .has_headers(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(Error::Csv("missing header row".to_string()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let body: Body = headers
            .iter()
            .zip(record.iter())
            .map(|(name, cell)| (name.to_string(), parse_cell(cell, options)))
            .collect();
        rows.push(body);
    }
    Ok(rows)
}

/// Parses a CSV file into document bodies.
///
/// # Errors
///
/// Returns `Io` if the file cannot be opened and `Csv` on malformed input.
pub fn parse_rows<P: AsRef<Path>>(path: P, options: &IngestOptions) -> Result<Vec<Body>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let rows = parse_reader(BufReader::with_capacity(128 * 1024, file), options)?;
    tracing::debug!(file = %path.display(), rows = rows.len(), "parsed csv");
    Ok(rows)
}

/// Loads a CSV file into `collection`, one document per row.
///
/// Returns the number of inserted documents.
///
/// # Errors
///
/// Propagates parse and storage errors. Rows inserted before a storage
/// failure stay in the collection.
pub fn load_csv<P: AsRef<Path>>(
    path: P,
    collection: &dyn DocumentStore,
    options: &IngestOptions,
) -> Result<usize> {
    let rows = parse_rows(path, options)?;
    let total = rows.len();
    for body in rows {
        collection.insert(body)?;
    }
    tracing::info!(collection = %collection.name(), records = total, "dataset loaded");
    Ok(total)
}
