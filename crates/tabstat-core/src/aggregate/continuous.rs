//! Mean, population standard deviation and record count per continuous column.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{load_first, to_body};
use crate::document::Document;
use crate::error::Result;
use crate::schema::ColumnSet;
use crate::store::DocumentStore;
use crate::util::float;

/// Summary of one continuous column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    /// Arithmetic mean over every record.
    #[serde(with = "float")]
    pub mean: f64,
    /// Population standard deviation (divides by N).
    #[serde(with = "float")]
    pub std: f64,
    /// Number of records the statistics were computed over.
    ///
    /// Counts every record of the table, sentinel-filled or not.
    pub non_missing_count: usize,
    /// Set to the mean when the column's std exceeds the variance threshold.
    #[serde(
        default,
        with = "float::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub exceeds_threshold: Option<f64>,
}

/// Statistics for every declared continuous column, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Statistics {
    columns: IndexMap<String, ColumnStatistics>,
}

impl Statistics {
    /// Statistics of one column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&ColumnStatistics> {
        self.columns.get(column)
    }

    /// Mutable statistics of one column.
    pub fn get_mut(&mut self, column: &str) -> Option<&mut ColumnStatistics> {
        self.columns.get_mut(column)
    }

    /// Inserts or replaces the statistics of a column.
    pub fn insert(&mut self, column: impl Into<String>, stats: ColumnStatistics) {
        self.columns.insert(column.into(), stats);
    }

    /// Iterates `(column, statistics)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnStatistics)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Mutably iterates `(column, statistics)` pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut ColumnStatistics)> {
        self.columns.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when no column is summarized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Computes statistics for every continuous column of `table`.
///
/// `mean = sum / N` and `std = sqrt(sum((v - mean)^2) / N)` where N is the
/// number of records. A missing or non-numeric value contributes NaN, which
/// propagates into that column's mean and std.
#[must_use]
pub fn compute_statistics(table: &[Document], columns: &ColumnSet) -> Statistics {
    let n = table.len();
    let mut statistics = Statistics::default();

    for column in columns.continuous() {
        let sum: f64 = table.iter().map(|doc| doc.numeric(column)).sum();
        let mean = sum / n as f64;
        let squares: f64 = table
            .iter()
            .map(|doc| (doc.numeric(column) - mean).powi(2))
            .sum();
        let std = (squares / n as f64).sqrt();

        if mean.is_nan() {
            tracing::warn!(column = %column, records = n, "statistics are NaN");
        }

        statistics.insert(
            column,
            ColumnStatistics {
                mean,
                std,
                non_missing_count: n,
                exceeds_threshold: None,
            },
        );
    }

    statistics
}

/// Aggregates `source` and inserts one statistics document into `target`.
///
/// Re-running appends another document; readers use the first one.
///
/// # Errors
///
/// Propagates storage and serialization errors.
pub fn create_statistics(
    source: &dyn DocumentStore,
    target: &dyn DocumentStore,
    columns: &ColumnSet,
) -> Result<Statistics> {
    let table = source.scan()?;
    let statistics = compute_statistics(&table, columns);
    let id = target.insert(to_body(&statistics)?)?;
    tracing::info!(
        source = %source.name(),
        target = %target.name(),
        records = table.len(),
        columns = statistics.len(),
        document = %id,
        "statistics created"
    );
    Ok(statistics)
}

/// Reads the first statistics document of `collection`.
///
/// # Errors
///
/// Returns `PrerequisiteNotFound` if the collection holds no document.
pub fn load_statistics(collection: &dyn DocumentStore) -> Result<Statistics> {
    load_first(collection, "statistics")
}
