//! Mean-split partitioning of continuous columns.
//!
//! Each value is compared with the column mean stored by the statistics
//! stage (never a recomputed one): `value <= mean` goes to the lower bucket,
//! `value > mean` to the upper one. Missing and non-numeric values compare
//! false both ways and land in neither bucket.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::aggregate::{to_body, Statistics};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::schema::ColumnSet;
use crate::store::DocumentStore;
use crate::util::float;

/// Which side of the mean a bucket holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Values less than or equal to the mean.
    LessOrEqual,
    /// Values strictly greater than the mean.
    Greater,
}

impl Side {
    /// True if `value` belongs on this side of `mean`.
    #[must_use]
    pub fn admits(self, value: f64, mean: f64) -> bool {
        match self {
            Self::LessOrEqual => value <= mean,
            Self::Greater => value > mean,
        }
    }
}

/// Values of one column on one side of its mean, in scan order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionedColumn {
    /// Mean the values were compared with.
    #[serde(with = "float")]
    pub mean: f64,
    /// Selected values.
    pub values: Vec<f64>,
}

/// One bucket per continuous column.
pub type Partition = IndexMap<String, PartitionedColumn>;

fn stored_mean(stats: &Statistics, column: &str) -> Result<f64> {
    stats.get(column).map(|s| s.mean).ok_or_else(|| {
        Error::PrerequisiteNotFound(format!("no statistics for column '{column}'"))
    })
}

/// Selects the values of each continuous column on `side` of its mean.
///
/// # Errors
///
/// Returns `PrerequisiteNotFound` if `stats` lacks a declared column.
pub fn partition(
    table: &[Document],
    stats: &Statistics,
    columns: &ColumnSet,
    side: Side,
) -> Result<Partition> {
    let mut partition = Partition::new();
    for column in columns.continuous() {
        let mean = stored_mean(stats, column)?;
        let values = table
            .iter()
            .map(|doc| doc.numeric(column))
            .filter(|&v| side.admits(v, mean))
            .collect();
        partition.insert(column.to_string(), PartitionedColumn { mean, values });
    }
    Ok(partition)
}

/// Computes both buckets from the same snapshot: `(lower, upper)`.
///
/// # Errors
///
/// Returns `PrerequisiteNotFound` if `stats` lacks a declared column.
pub fn split(
    table: &[Document],
    stats: &Statistics,
    columns: &ColumnSet,
) -> Result<(Partition, Partition)> {
    Ok((
        partition(table, stats, columns, Side::LessOrEqual)?,
        partition(table, stats, columns, Side::Greater)?,
    ))
}

fn create_side(
    source: &dyn DocumentStore,
    statistics: &dyn DocumentStore,
    target: &dyn DocumentStore,
    columns: &ColumnSet,
    side: Side,
) -> Result<Partition> {
    let stats = crate::aggregate::load_statistics(statistics)?;
    let table = source.scan()?;
    let bucket = partition(&table, &stats, columns, side)?;
    let id = target.insert(to_body(&bucket)?)?;
    tracing::info!(
        source = %source.name(),
        target = %target.name(),
        side = ?side,
        document = %id,
        "partition created"
    );
    Ok(bucket)
}

/// Persists the lower bucket (`value <= mean`) into `target`.
///
/// # Errors
///
/// Returns `PrerequisiteNotFound` when `statistics` holds no document, and
/// propagates storage errors.
pub fn create_less_than_means(
    source: &dyn DocumentStore,
    statistics: &dyn DocumentStore,
    target: &dyn DocumentStore,
    columns: &ColumnSet,
) -> Result<Partition> {
    create_side(source, statistics, target, columns, Side::LessOrEqual)
}

/// Persists the upper bucket (`value > mean`) into `target`.
///
/// # Errors
///
/// Returns `PrerequisiteNotFound` when `statistics` holds no document, and
/// propagates storage errors.
pub fn create_greater_than_means(
    source: &dyn DocumentStore,
    statistics: &dyn DocumentStore,
    target: &dyn DocumentStore,
    columns: &ColumnSet,
) -> Result<Partition> {
    create_side(source, statistics, target, columns, Side::Greater)
}
