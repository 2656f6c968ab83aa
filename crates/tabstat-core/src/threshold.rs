//! High-variance column flagging.
//!
//! A continuous column is flagged when its standard deviation is non-zero and
//! exceeds `ratio * mean`. The flag records the mean under
//! `exceeds_threshold` inside the column's embedded statistics block.

use serde_json::Value;

use crate::aggregate::Statistics;
use crate::document::Body;
use crate::embed::STATISTICS_KEY;
use crate::error::{Error, Result};
use crate::schema::ColumnSet;
use crate::store::DocumentStore;
use crate::util::json::get_f64;

/// Default flagging ratio: std above 10% of the mean.
pub const DEFAULT_RATIO: f64 = 0.10;

/// True if a column with this mean and std should be flagged.
///
/// Zero std is never flagged; NaN inputs compare false.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn exceeds(mean: f64, std: f64, ratio: f64) -> bool {
    std != 0.0 && std > ratio * mean
}

/// Flags every column of `stats` whose std exceeds `ratio * mean`.
///
/// Flags already present are left as they are. Returns the names of the
/// columns flagged by this call.
pub fn apply_threshold(stats: &mut Statistics, ratio: f64) -> Vec<String> {
    let mut flagged = Vec::new();
    for (column, entry) in stats.iter_mut() {
        if exceeds(entry.mean, entry.std, ratio) {
            entry.exceeds_threshold = Some(entry.mean);
            flagged.push(column.to_string());
        }
    }
    flagged
}

/// Flags high-variance columns on the enriched statistics collection.
///
/// Reads the statistics block of the first document, flags it, and writes
/// the resulting block back onto every document of the collection. Returns
/// the flagged column names.
///
/// # Errors
///
/// Returns `PrerequisiteNotFound` if the collection is empty, its first
/// document has no statistics block, or a declared continuous column is
/// absent from the block. Storage errors are propagated; documents already
/// rewritten stay rewritten.
pub fn flag_high_variance(
    enriched: &dyn DocumentStore,
    columns: &ColumnSet,
    ratio: f64,
) -> Result<Vec<String>> {
    let docs = enriched.scan()?;
    let first = docs.first().ok_or_else(|| {
        Error::PrerequisiteNotFound(format!(
            "no enriched documents in collection '{}'",
            enriched.name()
        ))
    })?;
    let block = first.body.get(STATISTICS_KEY).cloned().ok_or_else(|| {
        Error::PrerequisiteNotFound(format!(
            "document {} in '{}' has no {STATISTICS_KEY} block",
            first.id,
            enriched.name()
        ))
    })?;
    let mut stats: Statistics = serde_json::from_value(block)?;

    if let Some(column) = columns.continuous().find(|c| stats.get(c).is_none()) {
        return Err(Error::PrerequisiteNotFound(format!(
            "no embedded statistics for column '{column}'"
        )));
    }

    let flagged = apply_threshold(&mut stats, ratio);

    let mut patch = Body::new();
    patch.insert(STATISTICS_KEY.to_string(), serde_json::to_value(&stats)?);
    for doc in &docs {
        enriched.upsert_by_key(doc.id, patch.clone())?;
    }

    tracing::info!(
        collection = %enriched.name(),
        ratio,
        flagged = ?flagged,
        documents = docs.len(),
        "variance threshold applied"
    );
    Ok(flagged)
}

/// Reads back the flags of an enriched document: `column -> mean`.
#[must_use]
pub fn flags_of(body: &Body) -> Vec<(String, f64)> {
    body.get(STATISTICS_KEY)
        .and_then(Value::as_object)
        .map(|block| {
            block
                .iter()
                .filter_map(|(column, entry)| {
                    get_f64(entry, "exceeds_threshold").map(|mean| (column.clone(), mean))
                })
                .collect()
        })
        .unwrap_or_default()
}
