//! Missing-value normalization.
//!
//! Finds records with an absent or null declared field and fills the gap with
//! a sentinel: `-1` for continuous columns, `"empty"` for categorical ones.
//! Scanning and fixing are separate passes over the collection. After
//! normalization a sentinel is indistinguishable from a real value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{Body, Document};
use crate::error::Result;
use crate::filter::{Condition, Filter};
use crate::schema::{ColumnKind, ColumnSet};
use crate::store::DocumentStore;

/// Value written into missing continuous fields.
pub const CONTINUOUS_SENTINEL: i64 = -1;

/// Value written into missing categorical fields.
pub const CATEGORICAL_SENTINEL: &str = "empty";

/// What a normalization run found and changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOutcome {
    /// Documents with at least one missing declared field.
    pub missing_documents: usize,
    /// Documents rewritten with sentinels.
    pub patched: usize,
}

/// Filter matching documents where any declared column is missing.
#[must_use]
pub fn missing_filter(columns: &ColumnSet) -> Filter {
    Filter::new(Condition::or(
        columns
            .specs()
            .iter()
            .map(|spec| Condition::is_missing(spec.name.as_str()))
            .collect(),
    ))
}

/// Returns every document with at least one missing declared field.
///
/// # Errors
///
/// Propagates storage errors.
pub fn find_missing(collection: &dyn DocumentStore, columns: &ColumnSet) -> Result<Vec<Document>> {
    collection.scan_matching(&missing_filter(columns))
}

/// Builds the sentinel patch for one document; empty when nothing is missing.
#[must_use]
pub fn sentinel_patch(doc: &Document, columns: &ColumnSet) -> Body {
    columns
        .specs()
        .iter()
        .filter(|spec| doc.is_missing(&spec.name))
        .map(|spec| {
            let value = match spec.kind {
                ColumnKind::Continuous => Value::from(CONTINUOUS_SENTINEL),
                ColumnKind::Categorical => Value::from(CATEGORICAL_SENTINEL),
            };
            (spec.name.clone(), value)
        })
        .collect()
}

/// Fills every missing declared field with its sentinel.
///
/// Re-scans the collection, so it can run on its own. Returns the number of
/// patched documents; zero when nothing is missing.
///
/// # Errors
///
/// Propagates storage errors. Documents patched before a failure stay
/// patched.
pub fn fill_missing(collection: &dyn DocumentStore, columns: &ColumnSet) -> Result<usize> {
    let mut patched = 0;
    for doc in find_missing(collection, columns)? {
        let patch = sentinel_patch(&doc, columns);
        if patch.is_empty() {
            continue;
        }
        collection.upsert_by_key(doc.id, patch)?;
        patched += 1;
    }
    Ok(patched)
}

/// Scans for missing values and, only if any were found, fills them.
///
/// # Errors
///
/// Propagates storage errors.
pub fn normalize(collection: &dyn DocumentStore, columns: &ColumnSet) -> Result<NormalizeOutcome> {
    let missing = find_missing(collection, columns)?;
    if missing.is_empty() {
        tracing::info!(collection = %collection.name(), "no missing values");
        return Ok(NormalizeOutcome::default());
    }

    tracing::info!(
        collection = %collection.name(),
        documents = missing.len(),
        "updating missing values"
    );
    let patched = fill_missing(collection, columns)?;
    Ok(NormalizeOutcome {
        missing_documents: missing.len(),
        patched,
    })
}
