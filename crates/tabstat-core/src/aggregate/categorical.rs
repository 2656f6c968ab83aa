//! Label frequencies per categorical column.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::{load_first, to_body};
use crate::document::Document;
use crate::error::Result;
use crate::schema::ColumnSet;
use crate::store::DocumentStore;

/// Label counts keyed by column, then label.
///
/// Columns keep declaration order; within a column labels are ordered by
/// descending count, ties broken by label, so the table does not depend on
/// scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyTable {
    columns: IndexMap<String, IndexMap<String, u64>>,
}

impl FrequencyTable {
    /// Counts for one column.
    #[must_use]
    pub fn column(&self, column: &str) -> Option<&IndexMap<String, u64>> {
        self.columns.get(column)
    }

    /// Count of one label, zero when unseen.
    #[must_use]
    pub fn count(&self, column: &str, label: &str) -> u64 {
        self.columns
            .get(column)
            .and_then(|labels| labels.get(label))
            .copied()
            .unwrap_or(0)
    }

    /// Iterates `(column, counts)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexMap<String, u64>)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when no column is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Counts labels of every categorical column.
///
/// Records whose value is null or absent are skipped. Numbers are counted
/// under their decimal rendering (`1`, `0.5`).
#[must_use]
pub fn compute_frequencies(table: &[Document], columns: &ColumnSet) -> FrequencyTable {
    let mut frequencies = FrequencyTable::default();

    for column in columns.categorical() {
        let mut counts: FxHashMap<String, u64> = FxHashMap::default();
        for label in table.iter().filter_map(|doc| doc.label(column)) {
            *counts.entry(label).or_insert(0) += 1;
        }

        let mut sorted: Vec<(String, u64)> = counts.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        frequencies
            .columns
            .insert(column.to_string(), sorted.into_iter().collect());
    }

    frequencies
}

/// Counts `source` and inserts one frequency document into `target`.
///
/// # Errors
///
/// Propagates storage and serialization errors.
pub fn create_frequencies(
    source: &dyn DocumentStore,
    target: &dyn DocumentStore,
    columns: &ColumnSet,
) -> Result<FrequencyTable> {
    let table = source.scan()?;
    let frequencies = compute_frequencies(&table, columns);
    let id = target.insert(to_body(&frequencies)?)?;
    tracing::info!(
        source = %source.name(),
        target = %target.name(),
        columns = frequencies.len(),
        document = %id,
        "frequencies created"
    );
    Ok(frequencies)
}

/// Reads the first frequency document of `collection`.
///
/// # Errors
///
/// Returns `PrerequisiteNotFound` if the collection holds no document.
pub fn load_frequencies(collection: &dyn DocumentStore) -> Result<FrequencyTable> {
    load_first(collection, "frequency")
}
