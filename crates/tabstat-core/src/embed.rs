//! Materializes enriched copies of the base documents.
//!
//! Every source document is copied into a target collection with a snapshot
//! of a summary embedded under a fixed key: the frequency table under
//! `categories`, the column statistics under `statistics`. Copies are fresh
//! inserts carrying the originating id under `source_id`; running the stage
//! again adds another full set of copies.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::aggregate::{load_frequencies, load_statistics};
use crate::document::{Body, Document};
use crate::error::{Error, Result};
use crate::schema::ColumnSet;
use crate::store::DocumentStore;

/// Key of the embedded frequency snapshot.
pub const CATEGORIES_KEY: &str = "categories";

/// Key of the embedded statistics snapshot.
pub const STATISTICS_KEY: &str = "statistics";

/// Key holding the id of the copied document.
pub const SOURCE_ID_KEY: &str = "source_id";

/// Builds the enriched body of one copy.
#[must_use]
pub fn enriched_body(doc: &Document, key: &str, snapshot: &Map<String, Value>) -> Body {
    let mut body = doc.body.clone();
    body.insert(SOURCE_ID_KEY.to_string(), Value::from(doc.id.0));
    body.insert(key.to_string(), Value::Object(snapshot.clone()));
    body
}

fn snapshot<'a, T: Serialize + 'a>(
    entries: impl Iterator<Item = (&'a str, Option<T>)>,
) -> Result<Map<String, Value>> {
    entries
        .map(|(column, entry)| {
            let entry = entry.ok_or_else(|| {
                Error::PrerequisiteNotFound(format!("no summary for column '{column}'"))
            })?;
            Ok((column.to_string(), serde_json::to_value(entry)?))
        })
        .collect()
}

fn copy_all(
    source: &dyn DocumentStore,
    target: &dyn DocumentStore,
    key: &str,
    snapshot: &Map<String, Value>,
) -> Result<usize> {
    let docs = source.scan()?;
    for doc in &docs {
        target.insert(enriched_body(doc, key, snapshot))?;
    }
    tracing::info!(
        source = %source.name(),
        target = %target.name(),
        key = %key,
        documents = docs.len(),
        "embedded copies created"
    );
    Ok(docs.len())
}

/// Copies every source document with the frequency table embedded under
/// `categories`, one entry per categorical column.
///
/// Returns the number of copies inserted.
///
/// # Errors
///
/// Returns `PrerequisiteNotFound` when `frequencies` holds no document or it
/// lacks a declared column; propagates storage errors.
pub fn embed_categorical(
    source: &dyn DocumentStore,
    frequencies: &dyn DocumentStore,
    target: &dyn DocumentStore,
    columns: &ColumnSet,
) -> Result<usize> {
    let table = load_frequencies(frequencies)?;
    let snapshot = snapshot(columns.categorical().map(|c| (c, table.column(c))))?;
    copy_all(source, target, CATEGORIES_KEY, &snapshot)
}

/// Copies every source document with the column statistics embedded under
/// `statistics`, one entry per continuous column.
///
/// Returns the number of copies inserted.
///
/// # Errors
///
/// Returns `PrerequisiteNotFound` when `statistics` holds no document or it
/// lacks a declared column; propagates storage errors.
pub fn embed_continuous(
    source: &dyn DocumentStore,
    statistics: &dyn DocumentStore,
    target: &dyn DocumentStore,
    columns: &ColumnSet,
) -> Result<usize> {
    let stats = load_statistics(statistics)?;
    let snapshot = snapshot(columns.continuous().map(|c| (c, stats.get(c))))?;
    copy_all(source, target, STATISTICS_KEY, &snapshot)
}
