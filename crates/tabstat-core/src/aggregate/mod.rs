//! Column aggregation.
//!
//! Two aggregators, both pure over an in-memory table, each with a
//! `create_*` entry point that scans a source collection and inserts a single
//! summary document into a target collection.
//!
//! # Public Types
//!
//! - [`Statistics`] / [`ColumnStatistics`]: mean, std and count per continuous column
//! - [`FrequencyTable`]: label counts per categorical column

mod categorical;
mod continuous;


pub use categorical::{compute_frequencies, create_frequencies, load_frequencies, FrequencyTable};
pub use continuous::{
    compute_statistics, create_statistics, load_statistics, ColumnStatistics, Statistics,
};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::document::Body;
use crate::error::{Error, Result};
use crate::store::DocumentStore;

/// Serializes a summary into a document body.
pub(crate) fn to_body<T: Serialize>(summary: &T) -> Result<Body> {
    match serde_json::to_value(summary)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Internal(format!(
            "summary serialized to non-object {other}"
        ))),
    }
}

/// Reads the first summary document of `collection`.
///
/// Fails with `PrerequisiteNotFound` when the collection is empty.
pub(crate) fn load_first<T: DeserializeOwned>(
    collection: &dyn DocumentStore,
    what: &str,
) -> Result<T> {
    let doc = collection.first()?.ok_or_else(|| {
        Error::PrerequisiteNotFound(format!(
            "no {what} document in collection '{}'",
            collection.name()
        ))
    })?;
    Ok(serde_json::from_value(Value::Object(doc.body))?)
}
