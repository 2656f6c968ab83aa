//! # tabstat core
//!
//! Descriptive statistics, imputation and derived tables for tabular datasets
//! held in a small embedded document store.
//!
//! A dataset is loaded from CSV into a collection, then a fixed sequence of
//! stages derives new collections from it:
//!
//! - **Normalize**: fill missing values with `-1` / `"empty"` sentinels
//! - **Statistics**: mean, population std and record count per continuous column
//! - **Frequencies**: label counts per categorical column
//! - **Mean split**: values at or below / above each column mean
//! - **Embed**: copies of every record with a summary snapshot attached
//! - **Threshold**: flag columns whose std exceeds 10% of the mean
//! - **Query**: optional compound-index range query
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tabstat_core::{ColumnSet, Database, IngestOptions, Pipeline, PipelineConfig};
//!
//! # fn main() -> tabstat_core::Result<()> {
//! let db = Database::open("./tabstat_data")?;
//! let water = db.collection("water_dataset")?;
//! tabstat_core::load_csv("water.csv", water.as_ref(), &IngestOptions::default())?;
//!
//! let columns = ColumnSet::from_names(["Temperature (Mean)"], ["education"])?;
//! let report = Pipeline::new(&db, PipelineConfig::new("water_dataset", columns)).run()?;
//! println!("flagged: {:?}", report.flagged);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)] // record counts as f64 divisors
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

pub mod aggregate;
pub mod config;
pub mod database;
pub mod document;
pub mod embed;
pub mod error;
#[cfg(test)]
mod error_tests;
pub mod filter;
#[cfg(test)]
mod filter_tests;
pub mod ingest;
#[cfg(test)]
mod ingest_tests;
pub mod normalize;
#[cfg(test)]
mod normalize_tests;
pub mod partition;
#[cfg(test)]
mod partition_tests;
pub mod pipeline;
pub mod query;
#[cfg(test)]
mod query_tests;
pub mod schema;
#[cfg(test)]
mod schema_tests;
pub mod store;
pub mod threshold;
pub mod util;

pub use aggregate::{
    compute_frequencies, compute_statistics, create_frequencies, create_statistics,
    load_frequencies, load_statistics, ColumnStatistics, FrequencyTable, Statistics,
};
pub use config::{CollectionNames, ConfigError, TabstatConfig};
pub use database::Database;
pub use document::{Body, Document, DocumentId, FieldValue};
pub use embed::{embed_categorical, embed_continuous};
pub use error::{Error, Result};
pub use filter::{Condition, Filter};
pub use ingest::{load_csv, parse_rows, IngestOptions};
pub use normalize::{fill_missing, find_missing, normalize, NormalizeOutcome};
pub use partition::{
    create_greater_than_means, create_less_than_means, partition, split, Partition,
    PartitionedColumn, Side,
};
pub use pipeline::{Pipeline, PipelineConfig, PipelineReport, Stage, StageOutcome};
pub use query::{run_indexed_query, Clause, ClauseOp, CompoundIndex, IndexKey, QuerySpec, SortOrder};
pub use schema::{ColumnKind, ColumnSet, ColumnSpec, SchemaReport};
pub use store::{DocumentStore, LogCollection, MemoryCollection};
pub use threshold::{apply_threshold, flag_high_variance};
