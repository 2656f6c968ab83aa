//! `tabstat` configuration module.
//!
//! Provides configuration file support via `tabstat.toml`, environment
//! variables and built-in defaults.
//!
//! # Priority (highest to lowest)
//!
//! 1. Environment variables (`TABSTAT_*`, sections separated by `__`,
//!    e.g. `TABSTAT_STORAGE__DATA_DIR`)
//! 2. Configuration file (`tabstat.toml`)
//! 3. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::ingest::IngestOptions;
use crate::query::{Clause, IndexKey, QuerySpec};
use crate::schema::ColumnSet;
use crate::threshold::DEFAULT_RATIO;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "tabstat.toml";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },

    /// Configuration file not found.
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

/// Dataset section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Name of the base collection.
    pub collection: String,
    /// CSV file loaded by `tabstat load` when no path is given.
    pub csv_path: String,
    /// CSV field delimiter.
    pub delimiter: char,
    /// Store empty CSV cells as null.
    pub empty_as_null: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            collection: "water_dataset".to_string(),
            csv_path: "data/water_dataset.csv".to_string(),
            delimiter: ',',
            empty_as_null: true,
        }
    }
}

impl DatasetConfig {
    /// CSV options for ingestion.
    #[must_use]
    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            delimiter: self.delimiter,
            empty_as_null: self.empty_as_null,
        }
    }
}

/// Column declarations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    /// Continuous (numeric) columns.
    pub continuous: Vec<String>,
    /// Categorical columns.
    pub categorical: Vec<String>,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        let continuous = [
            "Specific conductance (Maximum)",
            "pH, standard units (Maximum)",
            "pH, standard units (Minimum)",
            "Specific conductance (Minimum)",
            "Specific conductance (Mean)",
            "Dissolved oxygen (Maximum)",
            "Dissolved oxygen (Mean)",
            "Dissolved oxygen (Minimum)",
            "Temperature (Mean)",
            "Temperature (Minimum)",
            "Temperature (Maximum)",
            "Target",
        ];
        Self {
            continuous: continuous.iter().map(ToString::to_string).collect(),
            categorical: vec!["married".to_string(), "education".to_string()],
        }
    }
}

/// Names of the derived collections. Unset names derive from the dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionsConfig {
    /// Statistics document collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<String>,
    /// Frequency table collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequencies: Option<String>,
    /// Lower mean-split bucket collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub below_mean: Option<String>,
    /// Upper mean-split bucket collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub above_mean: Option<String>,
    /// Copies with embedded frequencies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedded_categories: Option<String>,
    /// Copies with embedded statistics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedded_statistics: Option<String>,
}

/// Resolved collection names for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionNames {
    /// Base dataset.
    pub dataset: String,
    /// Statistics documents.
    pub statistics: String,
    /// Frequency tables.
    pub frequencies: String,
    /// Lower buckets.
    pub below_mean: String,
    /// Upper buckets.
    pub above_mean: String,
    /// Copies with `categories`.
    pub embedded_categories: String,
    /// Copies with `statistics`.
    pub embedded_statistics: String,
}

impl CollectionNames {
    /// Default names derived from the dataset collection.
    #[must_use]
    pub fn for_dataset(dataset: &str) -> Self {
        Self {
            dataset: dataset.to_string(),
            statistics: format!("{dataset}_statistics"),
            frequencies: format!("{dataset}_frequencies"),
            below_mean: format!("{dataset}_below_mean"),
            above_mean: format!("{dataset}_above_mean"),
            embedded_categories: format!("{dataset}_embedded_categories"),
            embedded_statistics: format!("{dataset}_embedded_statistics"),
        }
    }

    /// Derived collections, in the order the pipeline creates them.
    #[must_use]
    pub fn derived(&self) -> [&str; 6] {
        [
            &self.statistics,
            &self.frequencies,
            &self.below_mean,
            &self.above_mean,
            &self.embedded_categories,
            &self.embedded_statistics,
        ]
    }
}

/// Threshold section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// A column is flagged when `std > ratio * mean`.
    pub ratio: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            ratio: DEFAULT_RATIO,
        }
    }
}

/// Compound-index query section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Run the query as the last pipeline step.
    pub run_after_pipeline: bool,
    /// Clauses, all of which must hold.
    pub clauses: Vec<Clause>,
    /// Index keys, leading key first.
    pub index: Vec<IndexKey>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        let spec = QuerySpec::default();
        Self {
            run_after_pipeline: false,
            clauses: spec.clauses,
            index: spec.index,
        }
    }
}

impl QueryConfig {
    /// The configured query.
    #[must_use]
    pub fn spec(&self) -> QuerySpec {
        QuerySpec {
            clauses: self.clauses.clone(),
            index: self.index.clone(),
        }
    }
}

/// Storage configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Data directory path.
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./tabstat_data".to_string(),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace.
    pub level: String,
    /// Log format: text or json.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Main `tabstat` configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TabstatConfig {
    /// Dataset configuration.
    pub dataset: DatasetConfig,
    /// Column declarations.
    pub columns: ColumnsConfig,
    /// Derived collection names.
    pub collections: CollectionsConfig,
    /// Variance threshold.
    pub threshold: ThresholdConfig,
    /// Compound-index query.
    pub query: QueryConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl TabstatConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < file < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(DEFAULT_CONFIG_FILE)
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file is not an error; defaults and environment apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("TABSTAT_").split("__"));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Loads a configuration file that must exist.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` if the file does not exist, otherwise as
    /// [`TabstatConfig::load_from_path`].
    pub fn load_existing<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        Self::load_from_path(path)
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validated column declarations.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` for empty, blank or duplicated column names.
    pub fn column_set(&self) -> Result<ColumnSet, ConfigError> {
        ColumnSet::from_names(
            self.columns.continuous.iter().cloned(),
            self.columns.categorical.iter().cloned(),
        )
        .map_err(|e| invalid("columns", e.to_string()))
    }

    /// Collection names with unset entries derived from the dataset name.
    #[must_use]
    pub fn collection_names(&self) -> CollectionNames {
        let defaults = CollectionNames::for_dataset(&self.dataset.collection);
        let pick = |set: &Option<String>, default: String| set.clone().unwrap_or(default);
        let c = &self.collections;
        CollectionNames {
            statistics: pick(&c.statistics, defaults.statistics),
            frequencies: pick(&c.frequencies, defaults.frequencies),
            below_mean: pick(&c.below_mean, defaults.below_mean),
            above_mean: pick(&c.above_mean, defaults.above_mean),
            embedded_categories: pick(&c.embedded_categories, defaults.embedded_categories),
            embedded_statistics: pick(&c.embedded_statistics, defaults.embedded_statistics),
            dataset: defaults.dataset,
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Dataset
        if self.dataset.collection.trim().is_empty() {
            return Err(invalid("dataset.collection", "cannot be empty"));
        }
        if !self.dataset.delimiter.is_ascii() {
            return Err(invalid(
                "dataset.delimiter",
                format!("{:?} is not an ASCII character", self.dataset.delimiter),
            ));
        }

        // Columns
        self.column_set()?;

        // Collections: every name distinct
        let names = self.collection_names();
        let all: Vec<&str> = std::iter::once(names.dataset.as_str())
            .chain(names.derived())
            .collect();
        for (i, name) in all.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(invalid("collections", "collection names cannot be empty"));
            }
            if all[..i].contains(name) {
                return Err(invalid(
                    "collections",
                    format!("collection '{name}' is used twice"),
                ));
            }
        }

        // Threshold
        let ratio = self.threshold.ratio;
        if !ratio.is_finite() || ratio < 0.0 {
            return Err(invalid(
                "threshold.ratio",
                format!("value {ratio} must be a finite non-negative number"),
            ));
        }

        // Query
        self.query
            .spec()
            .validate()
            .map_err(|e| invalid("query", e.to_string()))?;

        // Validate logging level
        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(invalid(
                "logging.level",
                format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.level, valid_levels
                ),
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(invalid(
                "logging.format",
                format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.format, valid_formats
                ),
            ));
        }

        Ok(())
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}
