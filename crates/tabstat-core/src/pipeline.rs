//! Pipeline orchestration.
//!
//! Runs the derivation stages strictly in order against one [`Database`]:
//!
//! ```text
//! normalize -> statistics -> frequencies -> below-mean -> above-mean
//!   -> embed categorical -> embed continuous -> threshold [-> query]
//! ```
//!
//! A failing stage aborts the run. Nothing already written is rolled back.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::aggregate::{self, FrequencyTable, Statistics};
use crate::config::{CollectionNames, TabstatConfig};
use crate::database::Database;
use crate::document::Document;
use crate::embed;
use crate::error::{Error, Result};
use crate::normalize::{self, NormalizeOutcome};
use crate::partition::{self, Partition};
use crate::query::{self, QuerySpec};
use crate::schema::ColumnSet;
use crate::store::{DocumentStore, LogCollection};
use crate::threshold;

/// One step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Fill missing values with sentinels.
    Normalize,
    /// Aggregate continuous columns.
    Statistics,
    /// Count categorical labels.
    Frequencies,
    /// Persist values at or below the mean.
    BelowMean,
    /// Persist values above the mean.
    AboveMean,
    /// Copy documents with embedded frequencies.
    EmbedCategorical,
    /// Copy documents with embedded statistics.
    EmbedContinuous,
    /// Flag high-variance columns.
    Threshold,
    /// Run the compound-index query.
    Query,
}

impl Stage {
    /// The derivation stages in execution order, without the query.
    pub const ORDERED: [Stage; 8] = [
        Stage::Normalize,
        Stage::Statistics,
        Stage::Frequencies,
        Stage::BelowMean,
        Stage::AboveMean,
        Stage::EmbedCategorical,
        Stage::EmbedContinuous,
        Stage::Threshold,
    ];

    /// Command-line name of the stage.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Normalize => "normalize",
            Self::Statistics => "statistics",
            Self::Frequencies => "frequencies",
            Self::BelowMean => "below-mean",
            Self::AboveMean => "above-mean",
            Self::EmbedCategorical => "embed-categorical",
            Self::EmbedContinuous => "embed-continuous",
            Self::Threshold => "threshold",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ORDERED
            .into_iter()
            .chain(std::iter::once(Self::Query))
            .find(|stage| stage.name() == s)
            .ok_or_else(|| Error::Config(format!("unknown stage '{s}'")))
    }
}

/// Inputs of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Collections read and written.
    pub collections: CollectionNames,
    /// Declared columns.
    pub columns: ColumnSet,
    /// Variance threshold ratio.
    pub ratio: f64,
    /// Query run after the threshold stage, if any.
    pub query: Option<QuerySpec>,
}

impl PipelineConfig {
    /// Configuration with default collection names and ratio, no query.
    #[must_use]
    pub fn new(dataset: &str, columns: ColumnSet) -> Self {
        Self {
            collections: CollectionNames::for_dataset(dataset),
            columns,
            ratio: threshold::DEFAULT_RATIO,
            query: None,
        }
    }

    /// Builds the run configuration from a validated file configuration.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the configuration is invalid.
    pub fn from_config(config: &TabstatConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            collections: config.collection_names(),
            columns: config.column_set()?,
            ratio: config.threshold.ratio,
            query: config
                .query
                .run_after_pipeline
                .then(|| config.query.spec()),
        })
    }
}

/// Result of a single stage.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "stage", content = "result", rename_all = "kebab-case")]
pub enum StageOutcome {
    /// Missing-value scan and fix.
    Normalize(NormalizeOutcome),
    /// Computed statistics.
    Statistics(Statistics),
    /// Computed frequencies.
    Frequencies(FrequencyTable),
    /// Lower bucket.
    BelowMean(Partition),
    /// Upper bucket.
    AboveMean(Partition),
    /// Number of copies with `categories`.
    EmbedCategorical(usize),
    /// Number of copies with `statistics`.
    EmbedContinuous(usize),
    /// Flagged columns.
    Threshold(Vec<String>),
    /// Matching documents.
    Query(Vec<Document>),
}

/// Summary of a full run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    /// Normalization result.
    pub normalize: NormalizeOutcome,
    /// Statistics document.
    pub statistics: Statistics,
    /// Frequency document.
    pub frequencies: FrequencyTable,
    /// Lower buckets.
    pub below_mean: Partition,
    /// Upper buckets.
    pub above_mean: Partition,
    /// Copies with embedded frequencies.
    pub embedded_categories: usize,
    /// Copies with embedded statistics.
    pub embedded_statistics: usize,
    /// Columns flagged as high-variance.
    pub flagged: Vec<String>,
    /// Query results, when the query ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Vec<Document>>,
    /// Wall-clock duration in seconds.
    pub duration_secs: f64,
}

impl PipelineReport {
    fn record(&mut self, outcome: StageOutcome) {
        match outcome {
            StageOutcome::Normalize(n) => self.normalize = n,
            StageOutcome::Statistics(s) => self.statistics = s,
            StageOutcome::Frequencies(f) => self.frequencies = f,
            StageOutcome::BelowMean(p) => self.below_mean = p,
            StageOutcome::AboveMean(p) => self.above_mean = p,
            StageOutcome::EmbedCategorical(n) => self.embedded_categories = n,
            StageOutcome::EmbedContinuous(n) => self.embedded_statistics = n,
            StageOutcome::Threshold(flagged) => self.flagged = flagged,
            StageOutcome::Query(docs) => self.query = Some(docs),
        }
    }
}

/// Sequential pipeline over a database.
pub struct Pipeline<'a> {
    db: &'a Database,
    config: PipelineConfig,
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline.
    #[must_use]
    pub fn new(db: &'a Database, config: PipelineConfig) -> Self {
        Self { db, config }
    }

    /// Run configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Stages a full run executes.
    #[must_use]
    pub fn stages(&self) -> Vec<Stage> {
        let mut stages = Stage::ORDERED.to_vec();
        if self.config.query.is_some() {
            stages.push(Stage::Query);
        }
        stages
    }

    /// Runs every stage in order.
    ///
    /// # Errors
    ///
    /// Returns the first stage error; later stages do not run.
    pub fn run(&self) -> Result<PipelineReport> {
        let start = Instant::now();
        let mut report = PipelineReport::default();

        info!(dataset = %self.config.collections.dataset, "starting pipeline");
        for stage in self.stages() {
            report.record(self.run_stage(stage)?);
        }
        report.duration_secs = start.elapsed().as_secs_f64();

        info!(
            duration_secs = report.duration_secs,
            flagged = report.flagged.len(),
            "pipeline complete"
        );
        Ok(report)
    }

    /// Opens a collection an earlier stage must have filled.
    ///
    /// Never creates it, so a stage that fails fast leaves nothing behind.
    fn prerequisite(&self, name: &str, producer: Stage) -> Result<Arc<LogCollection>> {
        let missing = || {
            Error::PrerequisiteNotFound(format!(
                "collection '{name}' is empty or absent, run stage '{producer}' first"
            ))
        };
        let collection = match self.db.existing_collection(name) {
            Ok(collection) => collection,
            Err(Error::CollectionNotFound(_)) => return Err(missing()),
            Err(e) => return Err(e),
        };
        if collection.count()? == 0 {
            return Err(missing());
        }
        Ok(collection)
    }

    /// Runs one stage.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` if the dataset was never loaded,
    /// `PrerequisiteNotFound` if an upstream stage has not run, and storage
    /// errors.
    pub fn run_stage(&self, stage: Stage) -> Result<StageOutcome> {
        let names = &self.config.collections;
        let columns = &self.config.columns;
        let start = Instant::now();
        info!(stage = %stage, "running stage");

        let source = self.db.existing_collection(&names.dataset)?;
        let source = source.as_ref();

        let outcome = match stage {
            Stage::Normalize => StageOutcome::Normalize(normalize::normalize(source, columns)?),
            Stage::Statistics => {
                let target = self.db.collection(&names.statistics)?;
                StageOutcome::Statistics(aggregate::create_statistics(
                    source,
                    target.as_ref(),
                    columns,
                )?)
            }
            Stage::Frequencies => {
                let target = self.db.collection(&names.frequencies)?;
                StageOutcome::Frequencies(aggregate::create_frequencies(
                    source,
                    target.as_ref(),
                    columns,
                )?)
            }
            Stage::BelowMean => {
                let statistics = self.prerequisite(&names.statistics, Stage::Statistics)?;
                let target = self.db.collection(&names.below_mean)?;
                StageOutcome::BelowMean(partition::create_less_than_means(
                    source,
                    statistics.as_ref(),
                    target.as_ref(),
                    columns,
                )?)
            }
            Stage::AboveMean => {
                let statistics = self.prerequisite(&names.statistics, Stage::Statistics)?;
                let target = self.db.collection(&names.above_mean)?;
                StageOutcome::AboveMean(partition::create_greater_than_means(
                    source,
                    statistics.as_ref(),
                    target.as_ref(),
                    columns,
                )?)
            }
            Stage::EmbedCategorical => {
                let frequencies = self.prerequisite(&names.frequencies, Stage::Frequencies)?;
                let target = self.db.collection(&names.embedded_categories)?;
                StageOutcome::EmbedCategorical(embed::embed_categorical(
                    source,
                    frequencies.as_ref(),
                    target.as_ref(),
                    columns,
                )?)
            }
            Stage::EmbedContinuous => {
                let statistics = self.prerequisite(&names.statistics, Stage::Statistics)?;
                let target = self.db.collection(&names.embedded_statistics)?;
                StageOutcome::EmbedContinuous(embed::embed_continuous(
                    source,
                    statistics.as_ref(),
                    target.as_ref(),
                    columns,
                )?)
            }
            Stage::Threshold => {
                let enriched =
                    self.prerequisite(&names.embedded_statistics, Stage::EmbedContinuous)?;
                StageOutcome::Threshold(threshold::flag_high_variance(
                    enriched.as_ref(),
                    columns,
                    self.config.ratio,
                )?)
            }
            Stage::Query => {
                let spec = self.config.query.clone().unwrap_or_default();
                StageOutcome::Query(query::run_indexed_query(source, &spec)?)
            }
        };

        info!(
            stage = %stage,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "stage complete"
        );
        Ok(outcome)
    }
}
