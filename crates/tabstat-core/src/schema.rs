//! Column declarations and load-time schema validation.
//!
//! Columns are declared once per pipeline run as either continuous (numeric,
//! aggregated into mean/std) or categorical (discrete labels, counted).
//! A [`ColumnSet`] is only constructible through validation, so every stage
//! receiving one can assume names are unique and non-empty.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::document::{Document, FieldValue};
use crate::error::{Error, Result};

/// Kind of a declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Real-valued measurement, subject to mean/std aggregation.
    Continuous,
    /// Discrete label, subject to frequency counting.
    Categorical,
}

/// A named, typed column declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name as it appears in the dataset header.
    pub name: String,
    /// Column kind.
    pub kind: ColumnKind,
}

impl ColumnSpec {
    /// Declares a continuous column.
    #[must_use]
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Continuous,
        }
    }

    /// Declares a categorical column.
    #[must_use]
    pub fn categorical(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Categorical,
        }
    }
}

/// Validated set of column declarations for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSet {
    specs: Vec<ColumnSpec>,
}

impl ColumnSet {
    /// Validates and builds a column set.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidation` if the list is empty, a name is empty, or a
    /// name is declared twice (including once per kind).
    pub fn new(specs: Vec<ColumnSpec>) -> Result<Self> {
        if specs.is_empty() {
            return Err(Error::SchemaValidation(
                "at least one column must be declared".to_string(),
            ));
        }

        let mut seen: IndexMap<&str, ColumnKind> = IndexMap::with_capacity(specs.len());
        for spec in &specs {
            if spec.name.trim().is_empty() {
                return Err(Error::SchemaValidation(
                    "column names cannot be empty".to_string(),
                ));
            }
            if let Some(previous) = seen.insert(spec.name.as_str(), spec.kind) {
                return Err(Error::SchemaValidation(format!(
                    "column '{}' declared twice ({previous:?} and {:?})",
                    spec.name, spec.kind
                )));
            }
        }

        Ok(Self { specs })
    }

    /// Builds a column set from separate name lists.
    ///
    /// # Errors
    ///
    /// Same as [`ColumnSet::new`].
    pub fn from_names<C, K>(continuous: C, categorical: K) -> Result<Self>
    where
        C: IntoIterator,
        C::Item: Into<String>,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        let specs = continuous
            .into_iter()
            .map(ColumnSpec::continuous)
            .chain(categorical.into_iter().map(ColumnSpec::categorical))
            .collect();
        Self::new(specs)
    }

    /// All declarations in declaration order.
    #[must_use]
    pub fn specs(&self) -> &[ColumnSpec] {
        &self.specs
    }

    /// Names of continuous columns in declaration order.
    pub fn continuous(&self) -> impl Iterator<Item = &str> {
        self.of_kind(ColumnKind::Continuous)
    }

    /// Names of categorical columns in declaration order.
    pub fn categorical(&self) -> impl Iterator<Item = &str> {
        self.of_kind(ColumnKind::Categorical)
    }

    /// Number of declared columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Always false: a validated set has at least one column.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    fn of_kind(&self, kind: ColumnKind) -> impl Iterator<Item = &str> {
        self.specs
            .iter()
            .filter(move |s| s.kind == kind)
            .map(|s| s.name.as_str())
    }
}

/// Per-column findings of a schema check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnReport {
    /// Cells that are absent, null or NaN.
    pub missing: usize,
    /// Cells of a continuous column holding non-numeric text.
    pub malformed: usize,
}

/// Result of checking a loaded table against a [`ColumnSet`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaReport {
    /// Number of records examined.
    pub records: usize,
    /// Findings keyed by column, in declaration order.
    pub columns: IndexMap<String, ColumnReport>,
}

impl SchemaReport {
    /// Total missing cells across all declared columns.
    #[must_use]
    pub fn total_missing(&self) -> usize {
        self.columns.values().map(|c| c.missing).sum()
    }

    /// Total malformed cells across all declared columns.
    #[must_use]
    pub fn total_malformed(&self) -> usize {
        self.columns.values().map(|c| c.malformed).sum()
    }

    /// True when no declared cell is missing or malformed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.total_missing() == 0 && self.total_malformed() == 0
    }
}

/// Checks every record against the declared columns.
///
/// Malformed continuous cells are reported, not rejected: they flow into the
/// statistics as NaN.
#[must_use]
pub fn validate(table: &[Document], columns: &ColumnSet) -> SchemaReport {
    let mut report = SchemaReport {
        records: table.len(),
        columns: columns
            .specs()
            .iter()
            .map(|s| (s.name.clone(), ColumnReport::default()))
            .collect(),
    };

    for doc in table {
        for spec in columns.specs() {
            let Some(entry) = report.columns.get_mut(&spec.name) else {
                continue;
            };
            match (doc.field(&spec.name), spec.kind) {
                (FieldValue::Missing, _) => entry.missing += 1,
                (FieldValue::Text(_), ColumnKind::Continuous) => entry.malformed += 1,
                _ => {}
            }
        }
    }

    for (name, col) in &report.columns {
        if col.malformed > 0 {
            tracing::warn!(
                column = %name,
                malformed = col.malformed,
                "non-numeric values in continuous column"
            );
        }
    }

    report
}
