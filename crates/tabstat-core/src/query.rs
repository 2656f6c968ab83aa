//! Compound-index query over a collection.
//!
//! A [`CompoundIndex`] orders documents by several numeric fields, each
//! ascending or descending. A [`QuerySpec`] combines range clauses (all must
//! hold) with the index to use: the range on the leading index field is
//! located by binary search, the remaining clauses filter the candidates.
//! Results come back in index order.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::filter::{Condition, Filter};
use crate::store::DocumentStore;

/// Direction of one index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

/// One component of a compound index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexKey {
    /// Indexed field.
    pub field: String,
    /// Sort direction.
    #[serde(default)]
    pub order: SortOrder,
}

impl IndexKey {
    /// Creates an index key.
    #[must_use]
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

/// Comparison operator of a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseOp {
    /// `field > value`
    Gt,
    /// `field >= value`
    Gte,
    /// `field < value`
    Lt,
    /// `field <= value`
    Lte,
    /// `field == value`
    Eq,
}

/// A numeric comparison on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    /// Field compared.
    pub field: String,
    /// Operator.
    pub op: ClauseOp,
    /// Right-hand side.
    pub value: f64,
}

impl Clause {
    /// Creates a clause.
    #[must_use]
    pub fn new(field: impl Into<String>, op: ClauseOp, value: f64) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    fn condition(&self) -> Condition {
        let field = self.field.as_str();
        match self.op {
            ClauseOp::Gt => Condition::gt(field, self.value),
            ClauseOp::Gte => Condition::gte(field, self.value),
            ClauseOp::Lt => Condition::lt(field, self.value),
            ClauseOp::Lte => Condition::lte(field, self.value),
            ClauseOp::Eq => Condition::eq(field, self.value),
        }
    }
}

/// Conjunction of clauses plus the index that serves them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Clauses, all of which must hold.
    pub clauses: Vec<Clause>,
    /// Index keys, leading key first.
    pub index: Vec<IndexKey>,
}

impl Default for QuerySpec {
    /// Water-quality query: high conductance, low pH, some dissolved oxygen.
    fn default() -> Self {
        const CONDUCTANCE: &str = "Specific conductance (Maximum)";
        const PH: &str = "pH, standard units (Maximum)";
        const OXYGEN: &str = "Dissolved oxygen (Mean)";
        Self {
            clauses: vec![
                Clause::new(CONDUCTANCE, ClauseOp::Gt, 0.5),
                Clause::new(PH, ClauseOp::Lt, 1.0),
                Clause::new(OXYGEN, ClauseOp::Gt, 0.01),
            ],
            index: vec![
                IndexKey::new(CONDUCTANCE, SortOrder::Asc),
                IndexKey::new(PH, SortOrder::Desc),
                IndexKey::new(OXYGEN, SortOrder::Asc),
            ],
        }
    }
}

impl QuerySpec {
    /// Filter equivalent to the clauses.
    #[must_use]
    pub fn filter(&self) -> Filter {
        Filter::new(Condition::and(
            self.clauses.iter().map(Clause::condition).collect(),
        ))
    }

    /// Checks that the query is usable.
    ///
    /// # Errors
    ///
    /// Returns `Config` for non-finite clause values, empty field names or a
    /// field indexed twice.
    pub fn validate(&self) -> Result<()> {
        for clause in &self.clauses {
            if clause.field.is_empty() {
                return Err(Error::Config("query clause with empty field".to_string()));
            }
            if !clause.value.is_finite() {
                return Err(Error::Config(format!(
                    "query clause on '{}' has non-finite value",
                    clause.field
                )));
            }
        }
        for (i, key) in self.index.iter().enumerate() {
            if key.field.is_empty() {
                return Err(Error::Config("index key with empty field".to_string()));
            }
            if self.index[..i].iter().any(|k| k.field == key.field) {
                return Err(Error::Config(format!(
                    "field '{}' indexed twice",
                    key.field
                )));
            }
        }
        Ok(())
    }
}

/// Range on one field, built from the clauses that mention it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    /// Lower bound and whether it is inclusive.
    pub lower: Option<(f64, bool)>,
    /// Upper bound and whether it is inclusive.
    pub upper: Option<(f64, bool)>,
}

impl Bounds {
    /// Intersects the clauses on `field` into one range.
    #[must_use]
    pub fn for_field(clauses: &[Clause], field: &str) -> Self {
        let mut bounds = Self::default();
        for clause in clauses.iter().filter(|c| c.field == field) {
            match clause.op {
                ClauseOp::Gt => bounds.tighten_lower(clause.value, false),
                ClauseOp::Gte => bounds.tighten_lower(clause.value, true),
                ClauseOp::Lt => bounds.tighten_upper(clause.value, false),
                ClauseOp::Lte => bounds.tighten_upper(clause.value, true),
                ClauseOp::Eq => {
                    bounds.tighten_lower(clause.value, true);
                    bounds.tighten_upper(clause.value, true);
                }
            }
        }
        bounds
    }

    #[allow(clippy::float_cmp)]
    fn tighten_lower(&mut self, value: f64, inclusive: bool) {
        self.lower = match self.lower {
            Some((v, inc)) if v > value || (v == value && !inc) => Some((v, inc)),
            _ => Some((value, inclusive)),
        };
    }

    #[allow(clippy::float_cmp)]
    fn tighten_upper(&mut self, value: f64, inclusive: bool) {
        self.upper = match self.upper {
            Some((v, inc)) if v < value || (v == value && !inc) => Some((v, inc)),
            _ => Some((value, inclusive)),
        };
    }

    fn below(&self, x: f64) -> bool {
        self.lower
            .is_some_and(|(v, inclusive)| if inclusive { x < v } else { x <= v })
    }

    fn above(&self, x: f64) -> bool {
        self.upper
            .is_some_and(|(v, inclusive)| if inclusive { x > v } else { x >= v })
    }
}

#[derive(Debug, Clone)]
struct IndexEntry {
    key: Vec<Option<f64>>,
    doc: Document,
}

/// Documents sorted by a list of numeric keys.
///
/// Documents whose key field is missing or non-numeric sort after every
/// numeric key, whatever the direction.
#[derive(Debug, Clone)]
pub struct CompoundIndex {
    keys: Vec<IndexKey>,
    entries: Vec<IndexEntry>,
}

impl CompoundIndex {
    /// Builds the index from a collection scan.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub fn build(collection: &dyn DocumentStore, keys: Vec<IndexKey>) -> Result<Self> {
        Ok(Self::from_documents(collection.scan()?, keys))
    }

    /// Builds the index over documents already in memory.
    #[must_use]
    pub fn from_documents(docs: Vec<Document>, keys: Vec<IndexKey>) -> Self {
        let mut entries: Vec<IndexEntry> = docs
            .into_iter()
            .map(|doc| IndexEntry {
                key: keys
                    .iter()
                    .map(|k| Some(doc.numeric(&k.field)).filter(|v| !v.is_nan()))
                    .collect(),
                doc,
            })
            .collect();
        entries.sort_by(|a, b| {
            compare_keys(&keys, &a.key, &b.key).then_with(|| a.doc.id.cmp(&b.doc.id))
        });
        Self { keys, entries }
    }

    /// Index keys.
    #[must_use]
    pub fn keys(&self) -> &[IndexKey] {
        &self.keys
    }

    /// Number of indexed documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Documents in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.entries.iter().map(|e| &e.doc)
    }

    /// Slice of entries whose leading key lies within `bounds`.
    fn leading_range(&self, bounds: &Bounds) -> &[IndexEntry] {
        let Some(leading) = self.keys.first() else {
            return &self.entries;
        };
        if bounds.lower.is_none() && bounds.upper.is_none() {
            return &self.entries;
        }
        // Entries before the range, then inside, then after: both predicates
        // are monotonic in index order.
        let (before, after): (fn(&Bounds, f64) -> bool, fn(&Bounds, f64) -> bool) =
            match leading.order {
                SortOrder::Asc => (Bounds::below, Bounds::above),
                SortOrder::Desc => (Bounds::above, Bounds::below),
            };
        let start = self
            .entries
            .partition_point(|e| e.key[0].is_some_and(|x| before(bounds, x)));
        let end = self
            .entries
            .partition_point(|e| e.key[0].is_some_and(|x| !after(bounds, x)));
        if start >= end {
            return &[];
        }
        &self.entries[start..end]
    }

    /// Runs `spec` against the index.
    #[must_use]
    pub fn search(&self, spec: &QuerySpec) -> Vec<Document> {
        let candidates = match self.keys.first() {
            Some(leading) => self.leading_range(&Bounds::for_field(&spec.clauses, &leading.field)),
            None => &self.entries[..],
        };
        let filter = spec.filter();
        let results: Vec<Document> = candidates
            .iter()
            .filter(|e| filter.matches_body(&e.doc.body))
            .map(|e| e.doc.clone())
            .collect();
        tracing::debug!(
            indexed = self.entries.len(),
            candidates = candidates.len(),
            results = results.len(),
            "index search"
        );
        results
    }
}

fn compare_keys(keys: &[IndexKey], a: &[Option<f64>], b: &[Option<f64>]) -> Ordering {
    for ((key, x), y) in keys.iter().zip(a).zip(b) {
        let ord = match (x, y) {
            (Some(x), Some(y)) => match key.order {
                SortOrder::Asc => x.total_cmp(y),
                SortOrder::Desc => y.total_cmp(x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Builds the index described by `spec` over `collection` and runs the query.
///
/// # Errors
///
/// Returns `Config` for an invalid spec and propagates storage errors.
pub fn run_indexed_query(collection: &dyn DocumentStore, spec: &QuerySpec) -> Result<Vec<Document>> {
    spec.validate()?;
    let index = CompoundIndex::build(collection, spec.index.clone())?;
    let results = index.search(spec);
    tracing::info!(
        collection = %collection.name(),
        clauses = spec.clauses.len(),
        results = results.len(),
        "indexed query"
    );
    Ok(results)
}
