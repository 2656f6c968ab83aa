//! Document data structure representing one stored row or summary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// JSON object type used for document bodies and patches.
pub type Body = Map<String, Value>;

/// Store-assigned document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A document in a collection.
///
/// A document consists of:
/// - A store-assigned identifier
/// - A JSON object body (flat for dataset rows, nested for summaries)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier within its collection.
    pub id: DocumentId,

    /// Field values keyed by column name.
    #[serde(default)]
    pub body: Body,
}

impl Document {
    /// Creates a new document.
    #[must_use]
    pub fn new(id: DocumentId, body: Body) -> Self {
        Self { id, body }
    }

    /// Returns the typed value of a column.
    #[must_use]
    pub fn field(&self, column: &str) -> FieldValue {
        FieldValue::from_json(self.body.get(column))
    }

    /// Returns the value of a column as a float for arithmetic.
    ///
    /// Missing and non-numeric values yield NaN so that they propagate
    /// through sums instead of being silently dropped.
    #[must_use]
    pub fn numeric(&self, column: &str) -> f64 {
        self.field(column).as_f64()
    }

    /// Returns the categorical label of a column, or `None` if the field is
    /// absent or null.
    #[must_use]
    pub fn label(&self, column: &str) -> Option<String> {
        self.field(column).label()
    }

    /// Returns true if the column is absent or null.
    #[must_use]
    pub fn is_missing(&self, column: &str) -> bool {
        matches!(self.field(column), FieldValue::Missing)
    }
}

/// Typed view of one field of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A finite number.
    Number(f64),
    /// Any non-numeric scalar, rendered as text.
    Text(String),
    /// Absent key, `null`, or a not-a-number marker.
    Missing,
}

impl FieldValue {
    /// Classifies a raw JSON value.
    #[must_use]
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Missing,
            Some(Value::Number(n)) => match n.as_f64() {
                Some(f) if f.is_nan() => Self::Missing,
                Some(f) => Self::Number(f),
                None => Self::Missing,
            },
            Some(Value::String(s)) => Self::Text(s.clone()),
            Some(other) => Self::Text(other.to_string()),
        }
    }

    /// Numeric value, or NaN for text and missing fields.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Number(f) => *f,
            Self::Text(_) | Self::Missing => f64::NAN,
        }
    }

    /// Label used by frequency counting.
    ///
    /// Numbers use their shortest decimal rendering (`1`, `0.5`).
    #[must_use]
    pub fn label(&self) -> Option<String> {
        match self {
            Self::Number(f) => Some(f.to_string()),
            Self::Text(s) => Some(s.clone()),
            Self::Missing => None,
        }
    }
}
