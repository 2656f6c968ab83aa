//! Tests for `schema` module

use crate::document::{Document, DocumentId};
use crate::schema::*;
use serde_json::json;

fn doc(id: u64, body: serde_json::Value) -> Document {
    Document::new(DocumentId(id), body.as_object().cloned().unwrap_or_default())
}

#[test]
fn test_column_set_splits_kinds_in_declaration_order() {
    // Arrange & Act
    let columns = ColumnSet::from_names(["b", "a"], ["married", "education"]).unwrap();

    // Assert
    assert_eq!(columns.continuous().collect::<Vec<_>>(), vec!["b", "a"]);
    assert_eq!(
        columns.categorical().collect::<Vec<_>>(),
        vec!["married", "education"]
    );
    assert_eq!(columns.len(), 4);
}

#[test]
fn test_column_set_rejects_duplicates() {
    let result = ColumnSet::from_names(["x", "x"], Vec::<String>::new());
    assert!(result.is_err());
}

#[test]
fn test_column_set_rejects_name_declared_with_both_kinds() {
    let result = ColumnSet::from_names(["x"], ["x"]);
    let err = result.unwrap_err();
    assert_eq!(err.code(), "TABSTAT-009");
}

#[test]
fn test_column_set_rejects_empty() {
    assert!(ColumnSet::new(vec![]).is_err());
    assert!(ColumnSet::new(vec![ColumnSpec::continuous("  ")]).is_err());
}

#[test]
fn test_column_set_allows_no_categorical_columns() {
    let columns = ColumnSet::from_names(["Temperature (Mean)"], Vec::<String>::new()).unwrap();
    assert_eq!(columns.categorical().count(), 0);
}

#[test]
fn test_validate_counts_missing_and_malformed() {
    // Arrange
    let columns = ColumnSet::from_names(["x"], ["edu"]).unwrap();
    let table = vec![
        doc(1, json!({"x": 1.0, "edu": "hs"})),
        doc(2, json!({"x": null, "edu": "ba"})),
        doc(3, json!({"x": "n/a"})),
        doc(4, json!({"edu": 3})),
    ];

    // Act
    let report = validate(&table, &columns);

    // Assert
    assert_eq!(report.records, 4);
    assert_eq!(report.columns["x"].missing, 2);
    assert_eq!(report.columns["x"].malformed, 1);
    assert_eq!(report.columns["edu"].missing, 1);
    assert_eq!(report.columns["edu"].malformed, 0);
    assert_eq!(report.total_missing(), 3);
    assert!(!report.is_clean());
}

#[test]
fn test_validate_clean_table() {
    let columns = ColumnSet::from_names(["x"], Vec::<String>::new()).unwrap();
    let table = vec![doc(1, json!({"x": 1})), doc(2, json!({"x": -1}))];
    assert!(validate(&table, &columns).is_clean());
}
