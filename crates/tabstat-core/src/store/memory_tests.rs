//! Tests for `memory` module

use super::{DocumentStore, MemoryCollection};
use crate::document::{Body, DocumentId};
use crate::filter::{Condition, Filter};
use serde_json::json;

fn body(value: serde_json::Value) -> Body {
    value.as_object().cloned().unwrap_or_default()
}

#[test]
fn test_insert_assigns_increasing_ids_and_scan_keeps_order() {
    // Arrange
    let collection = MemoryCollection::new("water");

    // Act
    let a = collection.insert(body(json!({"x": 3}))).unwrap();
    let b = collection.insert(body(json!({"x": 1}))).unwrap();
    let docs = collection.scan().unwrap();

    // Assert
    assert!(a < b);
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].id, a);
    assert_eq!(docs[1].body["x"], json!(1));
    assert_eq!(collection.name(), "water");
}

#[test]
fn test_upsert_merges_top_level_fields_in_place() {
    // Arrange
    let collection = MemoryCollection::with_bodies(
        "water",
        vec![body(json!({"x": null, "y": 2})), body(json!({"x": 5}))],
    );

    // Act
    collection
        .upsert_by_key(DocumentId(1), body(json!({"x": -1})))
        .unwrap();
    let docs = collection.scan().unwrap();

    // Assert
    assert_eq!(docs[0].id, DocumentId(1));
    assert_eq!(docs[0].body["x"], json!(-1));
    assert_eq!(docs[0].body["y"], json!(2));
    assert_eq!(docs.len(), 2);
}

#[test]
fn test_upsert_unknown_id_creates_document_and_advances_ids() {
    let collection = MemoryCollection::new("c");
    collection
        .upsert_by_key(DocumentId(10), body(json!({"a": 1})))
        .unwrap();
    let next = collection.insert(body(json!({"b": 2}))).unwrap();

    assert_eq!(collection.count().unwrap(), 2);
    assert_eq!(next, DocumentId(11));
}

#[test]
fn test_scan_matching_and_first() {
    let collection = MemoryCollection::with_bodies(
        "c",
        vec![body(json!({"x": 1})), body(json!({"x": null})), body(json!({}))],
    );

    let missing = collection
        .scan_matching(&Filter::new(Condition::is_missing("x")))
        .unwrap();
    assert_eq!(missing.len(), 2);

    let first = collection.first().unwrap().unwrap();
    assert_eq!(first.body["x"], json!(1));
}

#[test]
fn test_clear() {
    let collection = MemoryCollection::with_bodies("c", vec![body(json!({"x": 1}))]);
    collection.clear().unwrap();
    assert_eq!(collection.count().unwrap(), 0);
    assert!(collection.first().unwrap().is_none());
}
