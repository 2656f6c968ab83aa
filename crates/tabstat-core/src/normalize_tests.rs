//! Tests for normalize module

use crate::normalize::*;
use crate::schema::ColumnSet;
use crate::store::{DocumentStore, MemoryCollection};
use serde_json::json;

fn collection(rows: serde_json::Value) -> MemoryCollection {
    let bodies = rows
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| v.as_object().cloned());
    MemoryCollection::with_bodies("water", bodies)
}

fn columns() -> ColumnSet {
    ColumnSet::from_names(["x"], ["edu"]).unwrap()
}

#[test]
fn test_find_missing_matches_null_and_absent() {
    // Arrange
    let water = collection(json!([
        {"x": 1, "edu": "hs"},
        {"x": null, "edu": "hs"},
        {"edu": "ba"},
        {"x": 2, "edu": null},
    ]));

    // Act
    let missing = find_missing(&water, &columns()).unwrap();

    // Assert
    assert_eq!(missing.len(), 3);
    assert_eq!(missing[0].id.0, 2);
}

#[test]
fn test_fill_missing_writes_sentinels_by_kind() {
    // Arrange
    let water = collection(json!([
        {"x": null, "edu": null, "other": "kept"},
        {"x": 4, "edu": "ba"},
    ]));

    // Act
    let patched = fill_missing(&water, &columns()).unwrap();

    // Assert
    assert_eq!(patched, 1);
    let docs = water.scan().unwrap();
    assert_eq!(docs[0].body["x"], json!(-1));
    assert_eq!(docs[0].body["edu"], json!("empty"));
    assert_eq!(docs[0].body["other"], json!("kept"));
    assert_eq!(docs[1].body["x"], json!(4));
}

#[test]
fn test_undeclared_fields_are_ignored() {
    let water = collection(json!([{"x": 1, "edu": "hs", "notes": null}]));

    let outcome = normalize(&water, &columns()).unwrap();

    assert_eq!(outcome, NormalizeOutcome::default());
    assert!(water.scan().unwrap()[0].body["notes"].is_null());
}

#[test]
fn test_normalize_twice_finds_nothing_second_time() {
    // Arrange
    let water = collection(json!([
        {"x": null, "edu": "hs"},
        {"edu": null},
    ]));

    // Act
    let first = normalize(&water, &columns()).unwrap();
    let second = normalize(&water, &columns()).unwrap();

    // Assert
    assert_eq!(first.missing_documents, 2);
    assert_eq!(first.patched, 2);
    assert_eq!(second, NormalizeOutcome::default());
    assert!(find_missing(&water, &columns()).unwrap().is_empty());
}

#[test]
fn test_fill_missing_on_clean_collection_is_noop() {
    let water = collection(json!([{"x": 1, "edu": "hs"}]));

    assert_eq!(fill_missing(&water, &columns()).unwrap(), 0);
}

#[test]
fn test_sentinel_patch_only_contains_missing_fields() {
    let water = collection(json!([{"x": 3, "edu": null}]));
    let doc = water.first().unwrap().unwrap();

    let patch = sentinel_patch(&doc, &columns());

    assert_eq!(serde_json::Value::Object(patch), json!({"edu": "empty"}));
}
