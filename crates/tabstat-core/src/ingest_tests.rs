//! Tests for ingest module

use crate::ingest::*;
use crate::store::{DocumentStore, MemoryCollection};
use serde_json::{json, Value};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_csv(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write");
    file
}

#[test]
fn test_parse_cell_numbers_and_strings() {
    let options = IngestOptions::default();

    assert_eq!(parse_cell("1.5", &options), json!(1.5));
    assert_eq!(parse_cell(" 2 ", &options), json!(2.0));
    assert_eq!(parse_cell("-1e3", &options), json!(-1000.0));
    assert_eq!(parse_cell("hs", &options), json!("hs"));
    // Partial numbers stay text
    assert_eq!(parse_cell("12abc", &options), json!("12abc"));
    assert_eq!(parse_cell("inf", &options), json!("inf"));
}

#[test]
fn test_parse_cell_empty_and_nan() {
    let nulls = IngestOptions::default();
    let keep = IngestOptions {
        empty_as_null: false,
        ..IngestOptions::default()
    };

    assert_eq!(parse_cell("", &nulls), Value::Null);
    assert_eq!(parse_cell("   ", &nulls), Value::Null);
    assert_eq!(parse_cell("", &keep), json!(""));
    assert_eq!(parse_cell("NaN", &keep), Value::Null);
    assert_eq!(parse_cell("nan", &nulls), Value::Null);
}

#[test]
fn test_parse_rows_uses_header_names() {
    // Arrange
    let file = write_csv("\"pH, standard units (Maximum)\",education\n7.5,hs\n,ba\n");

    // Act
    let rows = parse_rows(file.path(), &IngestOptions::default()).unwrap();

    // Assert
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["pH, standard units (Maximum)"], json!(7.5));
    assert_eq!(rows[0]["education"], json!("hs"));
    assert_eq!(rows[1]["pH, standard units (Maximum)"], Value::Null);
}

#[test]
fn test_parse_rows_custom_delimiter() {
    let file = write_csv("x;y\n1;2\n");
    let options = IngestOptions {
        delimiter: ';',
        ..IngestOptions::default()
    };

    let rows = parse_rows(file.path(), &options).unwrap();

    assert_eq!(rows[0]["y"], json!(2.0));
}

#[test]
fn test_parse_rows_rejects_ragged_rows() {
    let file = write_csv("x,y\n1,2\n3\n");

    let err = parse_rows(file.path(), &IngestOptions::default()).unwrap_err();

    assert_eq!(err.code(), "TABSTAT-007");
}

#[test]
fn test_non_ascii_delimiter_rejected() {
    let options = IngestOptions {
        delimiter: 'é',
        ..IngestOptions::default()
    };

    assert!(parse_reader("x\n1\n".as_bytes(), &options).is_err());
}

#[test]
fn test_parse_rows_missing_file_is_io_error() {
    let err = parse_rows("/definitely/not/here.csv", &IngestOptions::default()).unwrap_err();
    assert_eq!(err.code(), "TABSTAT-005");
}

#[test]
fn test_load_csv_inserts_every_row() {
    // Arrange
    let file = write_csv("x,edu\n1,hs\n2,\n3,ba\n");
    let collection = MemoryCollection::new("water");

    // Act
    let loaded = load_csv(file.path(), &collection, &IngestOptions::default()).unwrap();

    // Assert
    assert_eq!(loaded, 3);
    let docs = collection.scan().unwrap();
    assert_eq!(docs.len(), 3);
    assert!(docs[1].is_missing("edu"));
    assert_eq!(docs[2].numeric("x"), 3.0);
}
