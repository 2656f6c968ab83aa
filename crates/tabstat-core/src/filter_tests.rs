//! Tests for filter module

use crate::filter::*;
use serde_json::json;

#[test]
fn test_filter_equality_number_and_string() {
    // Arrange
    let payload = json!({"education": "hs", "married": 1});

    // Act & Assert
    assert!(Filter::new(Condition::eq("education", "hs")).matches(&payload));
    assert!(Filter::new(Condition::eq("married", 1.0)).matches(&payload));
    assert!(!Filter::new(Condition::eq("education", "ba")).matches(&payload));
}

#[test]
fn test_filter_comparisons() {
    let payload = json!({"x": 5});

    assert!(Filter::new(Condition::gt("x", 4)).matches(&payload));
    assert!(!Filter::new(Condition::gt("x", 5)).matches(&payload));
    assert!(Filter::new(Condition::gte("x", 5)).matches(&payload));
    assert!(Filter::new(Condition::lt("x", 5.5)).matches(&payload));
    assert!(Filter::new(Condition::lte("x", 5)).matches(&payload));
    assert!(!Filter::new(Condition::lte("x", 4.9)).matches(&payload));
}

#[test]
fn test_filter_comparison_on_missing_or_mismatched_type_is_false() {
    let payload = json!({"s": "text", "n": null});

    assert!(!Filter::new(Condition::gt("absent", 0)).matches(&payload));
    assert!(!Filter::new(Condition::gt("s", 0)).matches(&payload));
    assert!(!Filter::new(Condition::lt("n", 0)).matches(&payload));
}

#[test]
fn test_filter_is_missing() {
    let payload = json!({"a": null, "b": 0, "c": ""});

    assert!(Filter::new(Condition::is_missing("a")).matches(&payload));
    assert!(Filter::new(Condition::is_missing("z")).matches(&payload));
    assert!(!Filter::new(Condition::is_missing("b")).matches(&payload));
    assert!(!Filter::new(Condition::is_missing("c")).matches(&payload));
}

#[test]
fn test_filter_logical_combinators() {
    // Arrange
    let payload = json!({"x": 1, "y": null});
    let any_missing = Condition::or(vec![
        Condition::is_missing("x"),
        Condition::is_missing("y"),
    ]);

    // Act & Assert
    assert!(Filter::new(any_missing.clone()).matches(&payload));
    assert!(!Filter::new(Condition::not(any_missing)).matches(&payload));
    assert!(!Filter::new(Condition::and(vec![
        Condition::gt("x", 0),
        Condition::gt("y", 0),
    ]))
    .matches(&payload));
    assert!(Filter::new(Condition::and(vec![])).matches(&payload));
    assert!(!Filter::new(Condition::or(vec![])).matches(&payload));
}

#[test]
fn test_field_names_with_punctuation_are_literal() {
    let payload = json!({"pH, standard units (Maximum)": 0.4, "a.b": 2});

    assert!(Filter::new(Condition::lt("pH, standard units (Maximum)", 1)).matches(&payload));
    assert!(Filter::new(Condition::eq("a.b", 2)).matches(&payload));
}

#[test]
fn test_condition_serialization_is_tagged() {
    let cond = Condition::gt("x", 0.5);
    let json = serde_json::to_value(&cond).unwrap();
    assert_eq!(json, json!({"type": "gt", "field": "x", "value": 0.5}));
}

#[test]
fn test_numeric_equality_is_exact() {
    // Arrange
    let payload = json!({"a": 0.1 + 0.2});

    // Act & Assert
    assert!(!Filter::new(Condition::eq("a", 0.3)).matches(&payload));
    assert!(Filter::new(Condition::eq("a", 0.1 + 0.2)).matches(&payload));
    assert!(Filter::new(Condition::gte("a", 0.3)).matches(&payload));
}
