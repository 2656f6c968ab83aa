//! Tests for partition module

use crate::aggregate::{compute_statistics, create_statistics, ColumnStatistics, Statistics};
use crate::document::{Document, DocumentId};
use crate::error::Error;
use crate::partition::*;
use crate::schema::ColumnSet;
use crate::store::{DocumentStore, MemoryCollection};
use serde_json::json;

fn table(values: &[serde_json::Value]) -> Vec<Document> {
    values
        .iter()
        .zip(1u64..)
        .map(|(v, id)| {
            let mut body = serde_json::Map::new();
            body.insert("x".to_string(), v.clone());
            Document::new(DocumentId(id), body)
        })
        .collect()
}

fn x_only() -> ColumnSet {
    ColumnSet::from_names(["x"], Vec::<String>::new()).unwrap()
}

fn stats_with_mean(mean: f64) -> Statistics {
    let mut stats = Statistics::default();
    stats.insert(
        "x",
        ColumnStatistics {
            mean,
            std: 0.0,
            non_missing_count: 0,
            exceeds_threshold: None,
        },
    );
    stats
}

#[test]
fn test_split_three_values_around_mean() {
    // Arrange
    let rows = table(&[json!(1), json!(2), json!(3)]);
    let stats = compute_statistics(&rows, &x_only());

    // Act
    let (le, gt) = split(&rows, &stats, &x_only()).unwrap();

    // Assert
    assert_eq!(le["x"].values, vec![1.0, 2.0]);
    assert_eq!(gt["x"].values, vec![3.0]);
    assert!((le["x"].mean - 2.0).abs() < f64::EPSILON);
}

#[test]
fn test_value_equal_to_mean_goes_lower() {
    assert!(Side::LessOrEqual.admits(2.0, 2.0));
    assert!(!Side::Greater.admits(2.0, 2.0));
}

#[test]
fn test_uses_stored_mean_not_recomputed() {
    // Stored mean deliberately differs from the table's mean (2)
    let rows = table(&[json!(1), json!(2), json!(3)]);

    let (le, gt) = split(&rows, &stats_with_mean(0.5), &x_only()).unwrap();

    assert!(le["x"].values.is_empty());
    assert_eq!(gt["x"].values, vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_missing_values_land_in_neither_bucket() {
    let rows = table(&[json!(1), json!(null), json!("n/a"), json!(5)]);

    let (le, gt) = split(&rows, &stats_with_mean(3.0), &x_only()).unwrap();

    assert_eq!(le["x"].values, vec![1.0]);
    assert_eq!(gt["x"].values, vec![5.0]);
}

#[test]
fn test_scan_order_is_preserved() {
    let rows = table(&[json!(9), json!(1), json!(7), json!(0)]);

    let gt = partition(&rows, &stats_with_mean(4.0), &x_only(), Side::Greater).unwrap();

    assert_eq!(gt["x"].values, vec![9.0, 7.0]);
}

#[test]
fn test_column_absent_from_statistics_fails() {
    let columns = ColumnSet::from_names(["x", "y"], Vec::<String>::new()).unwrap();

    let err = partition(&[], &stats_with_mean(1.0), &columns, Side::Greater).unwrap_err();

    assert!(matches!(err, Error::PrerequisiteNotFound(_)));
}

#[test]
fn test_create_without_statistics_fails_fast() {
    // Arrange
    let source = MemoryCollection::with_bodies("water", json!({"x": 1}).as_object().cloned());
    let statistics = MemoryCollection::new("water_statistics");
    let target = MemoryCollection::new("water_below_mean");

    // Act
    let result = create_less_than_means(&source, &statistics, &target, &x_only());

    // Assert
    assert!(matches!(result, Err(Error::PrerequisiteNotFound(_))));
    assert_eq!(target.count().unwrap(), 0);
}

#[test]
fn test_create_both_sides_persist_documents() {
    // Arrange
    let source = MemoryCollection::with_bodies(
        "water",
        [json!({"x": 1}), json!({"x": 2}), json!({"x": 3})]
            .iter()
            .filter_map(|v| v.as_object().cloned()),
    );
    let statistics = MemoryCollection::new("water_statistics");
    let below = MemoryCollection::new("water_below_mean");
    let above = MemoryCollection::new("water_above_mean");
    create_statistics(&source, &statistics, &x_only()).unwrap();

    // Act
    create_less_than_means(&source, &statistics, &below, &x_only()).unwrap();
    create_greater_than_means(&source, &statistics, &above, &x_only()).unwrap();

    // Assert
    let below_doc = below.first().unwrap().unwrap();
    let above_doc = above.first().unwrap().unwrap();
    assert_eq!(
        serde_json::Value::Object(below_doc.body),
        json!({"x": {"mean": 2.0, "values": [1.0, 2.0]}})
    );
    assert_eq!(
        serde_json::Value::Object(above_doc.body),
        json!({"x": {"mean": 2.0, "values": [3.0]}})
    );
}

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Property: both buckets together hold exactly the numeric values, once each
        #[test]
        fn prop_buckets_partition_numeric_values(
            values in proptest::collection::vec(proptest::option::of(-100i32..100), 0usize..40),
            mean in -100i32..100
        ) {
            let raw: Vec<serde_json::Value> = values.iter().map(|v| json!(v)).collect();
            let rows = table(&raw);
            let mean = f64::from(mean);

            let (le, gt) = split(&rows, &stats_with_mean(mean), &x_only()).unwrap();

            let numeric: Vec<f64> = values.iter().flatten().map(|v| f64::from(*v)).collect();
            prop_assert_eq!(le["x"].values.len() + gt["x"].values.len(), numeric.len());
            prop_assert!(le["x"].values.iter().all(|v| *v <= mean));
            prop_assert!(gt["x"].values.iter().all(|v| *v > mean));

            let mut merged: Vec<f64> = le["x"].values.iter().chain(&gt["x"].values).copied().collect();
            let mut expected = numeric;
            merged.sort_by(f64::total_cmp);
            expected.sort_by(f64::total_cmp);
            prop_assert_eq!(merged, expected);
        }
    }
}
