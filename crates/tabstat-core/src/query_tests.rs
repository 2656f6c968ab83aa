//! Tests for query module

use crate::document::{Document, DocumentId};
use crate::query::*;
use crate::store::{DocumentStore, MemoryCollection};
use serde_json::json;

const COND: &str = "Specific conductance (Maximum)";
const PH: &str = "pH, standard units (Maximum)";
const OXY: &str = "Dissolved oxygen (Mean)";

fn water() -> MemoryCollection {
    MemoryCollection::with_bodies(
        "water",
        [
            json!({COND: 0.9, PH: 0.2, OXY: 0.5}),
            json!({COND: 0.4, PH: 0.2, OXY: 0.5}),
            json!({COND: 0.7, PH: 0.8, OXY: 0.02}),
            json!({COND: 0.7, PH: 0.9, OXY: 0.001}),
            json!({COND: 0.6, PH: 1.2, OXY: 0.3}),
            json!({COND: null, PH: 0.1, OXY: 0.3}),
        ]
        .iter()
        .filter_map(|v| v.as_object().cloned()),
    )
}

fn ids(docs: &[Document]) -> Vec<u64> {
    docs.iter().map(|d| d.id.0).collect()
}

#[test]
fn test_default_spec_matches_water_query() {
    let spec = QuerySpec::default();

    assert_eq!(spec.clauses.len(), 3);
    assert_eq!(spec.index[1], IndexKey::new(PH, SortOrder::Desc));
    assert!(spec.validate().is_ok());
}

#[test]
fn test_run_indexed_query_returns_matches_in_index_order() {
    // Arrange
    let collection = water();

    // Act
    let results = run_indexed_query(&collection, &QuerySpec::default()).unwrap();

    // Assert: conductance ascending, so 0.7 (doc 3) before 0.9 (doc 1)
    assert_eq!(ids(&results), vec![3, 1]);
}

#[test]
fn test_index_orders_by_declared_directions() {
    let docs = vec![
        Document::new(DocumentId(1), json!({"a": 1, "b": 1}).as_object().cloned().unwrap_or_default()),
        Document::new(DocumentId(2), json!({"a": 1, "b": 5}).as_object().cloned().unwrap_or_default()),
        Document::new(DocumentId(3), json!({"a": 0, "b": 3}).as_object().cloned().unwrap_or_default()),
        Document::new(DocumentId(4), json!({"b": 9}).as_object().cloned().unwrap_or_default()),
    ];

    let index = CompoundIndex::from_documents(
        docs,
        vec![IndexKey::new("a", SortOrder::Asc), IndexKey::new("b", SortOrder::Desc)],
    );

    let order: Vec<u64> = index.iter().map(|d| d.id.0).collect();
    assert_eq!(order, vec![3, 2, 1, 4]);
    assert_eq!(index.len(), 4);
}

#[test]
fn test_descending_leading_key_range() {
    // Arrange
    let spec = QuerySpec {
        clauses: vec![
            Clause::new(PH, ClauseOp::Gte, 0.2),
            Clause::new(PH, ClauseOp::Lt, 1.0),
        ],
        index: vec![IndexKey::new(PH, SortOrder::Desc)],
    };

    // Act
    let results = run_indexed_query(&water(), &spec).unwrap();

    // Assert: 0.9, 0.8, then the two 0.2 rows by id
    assert_eq!(ids(&results), vec![4, 3, 1, 2]);
}

#[test]
fn test_eq_clause_and_empty_index() {
    let spec = QuerySpec {
        clauses: vec![Clause::new(COND, ClauseOp::Eq, 0.7)],
        index: Vec::new(),
    };

    let results = run_indexed_query(&water(), &spec).unwrap();

    assert_eq!(ids(&results), vec![3, 4]);
}

#[test]
fn test_no_clause_on_leading_field_scans_everything() {
    let spec = QuerySpec {
        clauses: vec![Clause::new(OXY, ClauseOp::Lte, 0.3)],
        index: vec![IndexKey::new(COND, SortOrder::Asc)],
    };

    let results = run_indexed_query(&water(), &spec).unwrap();

    // Missing conductance sorts last but is still a candidate
    assert_eq!(ids(&results), vec![5, 3, 4, 6]);
}

#[test]
fn test_eq_clause_on_near_equal_values_matches_scan() {
    // Arrange
    let collection = MemoryCollection::with_bodies(
        "sums",
        [json!({"a": 0.1 + 0.2}), json!({"a": 0.3})]
            .iter()
            .filter_map(|v| v.as_object().cloned()),
    );
    let spec = QuerySpec {
        clauses: vec![Clause::new("a", ClauseOp::Eq, 0.3)],
        index: vec![IndexKey::new("a", SortOrder::Asc)],
    };

    // Act
    let indexed = run_indexed_query(&collection, &spec).unwrap();
    let scanned = collection.scan_matching(&spec.filter()).unwrap();

    // Assert
    assert_eq!(ids(&indexed), ids(&scanned));
    assert_eq!(ids(&indexed), vec![2]);
}

#[test]
fn test_bounds_keep_tightest() {
    let clauses = vec![
        Clause::new("x", ClauseOp::Gt, 1.0),
        Clause::new("x", ClauseOp::Gte, 2.0),
        Clause::new("x", ClauseOp::Lt, 5.0),
        Clause::new("x", ClauseOp::Lte, 5.0),
        Clause::new("y", ClauseOp::Lt, 0.0),
    ];

    let bounds = Bounds::for_field(&clauses, "x");

    assert_eq!(bounds.lower, Some((2.0, true)));
    assert_eq!(bounds.upper, Some((5.0, false)));
}

#[test]
fn test_validate_rejects_bad_specs() {
    let nan = QuerySpec {
        clauses: vec![Clause::new("x", ClauseOp::Gt, f64::NAN)],
        index: Vec::new(),
    };
    let twice = QuerySpec {
        clauses: Vec::new(),
        index: vec![IndexKey::new("x", SortOrder::Asc), IndexKey::new("x", SortOrder::Desc)],
    };

    assert!(nan.validate().is_err());
    assert!(twice.validate().is_err());
}

#[test]
fn test_spec_deserializes_from_toml_shape() {
    let value = json!({
        "clauses": [{"field": "x", "op": "gte", "value": 1.5}],
        "index": [{"field": "x", "order": "desc"}, {"field": "y"}]
    });

    let spec: QuerySpec = serde_json::from_value(value).unwrap();

    assert_eq!(spec.clauses[0].op, ClauseOp::Gte);
    assert_eq!(spec.index[1].order, SortOrder::Asc);
    assert!(serde_json::from_value::<Clause>(json!({"field": "x", "op": "like", "value": 1})).is_err());
}

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn op_strategy() -> impl Strategy<Value = ClauseOp> {
        prop_oneof![
            Just(ClauseOp::Gt),
            Just(ClauseOp::Gte),
            Just(ClauseOp::Lt),
            Just(ClauseOp::Lte),
            Just(ClauseOp::Eq),
        ]
    }

    /// Tenths built by addition, so near-equal values such as `0.1 + 0.2`
    /// and `0.3` both occur.
    fn tenths() -> impl Strategy<Value = f64> {
        prop_oneof![
            (0i32..10).prop_map(f64::from),
            (0u8..4, 0u8..4).prop_map(|(a, b)| f64::from(a) / 10.0 + f64::from(b) / 10.0),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Property: the indexed query returns exactly the filtered scan
        #[test]
        fn prop_index_agrees_with_filter(
            rows in proptest::collection::vec((proptest::option::of(tenths()), tenths()), 0usize..30),
            ops in proptest::collection::vec((op_strategy(), tenths()), 1usize..3),
            desc in any::<bool>()
        ) {
            let collection = MemoryCollection::with_bodies(
                "p",
                rows.iter().filter_map(|(a, b)| json!({"a": a, "b": b}).as_object().cloned()),
            );
            let spec = QuerySpec {
                clauses: ops.iter().map(|(op, v)| Clause::new("a", *op, *v)).collect(),
                index: vec![
                    IndexKey::new("a", if desc { SortOrder::Desc } else { SortOrder::Asc }),
                    IndexKey::new("b", SortOrder::Asc),
                ],
            };

            let mut indexed = ids(&run_indexed_query(&collection, &spec).unwrap());
            let mut scanned = ids(&collection.scan_matching(&spec.filter()).unwrap());
            indexed.sort_unstable();
            scanned.sort_unstable();

            prop_assert_eq!(indexed, scanned);
        }
    }
}
