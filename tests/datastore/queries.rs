//! Query Semantics Tests

use crate::common::*;

// ============================================================================
// Ancestors
// ============================================================================

fn family() -> TestStore {
    let ts = TestStore::new();
    let a1 = Key::new("A", 1);
    let b2 = a1.child("B", 2);
    ts.put_all(vec![
        Entity::new(a1.clone()).with("x", 1),
        Entity::new(b2.clone()).with("x", 2),
        Entity::new(b2.child("C", 3)).with("x", 3),
        Entity::new(Key::new("A", 9)).with("x", 9),
    ]);
    ts
}

#[test]
fn kindless_ancestor_query_returns_whole_subtree() {
    let ts = family();
    let results = ts.run(&Query::kindless().ancestor(Key::new("A", 1)));
    let a1 = Key::new("A", 1);
    assert_eq!(
        keys(&results),
        vec![a1.clone(), a1.child("B", 2), a1.child("B", 2).child("C", 3)]
    );
}

#[test]
fn ancestor_query_never_matches_siblings() {
    let ts = family();
    let results = ts.run(&Query::kindless().ancestor(Key::new("A", 9)));
    assert_eq!(keys(&results), vec![Key::new("A", 9)]);
}

#[test]
fn kind_and_ancestor_combine() {
    let ts = family();
    let b = ts.run(&Query::new("B").ancestor(Key::new("A", 1)));
    assert_eq!(ints(&b, "x"), vec![2]);

    let c = ts.run(&Query::new("C").ancestor(Key::new("A", 1).child("B", 2)));
    assert_eq!(ints(&c, "x"), vec![3]);

    let none = ts.run(&Query::new("B").ancestor(Key::new("A", 9)));
    assert!(none.is_empty());
}

#[test]
fn ancestor_matches_by_position_not_membership() {
    let ts = TestStore::new();
    let a1 = Key::new("A", 1);
    // both paths hold the tokens A-1 and B-2
    ts.put_all(vec![
        Entity::new(a1.child("B", 2)).with("x", 1),
        Entity::new(a1.child("C", 1).child("B", 2)).with("x", 2),
    ]);
    let results = ts.run(&Query::kindless().ancestor(a1.child("B", 2)));
    assert_eq!(ints(&results, "x"), vec![1]);
}

#[test]
fn kindless_queries_need_an_ancestor() {
    let ts = family();
    let result = ts.db.run_query(&Query::kindless());
    assert!(matches!(result, Err(Error::BadRequest(_))));

    let result = ts.db.run_query(
        &Query::kindless()
            .ancestor(Key::new("A", 1))
            .filter("x", FilterOp::Equal, 1),
    );
    assert!(matches!(result, Err(Error::BadRequest(_))));
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn ordering_excludes_entities_without_the_property() {
    let ts = TestStore::new();
    ts.put_all(vec![
        item("E", 1, "a", 2),
        item("E", 2, "b", 5),
        item("E", 3, "a", 1),
    ]);
    let results = ts.run(&Query::new("E").order("a", Direction::Ascending));
    assert_eq!(ints(&results, "a"), vec![1, 2]);
    assert_eq!(results.len(), 2);
}

#[test]
fn ordering_excludes_unorderable_values() {
    let ts = TestStore::new();
    ts.put_all(vec![
        item("E", 1, "a", Value::text("long text")),
        item("E", 2, "a", 7),
        item("E", 3, "a", Value::Blob(vec![1, 2])),
        item("E", 4, "a", Value::EmbeddedEntity(vec![3])),
    ]);
    let results = ts.run(&Query::new("E").order("a", Direction::Descending));
    assert_eq!(keys(&results), vec![Key::new("E", 2)]);
}

#[test]
fn descending_order_breaks_ties_by_key() {
    let ts = TestStore::new();
    ts.put_all(vec![
        item("E", 1, "a", 1),
        item("E", 2, "a", 2),
        item("E", 3, "a", 2),
    ]);
    let results = ts.run(&Query::new("E").order("a", Direction::Descending));
    assert_eq!(
        keys(&results),
        vec![Key::new("E", 2), Key::new("E", 3), Key::new("E", 1)]
    );
}

#[test]
fn mixed_types_order_numbers_before_strings() {
    let ts = TestStore::new();
    ts.put_all(vec![
        item("E", 1, "a", "b"),
        item("E", 2, "a", 5),
        item("E", 3, "a", 1.5),
    ]);
    let results = ts.run(&Query::new("E").order("a", Direction::Ascending));
    assert_eq!(
        keys(&results),
        vec![Key::new("E", 3), Key::new("E", 2), Key::new("E", 1)]
    );
}

#[test]
fn kind_spread_over_collections_is_merged_in_order() {
    let ts = TestStore::new();
    ts.put_all(vec![
        Entity::new(Key::new("Post", 1).child("Comment", 1)).with("n", 4),
        Entity::new(Key::new("Thread", 1).child("Comment", 1)).with("n", 1),
        Entity::new(Key::new("Post", 1).child("Comment", 2)).with("n", 2),
        Entity::new(Key::new("Thread", 1).child("Comment", 2)).with("n", 3),
        Entity::new(Key::new("Comment", 5)).with("n", 0),
    ]);
    let results = ts.run(&Query::new("Comment").order("n", Direction::Ascending));
    assert_eq!(ints(&results, "n"), vec![0, 1, 2, 3, 4]);
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn range_filters_on_one_property_intersect() {
    let ts = TestStore::new();
    ts.put_all((0..100).map(|i| item("R", i + 1, "a", i)).collect());

    let results = ts.run(
        &Query::new("R")
            .filter("a", FilterOp::GreaterThan, 20)
            .filter("a", FilterOp::LessThanOrEqual, 60)
            .order("a", Direction::Ascending),
    );
    assert_eq!(results.len(), 40);
    assert_eq!(ints(&results, "a"), (21..=60).collect::<Vec<i64>>());
}

#[test]
fn equality_matches_any_list_element() {
    let ts = TestStore::new();
    ts.put_all(vec![
        item("T", 1, "tags", vec![Value::string("red"), Value::string("blue")]),
        item("T", 2, "tags", vec![Value::string("green")]),
        item("T", 3, "tags", "red"),
    ]);
    let results = ts.run(&Query::new("T").filter("tags", FilterOp::Equal, "red"));
    assert_eq!(keys(&results), vec![Key::new("T", 1), Key::new("T", 3)]);
}

#[test]
fn filters_compare_within_one_type() {
    let ts = TestStore::new();
    ts.put_all(vec![item("T", 1, "a", 5), item("T", 2, "a", "5"), item("T", 3, "a", true)]);
    let results = ts.run(&Query::new("T").filter("a", FilterOp::GreaterThanOrEqual, 0));
    assert_eq!(keys(&results), vec![Key::new("T", 1)]);
}

#[test]
fn structured_property_names_are_queryable() {
    let ts = TestStore::new();
    ts.put_all(vec![
        item("P", 1, "address.city", "Lyon"),
        item("P", 2, "address.city", "Oslo"),
    ]);
    let results = ts.run(&Query::new("P").filter("address.city", FilterOp::Equal, "Oslo"));
    assert_eq!(keys(&results), vec![Key::new("P", 2)]);
}

#[test]
fn key_filters_and_orders() {
    let ts = TestStore::new();
    ts.put_all((1..=9).map(|i| item("K", i, "v", i)).collect());

    let results = ts.run(
        &Query::new("K")
            .filter("__key__", FilterOp::GreaterThan, Key::new("K", 5))
            .order("__key__", Direction::Descending),
    );
    assert_eq!(ints(&results, "v"), vec![9, 8, 7, 6]);
}

#[test]
fn key_order_is_numeric_for_ids() {
    let ts = TestStore::new();
    let ids = [10, -3, 5, 100, 9, -12, 42];
    ts.put_all(ids.iter().map(|&i| item("N", i, "v", i)).collect());
    ts.put_all(vec![Entity::new(Key::new("N", "7")).with("v", 0)]);

    let default_order = ts.run(&Query::new("N"));
    assert_eq!(ints(&default_order, "v"), vec![-12, -3, 5, 9, 10, 42, 100, 0]);

    let ascending = ts.run(&Query::new("N").order("__key__", Direction::Ascending));
    assert_eq!(ints(&ascending, "v"), ints(&default_order, "v"));

    let above_five = ts.run(&Query::new("N").filter(
        "__key__",
        FilterOp::GreaterThan,
        Key::new("N", 5),
    ));
    assert_eq!(ints(&above_five, "v"), vec![9, 10, 42, 100, 0]);

    let below_ten = ts.run(
        &Query::new("N")
            .filter("__key__", FilterOp::LessThan, Key::new("N", 10))
            .order("__key__", Direction::Descending),
    );
    assert_eq!(ints(&below_ten, "v"), vec![9, 5, -3, -12]);
}

#[test]
fn property_ties_break_on_numeric_key_order() {
    let ts = TestStore::new();
    ts.put_all(vec![
        item("T", 10, "v", 1),
        item("T", 9, "v", 1),
        item("T", 100, "v", 1),
    ]);
    let results = ts.run(&Query::new("T").order("v", Direction::Ascending));
    assert_eq!(
        keys(&results),
        vec![Key::new("T", 9), Key::new("T", 10), Key::new("T", 100)]
    );
}

#[test]
fn key_filters_need_key_values() {
    let ts = TestStore::new();
    let result = ts
        .db
        .run_query(&Query::new("K").filter("__key__", FilterOp::Equal, 5));
    assert!(matches!(result, Err(Error::BadRequest(_))));
}

#[test]
fn limit_bounds_results() {
    let ts = TestStore::new();
    ts.put_all((1..=10).map(|i| item("L", i, "v", i)).collect());
    let results = ts.run(&Query::new("L").order("v", Direction::Descending).limit(3));
    assert_eq!(ints(&results, "v"), vec![10, 9, 8]);
}

#[test]
fn keys_only_returns_bare_keys() {
    let ts = family();
    let results = ts.run(&Query::new("A").keys_only());
    assert_eq!(
        results,
        vec![Entity::new(Key::new("A", 1)), Entity::new(Key::new("A", 9))]
    );
}

// ============================================================================
// Index policy
// ============================================================================

#[test]
fn missing_composite_index_is_reported() {
    let ts = TestStore::with_config(DatastoreConfig::new("integration").require_indexes(true));
    ts.put_all(vec![item("I", 1, "a", 1).with("b", 2)]);
    let query = Query::new("I")
        .filter("a", FilterOp::Equal, 1)
        .order("b", Direction::Descending);

    let err = ts.db.run_query(&query).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NeedIndex);
    match err {
        Error::MissingRequiredIndex { kind, index } => {
            assert_eq!(kind, "I");
            assert_eq!(
                index.properties,
                vec![
                    ("a".to_string(), Direction::Ascending),
                    ("b".to_string(), Direction::Descending)
                ]
            );
            ts.db.register_index(index);
        }
        other => panic!("expected missing index, got {:?}", other),
    }

    assert_eq!(ts.run(&query).len(), 1);
}
