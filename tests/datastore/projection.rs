//! Projection Query Tests

use crate::common::*;

fn list(values: &[i64]) -> Value {
    Value::List(values.iter().map(|v| Value::Int(*v)).collect())
}

fn projected_values(results: &[Entity], property: &str) -> Vec<Value> {
    results
        .iter()
        .filter_map(|e| e.get(property).cloned())
        .collect()
}

#[test]
fn repeated_property_is_split_per_element() {
    let ts = TestStore::new();
    ts.put_all(vec![item("S", 1, "a", list(&[1, 2, 3])).with("b", "other")]);

    let results = ts.run(&Query::new("S").project(["a"]));
    assert_eq!(results.len(), 3);
    for entity in &results {
        assert_eq!(entity.key(), &Key::new("S", 1));
        assert_eq!(entity.len(), 1);
        assert!(entity.get("b").is_none());
    }
    let mut values = projected_values(&results, "a");
    values.sort_by_key(|v| v.as_list().and_then(|l| l[0].as_int()));
    assert_eq!(values, vec![list(&[1]), list(&[2]), list(&[3])]);
}

#[test]
fn repeated_elements_split_once() {
    let ts = TestStore::new();
    ts.put_all(vec![item("S", 1, "a", list(&[1, 1, 2]))]);

    let results = ts.run(&Query::new("S").project(["a"]));
    let mut values = projected_values(&results, "a");
    values.sort_by_key(|v| v.as_list().and_then(|l| l[0].as_int()));
    assert_eq!(values, vec![list(&[1]), list(&[2])]);
}

#[test]
fn filter_narrows_split_elements() {
    let ts = TestStore::new();
    ts.put_all(vec![item("S", 1, "a", list(&[1, 2, 3]))]);

    let results = ts.run(
        &Query::new("S")
            .project(["a"])
            .filter("a", FilterOp::LessThan, 3),
    );
    let mut values = projected_values(&results, "a");
    values.sort_by_key(|v| v.as_list().and_then(|l| l[0].as_int()));
    assert_eq!(values, vec![list(&[1]), list(&[2])]);
}

#[test]
fn split_keeps_other_projected_properties() {
    let ts = TestStore::new();
    ts.put_all(vec![item("S", 1, "a", list(&[1, 2])).with("b", 9)]);

    let results = ts.run(&Query::new("S").project(["a", "b"]));
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|e| e.get("b") == Some(&Value::Int(9))));
}

#[test]
fn two_repeated_properties_degrade_to_whole_documents() {
    let ts = TestStore::new();
    ts.put_all(vec![item("S", 1, "a", list(&[1, 2])).with("b", list(&[3, 4]))]);

    let started = ts
        .db
        .run_query(&Query::new("S").project(["a", "b"]))
        .unwrap();
    let batch = ts.db.next(started.cursor_id, 10).unwrap();
    assert!(batch.degraded);
    assert_eq!(batch.entities.len(), 1);
    assert_eq!(batch.entities[0].get("a"), Some(&list(&[1, 2])));
    assert_eq!(batch.entities[0].get("b"), Some(&list(&[3, 4])));
}

#[test]
fn projection_skips_entities_without_the_property() {
    let ts = TestStore::new();
    ts.put_all(vec![item("S", 1, "a", 5), item("S", 2, "b", 6)]);

    let results = ts.run(&Query::new("S").project(["a"]));
    assert_eq!(results, vec![item("S", 1, "a", 5)]);
}

#[test]
fn limit_counts_split_results() {
    let ts = TestStore::new();
    ts.put_all(vec![
        item("S", 1, "a", list(&[1, 2, 3])),
        item("S", 2, "a", list(&[4, 5])),
    ]);
    let results = ts.run(&Query::new("S").project(["a"]).limit(4));
    assert_eq!(results.len(), 4);
}

#[test]
fn invalid_projections_are_rejected() {
    let ts = TestStore::new();
    let key = ts.db.run_query(&Query::new("S").project(["__key__"]));
    assert!(matches!(key, Err(Error::BadRequest(_))));

    let keys_only = ts.db.run_query(&Query::new("S").project(["a"]).keys_only());
    assert!(matches!(keys_only, Err(Error::BadRequest(_))));
}
