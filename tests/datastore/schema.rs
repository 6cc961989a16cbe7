//! Schema Tracking Tests

use crate::common::*;

const SCHEMA: &str = "_schema";

#[test]
fn same_shape_twice_writes_schema_once() {
    let ts = TestStore::new();
    ts.put_all(vec![item("A", 1, "x", 1).with("y", "s")]);
    ts.put_all(vec![item("A", 2, "x", 2).with("y", "t")]);
    assert_eq!(ts.store.write_count(SCHEMA), 1);
}

#[test]
fn batch_of_same_shape_writes_schema_once() {
    let ts = TestStore::new();
    ts.put_all((1..=20).map(|i| item("A", i, "x", i)).collect());
    assert_eq!(ts.store.write_count(SCHEMA), 1);
}

#[test]
fn new_property_writes_again() {
    let ts = TestStore::new();
    ts.put_all(vec![item("A", 1, "x", 1)]);
    ts.put_all(vec![item("A", 2, "y", 1)]);
    assert_eq!(ts.store.write_count(SCHEMA), 2);

    let record = ts.db.schema().get("A").unwrap();
    assert_eq!(record.properties.len(), 2);
}

#[test]
fn newer_type_tag_wins() {
    let ts = TestStore::new();
    ts.put_all(vec![item("A", 1, "x", 1)]);
    assert_eq!(ts.db.schema().get_type("A", "x").unwrap(), "int");
    ts.put_all(vec![item("A", 1, "x", Value::text("now text"))]);
    assert_eq!(ts.db.schema().get_type("A", "x").unwrap(), "text");
}

#[test]
fn list_tags_carry_element_type() {
    let ts = TestStore::new();
    ts.put_all(vec![item(
        "A",
        1,
        "tags",
        vec![Value::string("a"), Value::string("b")],
    )]);
    assert_eq!(ts.db.schema().get_type("A", "tags").unwrap(), "list:string");
}

#[test]
fn unknown_kind_or_property_is_not_found() {
    let ts = TestStore::new();
    ts.put_all(vec![item("A", 1, "x", 1)]);
    let err = ts.db.schema().get_type("B", "x").unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert!(ts.db.schema().get_type("A", "nope").is_err());
}

#[test]
fn schema_survives_reopen() {
    let ts = TestStore::new();
    ts.put_all(vec![
        item("A", 1, "x", 1),
        Entity::new(Key::new("P", 1).child("B", 1)).with("z", 1.5),
    ]);

    let reopened = Datastore::open(ts.store.clone(), DatastoreConfig::new("integration")).unwrap();
    assert_eq!(
        reopened.schema().get_kinds(),
        vec!["A".to_string(), "B".to_string()]
    );
    assert_eq!(reopened.schema().get_type("B", "z").unwrap(), "float");
    assert_eq!(reopened.schema().get("B").unwrap().collection, "p");

    let results = {
        let started = reopened.run_query(&Query::new("B")).unwrap();
        reopened.next(started.cursor_id, 10).unwrap().entities
    };
    assert_eq!(results.len(), 1);
}

#[test]
fn failed_schema_write_never_hides_entities() {
    let ts = TestStore::new();
    ts.store.reject_writes(SCHEMA, true);
    let child = Key::new("Shop", 1).child("Item", 2);
    let put = ts.db.put(&[Entity::new(child.clone()).with("x", 1)]);
    assert_eq!(put.unwrap_err().code(), ErrorCode::InternalError);
    assert!(ts.db.get(&[child.clone()]).unwrap()[0].is_some());

    let reopened = Datastore::open(ts.store.clone(), DatastoreConfig::new("integration")).unwrap();
    assert!(reopened.schema().get_kinds().is_empty());
    ts.store.reject_writes(SCHEMA, false);
    reopened.put(&[item("Item", 7, "x", 2)]).unwrap();

    let results = {
        let started = reopened.run_query(&Query::new("Item")).unwrap();
        reopened.next(started.cursor_id, 10).unwrap().entities
    };
    assert_eq!(keys(&results), vec![Key::new("Item", 7), child]);
}

#[test]
fn concurrent_puts_of_one_kind_keep_every_property() {
    let ts = TestStore::new();
    let db = std::sync::Arc::new(ts.db);
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let db = std::sync::Arc::clone(&db);
            std::thread::spawn(move || {
                for i in 0..20 {
                    let id = t * 100 + i + 1;
                    db.put(&[item("C", id, &format!("p{}", id), 1)]).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(db.schema().get("C").unwrap().properties.len(), 80);
    let reopened = Datastore::open(ts.store.clone(), DatastoreConfig::new("integration")).unwrap();
    assert_eq!(reopened.schema().get("C"), db.schema().get("C"));
}

#[test]
fn schema_collection_is_configurable() {
    let mut config = DatastoreConfig::new("integration");
    config.schema_collection = "_meta".to_string();
    let ts = TestStore::with_config(config);
    ts.put_all(vec![item("A", 1, "x", 1)]);
    assert_eq!(ts.store.write_count("_meta"), 1);
    assert_eq!(ts.store.write_count(SCHEMA), 0);
}
