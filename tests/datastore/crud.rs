//! Put / Get / Delete Tests

use crate::common::*;

// ============================================================================
// Round trips
// ============================================================================

fn every_variant() -> Vec<(&'static str, Value)> {
    vec![
        ("null", Value::Null),
        ("flag", Value::Bool(true)),
        ("count", Value::Int(-42)),
        ("ratio", Value::Double(0.25)),
        ("infinite", Value::Double(f64::NEG_INFINITY)),
        ("name", Value::string("caf\u{e9}")),
        ("raw", Value::String(vec![0xff, 0x00, 0x7f])),
        ("marker", Value::string("#!bytes#1,2")),
        ("body", Value::text("a long text body")),
        ("data", Value::Blob(vec![0, 1, 2, 254, 255])),
        ("when", Value::Timestamp(Timestamp::from_micros(1_234_567_890_123_456))),
        ("where", Value::GeoPt(GeoPt::new(47.6, -122.3))),
        ("owner", Value::Key(Key::new("User", "alice").child("Device", 7))),
        ("nested", Value::EmbeddedEntity(vec![10, 20, 30])),
        ("upload", Value::BlobKey("blob-key-1".to_string())),
        (
            "author",
            Value::User(User::new("a@example.com").federated("id-1", "example.com")),
        ),
        (
            "tags",
            Value::List(vec![Value::string("x"), Value::string("y")]),
        ),
        ("empty", Value::List(vec![])),
        ("address.city", Value::string("Lyon")),
    ]
}

#[test]
fn every_value_variant_survives_put_and_get() {
    let ts = TestStore::new();
    let mut entity = Entity::new(Key::new("Everything", 1));
    for (name, value) in every_variant() {
        entity.set(name, value);
    }
    ts.put_all(vec![entity.clone()]);

    let got = ts.db.get(&[Key::new("Everything", 1)]).unwrap();
    assert_eq!(got, vec![Some(entity)]);
}

#[test]
fn deep_keys_survive_put_and_get() {
    let ts = TestStore::new();
    let mut key = Key::new("L0", "root/with-slash");
    let mut written = Vec::new();
    for depth in 1..5 {
        key = if depth % 2 == 0 {
            key.child(format!("L{}", depth), depth as i64)
        } else {
            key.child(format!("L{}", depth), format!("name-%{}", depth))
        };
        written.push(Entity::new(key.clone()).with("depth", depth as i64));
    }
    let keys = ts.put_all(written.clone());
    assert_eq!(keys, written.iter().map(|e| e.key().clone()).collect::<Vec<_>>());

    let got = ts.db.get(&keys).unwrap();
    assert_eq!(got.into_iter().flatten().collect::<Vec<_>>(), written);
}

// ============================================================================
// Put
// ============================================================================

#[test]
fn put_completes_incomplete_keys_in_order() {
    let ts = TestStore::new();
    let parent = Key::new("Album", 3);
    let keys = ts.put_all(vec![
        Entity::new(parent.incomplete_child("Photo")).with("n", 1),
        Entity::new(Key::new("Photo", "named")).with("n", 2),
        Entity::new(parent.incomplete_child("Photo")).with("n", 3),
    ]);

    assert_eq!(keys.len(), 3);
    assert!(keys.iter().all(Key::is_complete));
    assert_eq!(keys[0].parent(), Some(parent.clone()));
    assert_eq!(keys[1], Key::new("Photo", "named"));
    assert_ne!(keys[0], keys[2]);
}

#[test]
fn put_replaces_existing_entity() {
    let ts = TestStore::new();
    ts.put_all(vec![item("A", 1, "x", 1).with("y", 2)]);
    ts.put_all(vec![item("A", 1, "x", 3)]);

    let got = ts.db.get(&[Key::new("A", 1)]).unwrap();
    assert_eq!(got, vec![Some(item("A", 1, "x", 3))]);
    assert_eq!(ts.store.document_count("a"), 1);
}

#[test]
fn descendants_share_the_root_collection() {
    let ts = TestStore::new();
    ts.put_all(vec![
        Entity::new(Key::new("Book", 1)),
        Entity::new(Key::new("Book", 1).child("Chapter", 1)),
    ]);
    assert_eq!(ts.store.document_count("book"), 2);
    assert_eq!(ts.store.document_count("chapter"), 0);
}

#[test]
fn put_rejects_malformed_keys() {
    let ts = TestStore::new();
    let unassigned_parent = Key::incomplete("A").child("B", 1);
    let result = ts.db.put(&[Entity::new(unassigned_parent)]);
    assert!(matches!(result, Err(Error::MalformedKey(_))));

    let result = ts.db.put(&[Entity::new(Key::new("A", 0))]);
    assert!(matches!(result, Err(Error::MalformedKey(_))));
}

#[test]
fn put_rejects_malformed_key_values() {
    let ts = TestStore::new();
    ts.put_all(vec![item("A", 2, "ref", Key::new("B", 7))]);

    for bad in [Key::new("B", 0), Key::new("", 1), Key::incomplete("B")] {
        let result = ts.db.put(&[
            item("A", 1, "ref", bad.clone()),
            item("A", 3, "refs", vec![Value::Key(bad)]),
        ]);
        assert!(matches!(result, Err(Error::MalformedKey(_))));
    }

    let found = ts
        .db
        .get(&[Key::new("A", 1), Key::new("A", 2), Key::new("A", 3)])
        .unwrap();
    assert_eq!(found[0], None);
    assert_eq!(
        found[1].as_ref().and_then(|e| e.get("ref")),
        Some(&Value::Key(Key::new("B", 7)))
    );
    assert_eq!(found[2], None);
}

#[test]
fn put_rejects_reserved_property_names() {
    let ts = TestStore::new();
    for name in ["_id", "__key__", ""] {
        let result = ts.db.put(&[item("A", 1, name, 1)]);
        assert!(matches!(result, Err(Error::InvalidValue(_))), "{}", name);
    }
}

#[test]
fn failed_batch_writes_nothing() {
    let ts = TestStore::new();
    let nested = Value::List(vec![Value::List(vec![])]);
    let result = ts
        .db
        .put(&[item("A", 1, "ok", 1), item("A", 2, "bad", nested)]);
    assert!(matches!(result, Err(Error::InvalidValue(_))));
    assert_eq!(ts.db.get(&[Key::new("A", 1)]).unwrap(), vec![None]);
}

// ============================================================================
// Get / Delete
// ============================================================================

#[test]
fn get_preserves_input_order_with_gaps() {
    let ts = TestStore::new();
    ts.put_all(vec![item("A", 1, "v", 1), item("B", 2, "v", 2), item("A", 3, "v", 3)]);

    let got = ts
        .db
        .get(&[
            Key::new("A", 3),
            Key::new("C", 1),
            Key::new("B", 2),
            Key::new("A", 1),
            Key::new("A", 3),
        ])
        .unwrap();
    let values: Vec<Option<i64>> = got
        .iter()
        .map(|e| e.as_ref().and_then(|e| e.get("v")).and_then(Value::as_int))
        .collect();
    assert_eq!(values, vec![Some(3), None, Some(2), Some(1), Some(3)]);
}

#[test]
fn delete_removes_only_named_entities() {
    let ts = TestStore::new();
    let keys = ts.put_all(vec![
        item("A", 1, "v", 1),
        item("A", 2, "v", 2),
        Entity::new(Key::new("A", 1).child("B", 1)),
    ]);

    ts.db.delete(&[Key::new("A", 1), Key::new("Z", 9)]).unwrap();

    let got = ts.db.get(&keys).unwrap();
    assert!(got[0].is_none());
    assert!(got[1].is_some());
    assert!(got[2].is_some());
}

// ============================================================================
// Storage failures
// ============================================================================

#[test]
fn storage_failures_propagate() {
    let ts = TestStore::new();
    ts.put_all(vec![item("A", 1, "v", 1)]);
    ts.store.set_unavailable(true);

    let put = ts.db.put(&[item("A", 2, "v", 2)]);
    assert!(matches!(put, Err(Error::StorageUnavailable(_))));
    let get = ts.db.get(&[Key::new("A", 1)]);
    assert!(matches!(get, Err(Error::StorageUnavailable(_))));
    let query = ts.db.run_query(&Query::new("A"));
    assert!(matches!(query, Err(Error::StorageUnavailable(_))));
    let err = ts.db.clear().unwrap_err();
    assert_eq!(err.code(), ErrorCode::InternalError);

    ts.store.set_unavailable(false);
    assert!(ts.db.get(&[Key::new("A", 1)]).unwrap()[0].is_some());
}

#[test]
fn clear_drops_entities_and_schema() {
    let ts = TestStore::new();
    let keys = ts.put_all(vec![item("A", 1, "v", 1), item("B", 1, "v", 1)]);
    Clearable::clear(&ts.db).unwrap();

    assert_eq!(ts.db.get(&keys).unwrap(), vec![None, None]);
    assert!(ts.run(&Query::new("__kind__")).is_empty());
}
