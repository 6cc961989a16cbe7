//! Cursor Table Tests

use crate::common::*;

fn seeded(count: i64) -> TestStore {
    let ts = TestStore::with_small_limits();
    ts.put_all((1..=count).map(|i| item("C", i, "n", i)).collect());
    ts
}

#[test]
fn batches_are_clamped_to_max_batch_size() {
    let ts = seeded(7);
    let started = ts.db.run_query(&Query::new("C")).unwrap();

    let first = ts.db.next(started.cursor_id, 100).unwrap();
    assert_eq!(first.entities.len(), 3);
    assert!(first.more_results);
    let second = ts.db.next(started.cursor_id, 100).unwrap();
    assert_eq!(second.entities.len(), 3);
    assert!(second.more_results);
    let third = ts.db.next(started.cursor_id, 100).unwrap();
    assert_eq!(ints(&third.entities, "n"), vec![7]);
    assert!(!third.more_results);
}

#[test]
fn zero_count_fetches_one() {
    let ts = seeded(2);
    let started = ts.db.run_query(&Query::new("C")).unwrap();
    let batch = ts.db.next(started.cursor_id, 0).unwrap();
    assert_eq!(batch.entities.len(), 1);
    assert!(batch.more_results);
}

#[test]
fn exact_multiple_ends_with_empty_batch() {
    let ts = seeded(3);
    let started = ts.db.run_query(&Query::new("C")).unwrap();
    let first = ts.db.next(started.cursor_id, 3).unwrap();
    assert!(first.more_results);
    let last = ts.db.next(started.cursor_id, 3).unwrap();
    assert!(last.entities.is_empty());
    assert!(!last.more_results);
}

#[test]
fn unknown_cursor_is_a_bad_request() {
    let ts = seeded(1);
    let err = ts.db.next(424242, 10).unwrap_err();
    assert!(matches!(err, Error::CursorNotFound(424242)));
    assert_eq!(err.code(), ErrorCode::BadRequest);
}

#[test]
fn exhausted_and_discarded_cursors_are_gone() {
    let ts = seeded(1);
    let exhausted = ts.db.run_query(&Query::new("C")).unwrap().cursor_id;
    assert!(!ts.db.next(exhausted, 10).unwrap().more_results);
    assert!(matches!(
        ts.db.next(exhausted, 10),
        Err(Error::CursorNotFound(_))
    ));

    let abandoned = ts.db.run_query(&Query::new("C")).unwrap().cursor_id;
    assert!(ts.db.discard(abandoned));
    assert!(ts.db.next(abandoned, 10).is_err());
    assert_eq!(ts.db.open_cursors(), 0);
}

#[test]
fn cursors_are_independent() {
    let ts = seeded(4);
    let a = ts.db.run_query(&Query::new("C")).unwrap().cursor_id;
    let b = ts.db.run_query(&Query::new("C").offset(2)).unwrap().cursor_id;

    assert_eq!(ints(&ts.db.next(a, 2).unwrap().entities, "n"), vec![1, 2]);
    assert_eq!(ints(&ts.db.next(b, 2).unwrap().entities, "n"), vec![3, 4]);
    assert_eq!(ints(&ts.db.next(a, 2).unwrap().entities, "n"), vec![3, 4]);
}

#[test]
fn cursor_ids_are_unique_across_threads() {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    let ts = Arc::new(seeded(1));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ts = Arc::clone(&ts);
            thread::spawn(move || {
                (0..50)
                    .map(|_| ts.db.run_query(&Query::new("C")).unwrap().cursor_id)
                    .collect::<Vec<u64>>()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(ids.insert(id));
        }
    }
    assert_eq!(ids.len(), 400);
    assert_eq!(ts.db.open_cursors(), 400);
}
