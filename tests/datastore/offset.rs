//! Offset Emulation Tests
//!
//! Offsets are applied by the cursor. The reported skip count is capped at
//! `max_query_offset` (5 with small limits) while discarding continues.

use crate::common::*;

fn numbered(ts: &TestStore, count: i64) {
    ts.put_all((1..=count).map(|i| item("N", i, "n", i)).collect());
}

fn ordered() -> Query {
    Query::new("N").order("n", Direction::Ascending)
}

#[test]
fn offset_below_count_skips_exactly() {
    let ts = TestStore::new();
    numbered(&ts, 3);

    let (skipped, results) = ts.run_with_skip(&ordered().offset(1));
    assert_eq!(skipped, 1);
    assert_eq!(ints(&results, "n"), vec![2, 3]);

    let (skipped, results) = ts.run_with_skip(&ordered().offset(2));
    assert_eq!(skipped, 2);
    assert_eq!(ints(&results, "n"), vec![3]);
}

#[test]
fn offset_equal_to_count_returns_nothing() {
    let ts = TestStore::new();
    numbered(&ts, 3);
    let (skipped, results) = ts.run_with_skip(&ordered().offset(3));
    assert_eq!(skipped, 3);
    assert!(results.is_empty());
}

#[test]
fn offset_beyond_count_reports_count() {
    let ts = TestStore::new();
    numbered(&ts, 3);
    let (skipped, results) = ts.run_with_skip(&ordered().offset(50));
    assert_eq!(skipped, 3);
    assert!(results.is_empty());
}

#[test]
fn offset_at_cap_returns_remainder() {
    let ts = TestStore::with_small_limits();
    numbered(&ts, 15);
    let (skipped, results) = ts.run_with_skip(&ordered().offset(5));
    assert_eq!(skipped, 5);
    assert_eq!(ints(&results, "n"), (6..=15).collect::<Vec<i64>>());
}

#[test]
fn reported_skip_is_capped() {
    let ts = TestStore::with_small_limits();
    numbered(&ts, 15);
    let (skipped, results) = ts.run_with_skip(&ordered().offset(7));
    assert_eq!(skipped, 5);
    assert_eq!(results.len(), 8);
}

#[test]
fn offset_beyond_cap_and_count_returns_nothing() {
    let ts = TestStore::with_small_limits();
    numbered(&ts, 15);
    let (skipped, results) = ts.run_with_skip(&ordered().offset(105));
    assert_eq!(skipped, 5);
    assert!(results.is_empty());
}

#[test]
fn offset_and_limit_combine() {
    let ts = TestStore::new();
    numbered(&ts, 10);
    let (skipped, results) = ts.run_with_skip(&ordered().offset(4).limit(3));
    assert_eq!(skipped, 4);
    assert_eq!(ints(&results, "n"), vec![5, 6, 7]);
}

#[test]
fn offset_counts_split_results() {
    let ts = TestStore::new();
    ts.put_all(vec![item(
        "S",
        1,
        "a",
        vec![Value::Int(1), Value::Int(2), Value::Int(3)],
    )]);
    let (skipped, results) = ts.run_with_skip(&Query::new("S").project(["a"]).offset(2));
    assert_eq!(skipped, 2);
    assert_eq!(results.len(), 1);
}
