//! Lifecycle tests for the lazy row iterator
//!
//! Every path out of the iterator must close cursor, statement and
//! connection exactly once; the scripted driver counts each close.

use crate::backend::memory::{Fault, MemoryConnection, MemoryCursor, MemoryDatabase, ResultTable};
use crate::driver::{ReadOnlyRow, RowCursor, RowExt};
use crate::engine::{FunctionalSql, RowIterator};
use crate::error::{FsqlError, FsqlResult};
use crate::value::SqlValue;
use proptest::prelude::*;

type RowFn = fn(&ReadOnlyRow<'_, MemoryCursor>) -> FsqlResult<i64>;
type NumberIter = RowIterator<MemoryConnection, RowFn, i64>;

const NUMBERS: &str = "SELECT n FROM numbers";

fn numbers(n: i64) -> MemoryDatabase {
    let db = MemoryDatabase::new();
    let mut table = ResultTable::new(["n"]);
    for i in 1..=n {
        table = table.row([SqlValue::Int64(i)]);
    }
    db.register_query(NUMBERS, table);
    db
}

fn read_n(row: &ReadOnlyRow<'_, MemoryCursor>) -> FsqlResult<i64> {
    row.get_i64(0)
}

fn fail_on_three(row: &ReadOnlyRow<'_, MemoryCursor>) -> FsqlResult<i64> {
    let n = row.get_i64(0)?;
    if n == 3 {
        return Err(FsqlError::sql("row three rejected"));
    }
    Ok(n)
}

// row function trying to move the cursor itself
fn skip_ahead(row: &ReadOnlyRow<'_, MemoryCursor>) -> FsqlResult<i64> {
    let mut view = ReadOnlyRow::new(row);
    view.advance()?;
    row.get_i64(0)
}

fn open(db: &MemoryDatabase) -> NumberIter {
    open_with(db, read_n)
}

fn open_with(db: &MemoryDatabase, row_fn: RowFn) -> NumberIter {
    let fsql = FunctionalSql::new(db.clone());
    RowIterator::new(&fsql.query(NUMBERS), row_fn).unwrap()
}

#[test]
fn test_yields_every_row_then_end_of_sequence() {
    let db = numbers(3);
    let mut rows = open(&db);

    assert_eq!(rows.pull().unwrap(), 1);
    assert_eq!(rows.pull().unwrap(), 2);
    assert_eq!(rows.pull().unwrap(), 3);
    assert!(!db.stats().all_released());

    assert!(matches!(rows.pull(), Err(FsqlError::EndOfSequence)));
    assert!(rows.is_finished());
    assert!(!rows.is_closed());

    let stats = db.stats();
    assert!(stats.all_released());
    assert_eq!(stats.redundant_closes, 0);
}

#[test]
fn test_has_more_advances_once_per_row() {
    let db = numbers(2);
    let mut rows = open(&db);

    assert!(rows.has_more().unwrap());
    assert!(rows.has_more().unwrap());
    assert!(rows.has_more().unwrap());
    assert_eq!(db.stats().advance_calls, 1);

    assert_eq!(rows.pull().unwrap(), 1);
    assert_eq!(db.stats().advance_calls, 1);
    assert_eq!(rows.pull().unwrap(), 2);
    assert_eq!(db.stats().advance_calls, 2);
}

#[test]
fn test_empty_result_releases_on_first_peek() {
    let db = numbers(0);
    let mut rows = open(&db);

    assert!(!db.stats().all_released());
    assert!(!rows.has_more().unwrap());
    assert!(db.stats().all_released());
    assert!(rows.next().is_none());
}

#[test]
fn test_iterator_collects_in_cursor_order() {
    let db = numbers(5);
    let values: Vec<i64> = open(&db).collect::<FsqlResult<_>>().unwrap();
    assert_eq!(values, vec![1, 2, 3, 4, 5]);
    assert!(db.stats().all_released());
}

#[test]
fn test_fused_after_exhaustion() {
    let db = numbers(1);
    let mut rows = open(&db);
    assert_eq!(rows.next().unwrap().unwrap(), 1);
    assert!(rows.next().is_none());
    let advances = db.stats().advance_calls;
    assert!(rows.next().is_none());
    assert!(!rows.has_more().unwrap());
    assert_eq!(db.stats().advance_calls, advances);
}

#[test]
fn test_early_close_releases_and_ends() {
    let db = numbers(5);
    let mut rows = open(&db);

    assert_eq!(rows.pull().unwrap(), 1);
    rows.close();
    assert!(rows.is_closed());
    assert!(db.stats().all_released());

    assert!(!rows.has_more().unwrap());
    assert!(matches!(rows.pull(), Err(FsqlError::EndOfSequence)));

    // 반복 close는 no-op
    rows.close();
    assert_eq!(db.stats().redundant_closes, 0);
}

#[test]
fn test_close_after_exhaustion_is_noop() {
    let db = numbers(1);
    let mut rows = open(&db);
    while rows.next().is_some() {}
    rows.close();
    let stats = db.stats();
    assert!(stats.all_released());
    assert_eq!(stats.redundant_closes, 0);
}

#[test]
fn test_drop_releases() {
    let db = numbers(3);
    {
        let mut rows = open(&db);
        assert_eq!(rows.pull().unwrap(), 1);
    }
    assert!(db.stats().all_released());
}

#[test]
fn test_row_function_failure_closes_and_wraps() {
    let db = numbers(5);
    let mut rows = open_with(&db, fail_on_three);

    assert_eq!(rows.next().unwrap().unwrap(), 1);
    assert_eq!(rows.next().unwrap().unwrap(), 2);

    let err = rows.next().unwrap().unwrap_err();
    assert!(err.is_data_access());
    assert!(err.to_string().contains("row three rejected"));
    assert!(matches!(err.root_cause(), FsqlError::Sql { .. }));

    assert!(rows.is_closed());
    assert!(db.stats().all_released());
    assert!(rows.next().is_none());
}

#[test]
fn test_read_only_rejection_is_not_wrapped() {
    let db = numbers(3);
    let mut rows = open_with(&db, skip_ahead);

    let err = rows.next().unwrap().unwrap_err();
    assert!(err.is_unsupported());
    assert!(!err.is_data_access());
    assert!(matches!(err, FsqlError::Unsupported { operation: "advance" }));

    assert!(rows.is_closed());
    let stats = db.stats();
    assert!(stats.all_released());
    assert_eq!(stats.advance_calls, 1);
    assert!(rows.next().is_none());
}

#[test]
fn test_advance_failure_closes_and_wraps() {
    let db = numbers(3);
    db.inject(Fault::Advance { row: 2 });
    let mut rows = open(&db);

    assert_eq!(rows.next().unwrap().unwrap(), 1);
    let err = rows.next().unwrap().unwrap_err();
    assert!(err.is_data_access());
    assert!(rows.is_closed());
    assert!(db.stats().all_released());
    assert!(rows.next().is_none());
}

#[test]
fn test_creation_failure_surfaces_synchronously() {
    let db = numbers(3);
    db.inject(Fault::Execute);
    let fsql = FunctionalSql::new(db.clone());
    let result = RowIterator::<MemoryConnection, _, i64>::new(&fsql.query(NUMBERS), read_n);

    let err = result.err().unwrap();
    assert!(matches!(err, FsqlError::Sql { .. }));
    let stats = db.stats();
    assert_eq!(stats.cursors_opened, 0);
    assert!(stats.all_released());
}

#[test]
fn test_cleanup_failure_is_not_raised() {
    let db = numbers(2);
    db.inject(Fault::CloseCursor);
    db.inject(Fault::CloseStatement);
    let values: Vec<i64> = open(&db).collect::<FsqlResult<_>>().unwrap();
    assert_eq!(values, vec![1, 2]);
    // 실패한 close도 한 번 호출된 것으로 집계
    assert!(db.stats().all_released());
}

#[test]
fn test_metadata_is_available_before_first_row() {
    let db = numbers(1);
    let rows = open(&db);
    assert_eq!(rows.metadata().column_count(), 1);
    assert_eq!(rows.metadata().column_name(0).unwrap(), "n");
}

proptest! {
    #[test]
    fn prop_rows_arrive_in_order(n in 0i64..40) {
        let db = numbers(n);
        let values: Vec<i64> = open(&db).collect::<FsqlResult<_>>().unwrap();
        prop_assert_eq!(values, (1..=n).collect::<Vec<_>>());
        prop_assert!(db.stats().all_released());
    }

    #[test]
    fn prop_any_stopping_point_releases_once(n in 0i64..30, take in 0usize..40) {
        let db = numbers(n);
        let mut rows = open(&db);
        let taken: Vec<i64> = rows.by_ref().take(take).map(|r| r.unwrap()).collect();
        prop_assert_eq!(taken.len(), take.min(n as usize));
        rows.close();
        drop(rows);

        let stats = db.stats();
        prop_assert!(stats.all_released());
        prop_assert_eq!(stats.redundant_closes, 0);
        prop_assert_eq!(stats.cursors_closed, 1);
    }

    #[test]
    fn prop_peeks_never_skip_rows(n in 1i64..20, peeks in 1usize..5) {
        let db = numbers(n);
        let mut rows = open(&db);
        let mut seen = Vec::new();
        loop {
            for _ in 0..peeks {
                rows.has_more().unwrap();
            }
            match rows.pull() {
                Ok(v) => seen.push(v),
                Err(FsqlError::EndOfSequence) => break,
                Err(e) => return Err(TestCaseError::fail(e.to_string())),
            }
        }
        prop_assert_eq!(seen, (1..=n).collect::<Vec<_>>());
    }
}
