// 스트리밍 수명 주기 통합 테스트
//
// 공개 API만 사용: facade → stream → consumer, 그리고 각 종료 경로에서
// 커서/스테이트먼트/커넥션이 정확히 한 번 닫히는지 확인

use fsql_core::backend::memory::{Fault, MemoryDatabase, ResultTable};
use fsql_core::{
    FsqlError, FsqlResult, FunctionalSql, NamedParams, RowCursor, RowExt, SqlConsumer,
    SqlPredicate, SqlValue, StatementOptions,
};
use parking_lot::Mutex;
use std::cell::RefCell;
use std::sync::Arc;

fn orders(n: i64) -> MemoryDatabase {
    let db = MemoryDatabase::new();
    let mut table = ResultTable::new(["id", "customer", "total"]);
    for i in 1..=n {
        table = table.row([
            SqlValue::Int64(i),
            SqlValue::Utf8(format!("c{}", i % 3)),
            SqlValue::Float64(i as f64 * 10.0),
        ]);
    }
    db.register_query("SELECT id, customer, total FROM orders", table.clone());
    db.register_query(
        "SELECT id, customer, total FROM orders WHERE customer = ? OR customer = ?",
        table,
    );
    db
}

#[test]
fn test_stream_filter_and_consume() -> FsqlResult<()> {
    let db = orders(10);
    let fsql = FunctionalSql::new(db.clone());

    let big = |total: &f64| -> FsqlResult<bool> { Ok(*total >= 50.0) };
    let seen = RefCell::new(Vec::new());
    let record = |total: &f64| -> FsqlResult<()> {
        seen.borrow_mut().push(*total);
        Ok(())
    };

    for total in fsql.stream(fsql.query("SELECT id, customer, total FROM orders"), |row| {
        row.get_f64(2)
    })? {
        let total = total?;
        if big.test(&total)? {
            record.accept(&total)?;
        }
    }

    assert_eq!(seen.borrow().len(), 6);
    assert!(db.stats().all_released());
    Ok(())
}

#[test]
fn test_early_termination_releases_everything() -> FsqlResult<()> {
    let db = orders(100);
    let fsql = FunctionalSql::new(db.clone());

    let first_three: Vec<i64> = fsql
        .stream(fsql.query("SELECT id, customer, total FROM orders"), |row| {
            row.get_i64(0)
        })?
        .take(3)
        .collect::<FsqlResult<_>>()?;

    assert_eq!(first_three, vec![1, 2, 3]);
    let stats = db.stats();
    assert!(stats.all_released());
    assert_eq!(stats.redundant_closes, 0);
    // 3 rows pulled, nothing beyond the fourth peek
    assert!(stats.advance_calls <= 4);
    Ok(())
}

#[test]
fn test_close_hook_runs_after_release() -> FsqlResult<()> {
    let db = orders(2);
    let fsql = FunctionalSql::new(db.clone());
    let observed = Arc::new(Mutex::new(None));
    let released = Arc::clone(&observed);
    let db_handle = db.clone();

    let stream = fsql
        .stream(fsql.query("SELECT id, customer, total FROM orders"), |row| {
            row.get_i64(0)
        })?
        .on_close(move || {
            *released.lock() = Some(db_handle.stats().all_released());
            Ok(())
        });
    drop(stream);

    assert_eq!(*observed.lock(), Some(true));
    Ok(())
}

#[test]
fn test_consumer_failure_stops_and_releases() {
    let db = orders(5);
    let fsql = FunctionalSql::new(db.clone());
    let count = RefCell::new(0);
    let consumer = |id: &i64| -> FsqlResult<()> {
        *count.borrow_mut() += 1;
        if *id == 2 {
            return Err(FsqlError::sql("consumer rejected row"));
        }
        Ok(())
    };

    let result = fsql
        .stream(fsql.query("SELECT id, customer, total FROM orders"), |row| {
            row.get_i64(0)
        })
        .unwrap()
        .consume(&consumer);

    assert!(result.is_err());
    assert_eq!(*count.borrow(), 2);
    assert!(db.stats().all_released());
}

#[test]
fn test_mid_stream_advance_failure() {
    fsql_core::logging::init_test();
    let db = orders(5);
    db.inject(Fault::Advance { row: 4 });
    let fsql = FunctionalSql::new(db.clone());

    let results: Vec<FsqlResult<i64>> = fsql
        .stream(fsql.query("SELECT id, customer, total FROM orders"), |row| {
            row.get_i64(0)
        })
        .unwrap()
        .collect();

    assert_eq!(results.len(), 4);
    assert!(results[..3].iter().all(Result::is_ok));
    assert!(results[3].as_ref().unwrap_err().is_data_access());
    assert!(db.stats().all_released());
}

#[test]
fn test_named_parameters_bind_every_occurrence() -> FsqlResult<()> {
    let db = orders(3);
    let fsql = FunctionalSql::new(db.clone());

    let mut params = NamedParams::new();
    params.insert("who".to_string(), SqlValue::Utf8("c1".into()));
    params.insert("ignored".to_string(), SqlValue::Int64(0));

    let supplier = fsql.named_parameter_query(
        "SELECT id, customer, total FROM orders WHERE customer = :who OR customer = :who",
        params,
    )?;
    let ids = fsql
        .stream(supplier, |row| row.get_i64(0))?
        .collect_rows()?;
    assert_eq!(ids.len(), 3);

    let executions = db.executions();
    assert_eq!(
        executions[0].params,
        vec![SqlValue::Utf8("c1".into()), SqlValue::Utf8("c1".into())]
    );
    assert!(db.stats().all_released());
    Ok(())
}

#[test]
fn test_row_function_sees_read_only_view() -> FsqlResult<()> {
    let db = orders(2);
    let fsql = FunctionalSql::new(db.clone());

    let rows = fsql
        .stream(fsql.query("SELECT id, customer, total FROM orders"), |row| {
            let label: String = row.get_by_label("CUSTOMER")?;
            Ok((row.row_number(), label))
        })?
        .collect_rows()?;

    assert_eq!(rows, vec![(1, "c1".to_string()), (2, "c2".to_string())]);
    Ok(())
}

#[test]
fn test_facade_options_reach_every_statement() -> FsqlResult<()> {
    let db = orders(10);
    let fsql =
        FunctionalSql::new(db.clone()).with_options(StatementOptions::new().with_max_rows(4));

    let count = fsql
        .stream(fsql.query("SELECT id, customer, total FROM orders"), |row| {
            row.get_i64(0)
        })?
        .count();
    assert_eq!(count, 4);
    assert_eq!(db.executions()[0].options.max_rows, Some(4));
    Ok(())
}
