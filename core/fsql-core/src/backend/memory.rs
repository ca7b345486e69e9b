//! In-memory scripted driver
//!
//! Results are registered by SQL text ahead of time; every connection,
//! statement and cursor handed out reports back to the shared
//! [`MemoryDatabase`], which counts opens and closes and can be told to fail
//! at a chosen point ([`Fault`]). It backs the lifecycle tests and is handy
//! for exercising row functions without a real database.

use crate::api::functional::SqlSupplier;
use crate::config::StatementOptions;
use crate::driver::{Closeable, Connection, ResultMetadata, RowCursor, Statement};
use crate::error::{FsqlError, FsqlResult};
use crate::value::SqlValue;
use parking_lot::Mutex;
use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Point at which the driver fails on purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    Connect,
    CreateStatement,
    Prepare,
    Execute,
    /// Advancing onto the given 1-based row
    Advance { row: u64 },
    CloseCursor,
    CloseStatement,
    CloseConnection,
}

/// Resource accounting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceStats {
    pub connections_opened: u64,
    pub connections_closed: u64,
    pub statements_opened: u64,
    pub statements_closed: u64,
    pub cursors_opened: u64,
    pub cursors_closed: u64,
    /// `close` calls on resources that were already closed
    pub redundant_closes: u64,
    pub advance_calls: u64,
}

impl ResourceStats {
    /// Resources opened but never closed.
    pub fn open_resources(&self) -> u64 {
        (self.connections_opened - self.connections_closed)
            + (self.statements_opened - self.statements_closed)
            + (self.cursors_opened - self.cursors_closed)
    }

    pub fn all_released(&self) -> bool {
        self.open_resources() == 0
    }
}

/// One executed statement, as the driver saw it
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub sql: String,
    pub params: Vec<SqlValue>,
    pub options: StatementOptions,
}

/// Rows served for a registered query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    metadata: ResultMetadata,
    rows: Vec<Vec<SqlValue>>,
}

impl ResultTable {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            metadata: ResultMetadata::from_names(columns),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, values: impl IntoIterator<Item = SqlValue>) -> Self {
        self.rows.push(values.into_iter().collect());
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    queries: HashMap<String, ResultTable>,
    updates: HashMap<String, u64>,
    faults: HashSet<Fault>,
    stats: ResourceStats,
    executions: Vec<Execution>,
}

/// Shared handle to the scripted database
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
}

fn normalize(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `table` for queries whose text equals `sql` (whitespace
    /// insensitive).
    pub fn register_query(&self, sql: &str, table: ResultTable) {
        self.state.lock().queries.insert(normalize(sql), table);
    }

    /// Report `affected` rows for updates whose text equals `sql`.
    pub fn register_update(&self, sql: &str, affected: u64) {
        self.state.lock().updates.insert(normalize(sql), affected);
    }

    pub fn inject(&self, fault: Fault) {
        self.state.lock().faults.insert(fault);
    }

    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    pub fn stats(&self) -> ResourceStats {
        self.state.lock().stats
    }

    pub fn executions(&self) -> Vec<Execution> {
        self.state.lock().executions.clone()
    }

    /// Open a connection (the connection-provider operation).
    pub fn connect(&self) -> FsqlResult<MemoryConnection> {
        self.check(Fault::Connect, "connect")?;
        self.state.lock().stats.connections_opened += 1;
        Ok(MemoryConnection {
            db: self.clone(),
            closed: false,
        })
    }

    fn check(&self, fault: Fault, what: &str) -> FsqlResult<()> {
        if self.state.lock().faults.contains(&fault) {
            return Err(FsqlError::sql(format!("injected failure: {what}")));
        }
        Ok(())
    }

    fn record(&self, sql: &str, params: &[SqlValue], options: &StatementOptions) {
        self.state.lock().executions.push(Execution {
            sql: normalize(sql),
            params: params.to_vec(),
            options: options.clone(),
        });
    }

    fn stats_mut(&self, update: impl FnOnce(&mut ResourceStats)) {
        update(&mut self.state.lock().stats);
    }

    fn close_resource(
        &self,
        closed: &mut bool,
        fault: Fault,
        what: &str,
        count: impl FnOnce(&mut ResourceStats),
    ) -> FsqlResult<()> {
        if *closed {
            self.stats_mut(|s| s.redundant_closes += 1);
            return Ok(());
        }
        *closed = true;
        self.stats_mut(count);
        self.check(fault, what)
    }
}

/// The database is its own connection provider.
impl SqlSupplier<MemoryConnection> for MemoryDatabase {
    fn get(&self) -> FsqlResult<MemoryConnection> {
        self.connect()
    }
}

pub struct MemoryConnection {
    db: MemoryDatabase,
    closed: bool,
}

impl MemoryConnection {
    fn ensure_open(&self) -> FsqlResult<()> {
        if self.closed {
            return Err(FsqlError::sql("connection is closed"));
        }
        Ok(())
    }
}

impl Closeable for MemoryConnection {
    fn close(&mut self) -> FsqlResult<()> {
        self.db.close_resource(
            &mut self.closed,
            Fault::CloseConnection,
            "close connection",
            |s| s.connections_closed += 1,
        )
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Connection for MemoryConnection {
    type Statement = MemoryStatement;

    fn create_statement(&mut self, options: &StatementOptions) -> FsqlResult<MemoryStatement> {
        self.ensure_open()?;
        self.db.check(Fault::CreateStatement, "create statement")?;
        self.db.stats_mut(|s| s.statements_opened += 1);
        Ok(MemoryStatement {
            db: self.db.clone(),
            sql: None,
            params: Vec::new(),
            options: options.clone(),
            closed: false,
        })
    }

    fn prepare_statement(
        &mut self,
        sql: &str,
        options: &StatementOptions,
    ) -> FsqlResult<MemoryStatement> {
        self.ensure_open()?;
        self.db.check(Fault::Prepare, "prepare statement")?;
        self.db.stats_mut(|s| s.statements_opened += 1);
        let placeholders = sql.matches('?').count();
        Ok(MemoryStatement {
            db: self.db.clone(),
            sql: Some(sql.to_string()),
            params: vec![SqlValue::Null; placeholders],
            options: options.clone(),
            closed: false,
        })
    }
}

pub struct MemoryStatement {
    db: MemoryDatabase,
    sql: Option<String>,
    params: Vec<SqlValue>,
    options: StatementOptions,
    closed: bool,
}

impl MemoryStatement {
    /// Values currently bound, by position.
    pub fn bound_params(&self) -> &[SqlValue] {
        &self.params
    }

    fn ensure_open(&self) -> FsqlResult<()> {
        if self.closed {
            return Err(FsqlError::sql("statement is closed"));
        }
        Ok(())
    }

    fn prepared_sql(&self) -> FsqlResult<String> {
        self.sql.clone().ok_or_else(|| FsqlError::InvalidOperation {
            message: "statement was not prepared".to_string(),
            context: "MemoryStatement".to_string(),
        })
    }

    fn run_query(&self, sql: &str, params: &[SqlValue]) -> FsqlResult<MemoryCursor> {
        self.ensure_open()?;
        self.db.check(Fault::Execute, "execute query")?;
        self.db.record(sql, params, &self.options);

        let table = self
            .db
            .state
            .lock()
            .queries
            .get(&normalize(sql))
            .cloned()
            .ok_or_else(|| FsqlError::sql(format!("no result registered for '{sql}'")))?;

        self.db.stats_mut(|s| s.cursors_opened += 1);
        Ok(MemoryCursor {
            db: self.db.clone(),
            metadata: table.metadata,
            rows: table.rows,
            position: 0,
            exhausted: false,
            closed: false,
            was_null: Cell::new(false),
            max_rows: self.options.max_rows,
        })
    }
}

impl Closeable for MemoryStatement {
    fn close(&mut self) -> FsqlResult<()> {
        self.db.close_resource(
            &mut self.closed,
            Fault::CloseStatement,
            "close statement",
            |s| s.statements_closed += 1,
        )
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Statement for MemoryStatement {
    type Cursor = MemoryCursor;

    fn bind(&mut self, position: usize, value: SqlValue) -> FsqlResult<()> {
        self.ensure_open()?;
        if position == 0 || position > self.params.len() {
            return Err(FsqlError::ParameterIndexOutOfRange {
                index: position,
                count: self.params.len(),
            });
        }
        self.params[position - 1] = value;
        Ok(())
    }

    fn clear_parameters(&mut self) -> FsqlResult<()> {
        self.ensure_open()?;
        self.params.fill(SqlValue::Null);
        Ok(())
    }

    fn parameter_count(&self) -> usize {
        self.params.len()
    }

    fn query(&mut self) -> FsqlResult<MemoryCursor> {
        let sql = self.prepared_sql()?;
        self.run_query(&sql, &self.params)
    }

    fn query_sql(&mut self, sql: &str) -> FsqlResult<MemoryCursor> {
        self.run_query(sql, &[])
    }

    fn execute(&mut self, sql: &str) -> FsqlResult<bool> {
        self.ensure_open()?;
        self.db.check(Fault::Execute, "execute")?;
        self.db.record(sql, &[], &self.options);
        let key = normalize(sql);
        let state = self.db.state.lock();
        if state.queries.contains_key(&key) {
            Ok(true)
        } else if state.updates.contains_key(&key) {
            Ok(false)
        } else {
            Err(FsqlError::sql(format!("nothing registered for '{sql}'")))
        }
    }

    fn execute_update(&mut self) -> FsqlResult<u64> {
        self.ensure_open()?;
        let sql = self.prepared_sql()?;
        self.db.check(Fault::Execute, "execute update")?;
        self.db.record(&sql, &self.params, &self.options);
        self.db
            .state
            .lock()
            .updates
            .get(&normalize(&sql))
            .copied()
            .ok_or_else(|| FsqlError::sql(format!("no update registered for '{sql}'")))
    }
}

pub struct MemoryCursor {
    db: MemoryDatabase,
    metadata: ResultMetadata,
    rows: Vec<Vec<SqlValue>>,
    /// 0 = before first, n = on row n
    position: usize,
    exhausted: bool,
    closed: bool,
    was_null: Cell<bool>,
    max_rows: Option<u64>,
}

impl MemoryCursor {
    fn visible_rows(&self) -> usize {
        match self.max_rows {
            Some(max) => self.rows.len().min(usize::try_from(max).unwrap_or(usize::MAX)),
            None => self.rows.len(),
        }
    }

    fn on_row(&self) -> bool {
        !self.exhausted && self.position > 0
    }
}

impl Closeable for MemoryCursor {
    fn close(&mut self) -> FsqlResult<()> {
        self.db.close_resource(
            &mut self.closed,
            Fault::CloseCursor,
            "close cursor",
            |s| s.cursors_closed += 1,
        )
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl RowCursor for MemoryCursor {
    fn metadata(&self) -> &ResultMetadata {
        &self.metadata
    }

    fn value(&self, index: usize) -> FsqlResult<SqlValue> {
        if self.closed {
            return Err(FsqlError::sql("cursor is closed"));
        }
        if !self.on_row() {
            return Err(FsqlError::sql("cursor is not positioned on a row"));
        }
        let value = self.rows[self.position - 1].get(index).cloned().ok_or(
            FsqlError::ColumnIndexOutOfRange {
                index,
                count: self.metadata.column_count(),
            },
        )?;
        self.was_null.set(value.is_null());
        Ok(value)
    }

    fn was_null(&self) -> bool {
        self.was_null.get()
    }

    fn row_number(&self) -> u64 {
        if self.on_row() {
            self.position as u64
        } else {
            0
        }
    }

    fn is_before_first(&self) -> bool {
        self.position == 0 && !self.exhausted && self.visible_rows() > 0
    }

    fn is_after_last(&self) -> bool {
        self.exhausted && self.visible_rows() > 0
    }

    fn advance(&mut self) -> FsqlResult<bool> {
        if self.closed {
            return Err(FsqlError::sql("cursor is closed"));
        }
        self.db.stats_mut(|s| s.advance_calls += 1);
        if self.exhausted {
            return Ok(false);
        }
        let next = self.position + 1;
        self.db
            .check(Fault::Advance { row: next as u64 }, "advance cursor")?;
        if next <= self.visible_rows() {
            self.position = next;
            Ok(true)
        } else {
            self.exhausted = true;
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::RowExt;

    fn db_with_numbers(n: i64) -> MemoryDatabase {
        let db = MemoryDatabase::new();
        let mut table = ResultTable::new(["n"]);
        for i in 1..=n {
            table = table.row([SqlValue::Int64(i)]);
        }
        db.register_query("SELECT n FROM numbers", table);
        db
    }

    #[test]
    fn test_cursor_walks_rows_then_stays_exhausted() {
        let db = db_with_numbers(2);
        let mut conn = db.connect().unwrap();
        let mut stmt = conn.create_statement(&StatementOptions::default()).unwrap();
        let mut cursor = stmt.query_sql("SELECT  n\nFROM numbers").unwrap();

        assert!(cursor.is_before_first());
        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.get_i64(0).unwrap(), 1);
        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.get_i64(0).unwrap(), 2);
        assert!(!cursor.advance().unwrap());
        assert!(!cursor.advance().unwrap());
        assert!(cursor.is_after_last());
        assert!(cursor.value(0).is_err());
        assert_eq!(db.stats().advance_calls, 4);
    }

    #[test]
    fn test_max_rows_caps_advancing() {
        let db = db_with_numbers(5);
        let mut conn = db.connect().unwrap();
        let mut stmt = conn
            .create_statement(&StatementOptions::new().with_max_rows(2))
            .unwrap();
        let mut cursor = stmt.query_sql("SELECT n FROM numbers").unwrap();
        let mut seen = 0;
        while cursor.advance().unwrap() {
            seen += 1;
        }
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_close_accounting() {
        let db = db_with_numbers(1);
        let mut conn = db.connect().unwrap();
        let mut stmt = conn.create_statement(&StatementOptions::default()).unwrap();
        let mut cursor = stmt.query_sql("SELECT n FROM numbers").unwrap();

        cursor.close().unwrap();
        cursor.close().unwrap();
        stmt.close().unwrap();
        conn.close().unwrap();

        let stats = db.stats();
        assert!(stats.all_released());
        assert_eq!(stats.redundant_closes, 1);
    }

    #[test]
    fn test_injected_close_failure_still_counts_release() {
        let db = db_with_numbers(1);
        db.inject(Fault::CloseConnection);
        let mut conn = db.connect().unwrap();
        assert!(conn.close().is_err());
        assert!(conn.is_closed());
        assert!(db.stats().all_released());
    }

    #[test]
    fn test_prepared_binding_is_recorded() {
        let db = MemoryDatabase::new();
        db.register_update("UPDATE t SET a = ? WHERE b = ?", 3);
        let mut conn = db.connect().unwrap();
        let mut stmt = conn
            .prepare_statement("UPDATE t SET a = ? WHERE b = ?", &StatementOptions::default())
            .unwrap();
        assert_eq!(stmt.parameter_count(), 2);
        stmt.bind(1, SqlValue::Int32(7)).unwrap();
        assert!(matches!(
            stmt.bind(3, SqlValue::Null),
            Err(FsqlError::ParameterIndexOutOfRange { index: 3, count: 2 })
        ));
        assert_eq!(stmt.execute_update().unwrap(), 3);

        let executions = db.executions();
        assert_eq!(executions.len(), 1);
        assert_eq!(
            executions[0].params,
            vec![SqlValue::Int32(7), SqlValue::Null]
        );
    }
}
