//! SQLite driver (`rusqlite`)
//!
//! Connections share one `rusqlite::Connection` through an `Rc`, so
//! statements and cursors can outlive the borrow a plain
//! `rusqlite::Statement` would need. A cursor owns its prepared statement
//! and the live `Rows` over it; rows are stepped one per `advance` and only
//! the current row is materialized. Because of the `Rc`, SQLite handles,
//! and streams over them, stay on the thread that opened them.
//!
//! SQLite cursors are forward-only and read-only. Scrollable or updatable
//! options are accepted with a warning and served forward-only.
//!
//! SQLite has no per-statement execution timeout. A statement's query
//! timeout becomes the connection's busy timeout (how long it waits on a
//! locked database) each time the statement runs; statements without one
//! run with rusqlite's default of 5 seconds.

use crate::api::functional::SqlSupplier;
use crate::config::StatementOptions;
use crate::driver::{Closeable, ColumnMetadata, Connection, ResultMetadata, RowCursor, Statement};
use crate::error::{FsqlError, FsqlResult};
use crate::value::{DATE_FORMAT, SqlValue, TIME_FORMAT, TIMESTAMP_FORMAT};
use ouroboros::self_referencing;
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{CachedStatement, Rows, ToSql, params_from_iter};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, warn};

/// `rusqlite::Connection::open` 기본값
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Boolean(v) => ToSqlOutput::Owned(Value::Integer(i64::from(*v))),
            SqlValue::Int32(v) => ToSqlOutput::Owned(Value::Integer(i64::from(*v))),
            SqlValue::Int64(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            SqlValue::Float64(v) => ToSqlOutput::Owned(Value::Real(*v)),
            SqlValue::Utf8(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            SqlValue::Bytes(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v)),
            // ISO-8601 텍스트
            SqlValue::Date(v) => ToSqlOutput::Owned(Value::Text(v.format(DATE_FORMAT).to_string())),
            SqlValue::Time(v) => ToSqlOutput::Owned(Value::Text(v.format(TIME_FORMAT).to_string())),
            SqlValue::Timestamp(v) => {
                ToSqlOutput::Owned(Value::Text(v.format(TIMESTAMP_FORMAT).to_string()))
            }
        })
    }
}

fn from_value_ref(value: ValueRef<'_>) -> FsqlResult<SqlValue> {
    Ok(match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(v) => SqlValue::Int64(v),
        ValueRef::Real(v) => SqlValue::Float64(v),
        ValueRef::Text(bytes) => SqlValue::Utf8(
            std::str::from_utf8(bytes)
                .map_err(|e| FsqlError::Driver {
                    source: Box::new(e),
                })?
                .to_string(),
        ),
        ValueRef::Blob(bytes) => SqlValue::Bytes(bytes.to_vec()),
    })
}

enum Source {
    /// 매 연결마다 파일을 새로 연다
    Path(PathBuf),
    Shared(Rc<rusqlite::Connection>),
}

/// Connection provider for SQLite.
pub struct SqliteDatabase {
    source: Source,
}

impl SqliteDatabase {
    /// Every connection opens `path` anew.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            source: Source::Path(path.as_ref().to_path_buf()),
        }
    }

    /// One private in-memory database shared by every connection handed out.
    pub fn open_in_memory() -> FsqlResult<Self> {
        Ok(Self::from_connection(rusqlite::Connection::open_in_memory()?))
    }

    /// Share an existing connection.
    pub fn from_connection(connection: rusqlite::Connection) -> Self {
        Self {
            source: Source::Shared(Rc::new(connection)),
        }
    }

    pub fn connect(&self) -> FsqlResult<SqliteConnection> {
        let conn = match &self.source {
            Source::Path(path) => {
                debug!(path = %path.display(), "opening sqlite connection");
                Rc::new(rusqlite::Connection::open(path)?)
            }
            Source::Shared(conn) => Rc::clone(conn),
        };
        Ok(SqliteConnection { conn: Some(conn) })
    }
}

impl SqlSupplier<SqliteConnection> for SqliteDatabase {
    fn get(&self) -> FsqlResult<SqliteConnection> {
        self.connect()
    }
}

fn closed(what: &str) -> FsqlError {
    FsqlError::sql(format!("{what} is closed"))
}

pub struct SqliteConnection {
    conn: Option<Rc<rusqlite::Connection>>,
}

impl SqliteConnection {
    fn open_handle(&self, options: &StatementOptions) -> FsqlResult<Rc<rusqlite::Connection>> {
        let conn = self.conn.as_ref().ok_or_else(|| closed("connection"))?;
        if !options.is_forward_only_read() {
            warn!(
                result_set_type = ?options.result_set_type,
                concurrency = ?options.concurrency,
                "sqlite cursors are forward-only and read-only; downgrading"
            );
        }
        Ok(Rc::clone(conn))
    }
}

impl Closeable for SqliteConnection {
    fn close(&mut self) -> FsqlResult<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        // 마지막 핸들일 때만 실제로 닫힘
        match Rc::try_unwrap(conn) {
            Ok(conn) => conn.close().map_err(|(_, e)| e.into()),
            Err(_) => Ok(()),
        }
    }

    fn is_closed(&self) -> bool {
        self.conn.is_none()
    }
}

impl Connection for SqliteConnection {
    type Statement = SqliteStatement;

    fn create_statement(&mut self, options: &StatementOptions) -> FsqlResult<SqliteStatement> {
        Ok(SqliteStatement {
            conn: Some(self.open_handle(options)?),
            sql: None,
            params: Vec::new(),
            busy_timeout: options.query_timeout(),
            max_rows: options.max_rows,
        })
    }

    fn prepare_statement(
        &mut self,
        sql: &str,
        options: &StatementOptions,
    ) -> FsqlResult<SqliteStatement> {
        let conn = self.open_handle(options)?;
        // 문법 오류는 prepare 시점에 보고
        let count = conn.prepare_cached(sql)?.parameter_count();
        Ok(SqliteStatement {
            conn: Some(conn),
            sql: Some(sql.to_string()),
            params: vec![SqlValue::Null; count],
            busy_timeout: options.query_timeout(),
            max_rows: options.max_rows,
        })
    }
}

pub struct SqliteStatement {
    conn: Option<Rc<rusqlite::Connection>>,
    sql: Option<String>,
    params: Vec<SqlValue>,
    busy_timeout: Option<Duration>,
    max_rows: Option<u64>,
}

impl SqliteStatement {
    fn handle(&self) -> FsqlResult<&Rc<rusqlite::Connection>> {
        self.conn.as_ref().ok_or_else(|| closed("statement"))
    }

    /// Connection with this statement's busy timeout applied. The timeout is
    /// set on every run since other statements share the connection.
    fn run_handle(&self) -> FsqlResult<&Rc<rusqlite::Connection>> {
        let conn = self.handle()?;
        conn.busy_timeout(self.busy_timeout.unwrap_or(DEFAULT_BUSY_TIMEOUT))?;
        Ok(conn)
    }

    fn prepared_sql(&self) -> FsqlResult<&str> {
        self.sql.as_deref().ok_or_else(|| FsqlError::InvalidOperation {
            message: "statement was not prepared".to_string(),
            context: "SqliteStatement".to_string(),
        })
    }

    fn open_cursor(&self, sql: &str, params: &[SqlValue]) -> FsqlResult<SqliteCursor> {
        let conn = Rc::clone(self.run_handle()?);
        let mut names: Vec<String> = Vec::new();
        let live = LiveRowsTryBuilder {
            conn,
            prepared_builder: |conn| {
                conn.prepare_cached(sql).and_then(|stmt| {
                    names = stmt.column_names().into_iter().map(String::from).collect();
                    PreparedRowsTryBuilder {
                        stmt,
                        rows_builder: |stmt| stmt.query(params_from_iter(params.iter())),
                    }
                    .try_build()
                })
            },
        }
        .try_build()?;

        Ok(SqliteCursor {
            live: Some(live),
            metadata: ResultMetadata::new(names.into_iter().map(ColumnMetadata::new).collect()),
            current: None,
            seen: 0,
            exhausted: false,
            was_null: Cell::new(false),
            max_rows: self.max_rows,
        })
    }
}

impl Closeable for SqliteStatement {
    fn close(&mut self) -> FsqlResult<()> {
        self.conn = None;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.conn.is_none()
    }
}

impl Statement for SqliteStatement {
    type Cursor = SqliteCursor;

    fn bind(&mut self, position: usize, value: SqlValue) -> FsqlResult<()> {
        self.handle()?;
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
        self.params.fill(SqlValue::Null);
        Ok(())
    }

    fn parameter_count(&self) -> usize {
        self.params.len()
    }

    fn query(&mut self) -> FsqlResult<SqliteCursor> {
        let sql = self.prepared_sql()?;
        self.open_cursor(sql, &self.params)
    }

    fn query_sql(&mut self, sql: &str) -> FsqlResult<SqliteCursor> {
        self.open_cursor(sql, &[])
    }

    fn execute(&mut self, sql: &str) -> FsqlResult<bool> {
        let mut stmt = self.run_handle()?.prepare(sql)?;
        if stmt.column_count() > 0 {
            stmt.query([])?.next()?;
            Ok(true)
        } else {
            stmt.execute([])?;
            Ok(false)
        }
    }

    fn execute_update(&mut self) -> FsqlResult<u64> {
        let sql = self.prepared_sql()?;
        let mut stmt = self.run_handle()?.prepare_cached(sql)?;
        let affected = stmt.execute(params_from_iter(self.params.iter()))?;
        Ok(affected as u64)
    }
}

/// Statement plus the rows running over it, borrowing the connection.
#[self_referencing]
struct PreparedRows<'conn> {
    stmt: CachedStatement<'conn>,
    #[borrows(mut stmt)]
    #[covariant]
    rows: Rows<'this>,
}

/// [`PreparedRows`] kept together with the connection it borrows.
#[self_referencing]
struct LiveRows {
    conn: Rc<rusqlite::Connection>,
    #[borrows(conn)]
    #[not_covariant]
    prepared: PreparedRows<'this>,
}

/// Forward-only cursor over a running SQLite statement.
pub struct SqliteCursor {
    live: Option<LiveRows>,
    metadata: ResultMetadata,
    current: Option<Vec<SqlValue>>,
    /// rows advanced onto so far
    seen: u64,
    exhausted: bool,
    was_null: Cell<bool>,
    max_rows: Option<u64>,
}

impl SqliteCursor {
    fn fetch(&mut self) -> FsqlResult<Option<Vec<SqlValue>>> {
        let columns = self.metadata.column_count();
        let live = self.live.as_mut().ok_or_else(|| closed("cursor"))?;
        live.with_prepared_mut(|prepared| {
            prepared.with_rows_mut(|rows| {
                let Some(row) = rows.next()? else {
                    return Ok(None);
                };
                (0..columns)
                    .map(|index| from_value_ref(row.get_ref(index)?))
                    .collect::<FsqlResult<Vec<_>>>()
                    .map(Some)
            })
        })
    }
}

impl Closeable for SqliteCursor {
    fn close(&mut self) -> FsqlResult<()> {
        self.live = None;
        self.current = None;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.live.is_none()
    }
}

impl RowCursor for SqliteCursor {
    fn metadata(&self) -> &ResultMetadata {
        &self.metadata
    }

    fn value(&self, index: usize) -> FsqlResult<SqlValue> {
        if self.live.is_none() {
            return Err(closed("cursor"));
        }
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| FsqlError::sql("cursor is not positioned on a row"))?;
        let value = row.get(index).cloned().ok_or(FsqlError::ColumnIndexOutOfRange {
            index,
            count: self.metadata.column_count(),
        })?;
        self.was_null.set(value.is_null());
        Ok(value)
    }

    fn was_null(&self) -> bool {
        self.was_null.get()
    }

    fn row_number(&self) -> u64 {
        if self.current.is_some() { self.seen } else { 0 }
    }

    fn is_before_first(&self) -> bool {
        self.seen == 0 && !self.exhausted
    }

    fn is_after_last(&self) -> bool {
        self.exhausted && self.seen > 0
    }

    fn advance(&mut self) -> FsqlResult<bool> {
        if self.exhausted {
            return Ok(false);
        }
        if self.max_rows.is_some_and(|max| self.seen >= max) {
            debug!(max_rows = self.seen, "row limit reached");
            self.exhausted = true;
            self.current = None;
            return Ok(false);
        }
        match self.fetch()? {
            Some(row) => {
                self.current = Some(row);
                self.seen += 1;
                Ok(true)
            }
            None => {
                self.exhausted = true;
                self.current = None;
                Ok(false)
            }
        }
    }
}
