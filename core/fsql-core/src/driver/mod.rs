//! Driver capability contracts
//!
//! The database client is supplied from outside; fsql only needs the narrow
//! set of capabilities below. [`Connection`] creates statements, a
//! [`Statement`] produces a [`RowCursor`], and every one of them is
//! [`Closeable`] so it can take part in an owned-resource chain.

pub mod cursor;
pub mod read_only;

use crate::config::StatementOptions;
use crate::error::FsqlResult;
use crate::value::SqlValue;
use std::fmt;

pub use cursor::{ColumnMetadata, CursorPosition, ResultMetadata, RowCursor, RowExt};
pub use read_only::ReadOnlyRow;

/// A resource that must be released exactly once.
pub trait Closeable {
    /// Release the resource. Closing an already closed resource is a no-op.
    fn close(&mut self) -> FsqlResult<()>;

    fn is_closed(&self) -> bool;
}

/// Role of a resource inside an owned-resource chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Cursor,
    Statement,
    Connection,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Cursor => "cursor",
            ResourceKind::Statement => "statement",
            ResourceKind::Connection => "connection",
        })
    }
}

/// A live database connection.
pub trait Connection: Closeable {
    type Statement: Statement;

    /// Statement for ad-hoc SQL text (see [`Statement::query_sql`]).
    fn create_statement(&mut self, options: &StatementOptions) -> FsqlResult<Self::Statement>;

    /// Statement prepared from `sql` with positional `?` placeholders.
    fn prepare_statement(
        &mut self,
        sql: &str,
        options: &StatementOptions,
    ) -> FsqlResult<Self::Statement>;
}

/// A plain or prepared statement.
pub trait Statement: Closeable {
    type Cursor: RowCursor;

    /// Bind a value to a 1-based placeholder position.
    fn bind(&mut self, position: usize, value: SqlValue) -> FsqlResult<()>;

    /// Reset every bound placeholder to unset.
    fn clear_parameters(&mut self) -> FsqlResult<()>;

    /// Number of placeholders of a prepared statement (0 for plain ones).
    fn parameter_count(&self) -> usize;

    /// Execute the prepared SQL and return a cursor positioned before the
    /// first row.
    fn query(&mut self) -> FsqlResult<Self::Cursor>;

    /// Execute ad-hoc SQL text.
    fn query_sql(&mut self, sql: &str) -> FsqlResult<Self::Cursor>;

    /// Execute ad-hoc SQL text; `true` when it produced rows.
    fn execute(&mut self, sql: &str) -> FsqlResult<bool>;

    /// Execute the prepared SQL as an update; returns the affected row count.
    fn execute_update(&mut self) -> FsqlResult<u64>;
}

/// Cursor type produced by connection `K`.
pub type CursorOf<K> = <<K as Connection>::Statement as Statement>::Cursor;

/// Statement type produced by connection `K`.
pub type StatementOf<K> = <K as Connection>::Statement;
