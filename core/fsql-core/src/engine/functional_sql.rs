//! Execution facade
//!
//! [`FunctionalSql`] turns a connection provider into cursor-producing
//! suppliers (plain, positional, named) and runs them either lazily
//! ([`FunctionalSql::stream`]) or once ([`FunctionalSql::execute_query`]).
//!
//! Each supplier call opens its own connection → statement → cursor chain.
//! When any step fails, whatever was opened so far is released before the
//! error is returned.

use super::iterator::RowIterator;
use super::named::NamedSql;
use super::resources::{QueryCursor, StatementHandle, bind_positional};
use super::stream::RowStream;
use crate::api::functional::SqlSupplier;
use crate::api::traits::FromRow;
use crate::config::StatementOptions;
use crate::driver::{Connection, CursorOf, ReadOnlyRow, Statement};
use crate::error::{FsqlError, FsqlResult};
use crate::value::SqlValue;
use std::marker::PhantomData;
use tracing::debug;

/// Functional SQL execution over connections from `P`.
pub struct FunctionalSql<K, P> {
    provider: P,
    options: StatementOptions,
    _connection: PhantomData<fn() -> K>,
}

impl<K, P> FunctionalSql<K, P>
where
    K: Connection,
    P: SqlSupplier<K>,
{
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            options: StatementOptions::default(),
            _connection: PhantomData,
        }
    }

    /// Options applied to every statement this facade creates.
    pub fn with_options(mut self, options: StatementOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &StatementOptions {
        &self.options
    }

    /// A fresh connection from the provider.
    pub fn connection(&self) -> FsqlResult<K> {
        self.provider.get()
    }

    // ===== Suppliers =====

    /// Statement supplier using the facade options.
    pub fn statement(&self) -> impl Fn() -> FsqlResult<StatementHandle<K>> + '_ {
        self.statement_with(self.options.clone())
    }

    /// Statement supplier with explicit options.
    pub fn statement_with(
        &self,
        options: StatementOptions,
    ) -> impl Fn() -> FsqlResult<StatementHandle<K>> + '_ {
        move || StatementHandle::open(self.provider.get()?, |c| c.create_statement(&options))
    }

    /// Cursor supplier for ad-hoc SQL text.
    pub fn query(
        &self,
        sql: impl Into<String>,
    ) -> impl Fn() -> FsqlResult<QueryCursor<K>> + '_ {
        let sql = sql.into();
        move || {
            debug!(sql = %sql, "query");
            StatementHandle::open(self.provider.get()?, |c| {
                c.create_statement(&self.options)
            })?
            .open_cursor(|s| s.query_sql(&sql))
        }
    }

    /// Cursor supplier for SQL with positional `?` placeholders, bound to
    /// `params` in order.
    pub fn parameter_query(
        &self,
        sql: impl Into<String>,
        params: Vec<SqlValue>,
    ) -> impl Fn() -> FsqlResult<QueryCursor<K>> + '_ {
        let sql = sql.into();
        move || {
            debug!(sql = %sql, params = params.len(), "parameter query");
            StatementHandle::open(self.provider.get()?, |c| {
                c.prepare_statement(&sql, &self.options)
            })?
            .open_cursor(|s| {
                bind_positional(s, &params)?;
                s.query()
            })
        }
    }

    /// Cursor supplier for SQL with `:name` placeholders.
    ///
    /// The text is parsed here, once; names in `params` the statement does
    /// not contain are ignored.
    pub fn named_parameter_query<I, N>(
        &self,
        sql: &str,
        params: I,
    ) -> FsqlResult<impl Fn() -> FsqlResult<QueryCursor<K>> + '_>
    where
        I: IntoIterator<Item = (N, SqlValue)>,
        N: Into<String>,
    {
        let parsed = NamedSql::parse(sql)?;
        let params: Vec<(String, SqlValue)> =
            params.into_iter().map(|(n, v)| (n.into(), v)).collect();

        Ok(move || {
            debug!(sql = parsed.sql(), "named parameter query");
            StatementHandle::open(self.provider.get()?, |c| {
                c.prepare_statement(parsed.sql(), &self.options)
            })?
            .open_cursor(|s| {
                parsed.set_all(s, params.iter().cloned())?;
                s.query()
            })
        })
    }

    // ===== Entry points =====

    /// Lazy stream of `row_fn` applied to each row.
    ///
    /// The cursor is acquired before this returns, so supplier failures
    /// surface here rather than on the first pull.
    pub fn stream<S, F, T>(&self, supplier: S, row_fn: F) -> FsqlResult<RowStream<K, F, T>>
    where
        S: SqlSupplier<QueryCursor<K>>,
        F: FnMut(&ReadOnlyRow<'_, CursorOf<K>>) -> FsqlResult<T>,
    {
        let iterator = RowIterator::new(&supplier, row_fn)?;
        Ok(RowStream::new(iterator))
    }

    /// Lazy stream of rows converted through [`FromRow`].
    #[allow(clippy::type_complexity)]
    pub fn stream_rows<T, S>(
        &self,
        supplier: S,
    ) -> FsqlResult<RowStream<K, impl FnMut(&ReadOnlyRow<'_, CursorOf<K>>) -> FsqlResult<T>, T>>
    where
        T: FromRow,
        S: SqlSupplier<QueryCursor<K>>,
    {
        self.stream(supplier, |row| T::from_row(row))
    }

    /// Run `f` once over the raw cursor, then release the chain whatever
    /// `f` returned. An error from `f` wins over cleanup failures, which are
    /// only logged.
    pub fn execute_query<S, R, F>(&self, supplier: S, f: F) -> FsqlResult<R>
    where
        S: SqlSupplier<QueryCursor<K>>,
        F: FnOnce(&mut CursorOf<K>) -> FsqlResult<R>,
    {
        let mut resources = supplier.get()?;
        let result = f(resources.cursor_mut());
        resources.release();
        result
    }

    /// Run `f` once over a statement, then release statement and connection.
    pub fn execute_statement<S, R, F>(&self, supplier: S, f: F) -> FsqlResult<R>
    where
        S: SqlSupplier<StatementHandle<K>>,
        F: FnOnce(&mut K::Statement) -> FsqlResult<R>,
    {
        let mut handle = supplier.get()?;
        let result = match handle.statement_mut() {
            Some(statement) => f(statement),
            None => Err(FsqlError::sql("statement already released")),
        };
        handle.release();
        result
    }

    /// Execute ad-hoc SQL text; `true` when it produced rows.
    pub fn execute(&self, sql: &str) -> FsqlResult<bool> {
        debug!(sql, "execute");
        self.execute_statement(self.statement(), |s| s.execute(sql))
    }

    /// Prepared update with positional parameters; returns the affected row
    /// count.
    pub fn parameter_update(&self, sql: &str, params: &[SqlValue]) -> FsqlResult<u64> {
        debug!(sql, params = params.len(), "parameter update");
        let supplier = || {
            StatementHandle::open(self.provider.get()?, |c| {
                c.prepare_statement(sql, &self.options)
            })
        };
        self.execute_statement(supplier, |s| {
            bind_positional(s, params)?;
            s.execute_update()
        })
    }

    /// Prepared update with `:name` parameters; unknown names are ignored.
    pub fn named_parameter_update<I, N>(&self, sql: &str, params: I) -> FsqlResult<u64>
    where
        I: IntoIterator<Item = (N, SqlValue)>,
        N: AsRef<str>,
    {
        let parsed = NamedSql::parse(sql)?;
        debug!(sql = parsed.sql(), "named parameter update");
        let supplier = || {
            StatementHandle::open(self.provider.get()?, |c| {
                c.prepare_statement(parsed.sql(), &self.options)
            })
        };
        self.execute_statement(supplier, |s| {
            parsed.set_all(s, params)?;
            s.execute_update()
        })
    }
}
