//! Named parameters
//!
//! `:name` placeholders are rewritten to positional `?` in textual order and
//! each name keeps the list of 1-based positions it occupies, so one bind
//! sets every occurrence.
//!
//! A token touching a single quote on either side (`':x'`, `'a:b'`) is left
//! alone, as is the second colon of a `::type` cast.

use crate::config::StatementOptions;
use crate::driver::{Closeable, Connection, Statement};
use crate::error::{FsqlError, FsqlResult};
use crate::value::{IntoParam, SqlValue};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

/// Named parameter values
pub type NamedParams = HashMap<String, SqlValue>;

static PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r":([A-Za-z0-9_]+)").ok());

/// SQL text rewritten to positional placeholders, plus the name table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSql {
    sql: String,
    positions: HashMap<String, Vec<usize>>,
    parameter_count: usize,
}

impl NamedSql {
    pub fn parse(sql: &str) -> FsqlResult<Self> {
        let pattern = PLACEHOLDER.as_ref().ok_or_else(|| FsqlError::InvalidOperation {
            message: "placeholder pattern failed to compile".to_string(),
            context: "NamedSql::parse".to_string(),
        })?;

        let mut rewritten = String::with_capacity(sql.len());
        let mut positions: HashMap<String, Vec<usize>> = HashMap::new();
        let mut last = 0;
        let mut position = 0;

        for caps in pattern.captures_iter(sql) {
            let (Some(token), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let before = sql[..token.start()].chars().next_back();
            let after = sql[token.end()..].chars().next();
            if matches!(before, Some('\'') | Some(':')) || after == Some('\'') {
                continue;
            }

            position += 1;
            rewritten.push_str(&sql[last..token.start()]);
            rewritten.push('?');
            last = token.end();

            debug!(
                target: crate::logging::NAMED,
                position,
                name = name.as_str(),
                "mapped named parameter"
            );
            positions
                .entry(name.as_str().to_string())
                .or_default()
                .push(position);
        }
        rewritten.push_str(&sql[last..]);

        debug!(target: crate::logging::NAMED, ?positions, "final parameter mappings");
        Ok(Self {
            sql: rewritten,
            positions,
            parameter_count: position,
        })
    }

    /// The rewritten SQL.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// 1-based positions of `name`, in textual order.
    pub fn positions(&self, name: &str) -> Option<&[usize]> {
        self.positions.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.positions.keys().map(String::as_str)
    }

    /// Total number of `?` placeholders produced.
    pub fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    /// Bind `value` at every position of `name`.
    pub fn bind<S: Statement>(
        &self,
        statement: &mut S,
        name: &str,
        value: SqlValue,
    ) -> FsqlResult<()> {
        let positions = self
            .positions(name)
            .ok_or_else(|| FsqlError::UnknownParameter(name.to_string()))?;
        for &position in positions {
            statement.bind(position, value.clone())?;
        }
        Ok(())
    }

    /// Clear all parameters, then bind every known name in `params`.
    /// Names the statement does not contain are skipped.
    pub fn set_all<S, I, N>(&self, statement: &mut S, params: I) -> FsqlResult<()>
    where
        S: Statement,
        I: IntoIterator<Item = (N, SqlValue)>,
        N: AsRef<str>,
    {
        statement.clear_parameters()?;
        for (name, value) in params {
            let name = name.as_ref();
            if !self.contains(name) {
                continue;
            }
            self.bind(statement, name, value)?;
        }
        Ok(())
    }
}

/// A prepared statement addressed by parameter name.
pub struct NamedParameterStatement<S: Statement> {
    statement: S,
    parsed: NamedSql,
}

impl<S: Statement> NamedParameterStatement<S> {
    /// Parse `sql` and prepare the rewritten text on `connection`.
    pub fn prepare<K>(
        connection: &mut K,
        sql: &str,
        options: &StatementOptions,
    ) -> FsqlResult<Self>
    where
        K: Connection<Statement = S>,
    {
        let parsed = NamedSql::parse(sql)?;
        let statement = connection.prepare_statement(parsed.sql(), options)?;
        Ok(Self { statement, parsed })
    }

    /// Pair an already prepared statement with its parsed text.
    pub fn new(statement: S, parsed: NamedSql) -> Self {
        Self { statement, parsed }
    }

    /// Set every occurrence of `name`; fails with
    /// [`FsqlError::UnknownParameter`] for names the statement lacks.
    pub fn bind<V: IntoParam>(&mut self, name: &str, value: V) -> FsqlResult<&mut Self> {
        self.parsed.bind(&mut self.statement, name, value.into_param())?;
        Ok(self)
    }

    pub fn set_all<I, N>(&mut self, params: I) -> FsqlResult<&mut Self>
    where
        I: IntoIterator<Item = (N, SqlValue)>,
        N: AsRef<str>,
    {
        self.parsed.set_all(&mut self.statement, params)?;
        Ok(self)
    }

    pub fn clear_parameters(&mut self) -> FsqlResult<()> {
        self.statement.clear_parameters()
    }

    pub fn positions(&self, name: &str) -> Option<&[usize]> {
        self.parsed.positions(name)
    }

    pub fn parsed(&self) -> &NamedSql {
        &self.parsed
    }

    pub fn query(&mut self) -> FsqlResult<S::Cursor> {
        self.statement.query()
    }

    pub fn execute_update(&mut self) -> FsqlResult<u64> {
        self.statement.execute_update()
    }

    pub fn statement(&self) -> &S {
        &self.statement
    }

    pub fn statement_mut(&mut self) -> &mut S {
        &mut self.statement
    }

    pub fn into_inner(self) -> S {
        self.statement
    }
}

impl<S: Statement> Closeable for NamedParameterStatement<S> {
    fn close(&mut self) -> FsqlResult<()> {
        self.statement.close()
    }

    fn is_closed(&self) -> bool {
        self.statement.is_closed()
    }
}
