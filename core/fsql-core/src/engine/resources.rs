//! Owned-resource chain
//!
//! Cursor-producing operations already know which statement and connection
//! they opened, so they hand those along instead of the chain being
//! rediscovered later. A [`QueryCursor`] owns cursor → statement →
//! connection; a [`StatementHandle`] owns statement → connection. Both are
//! released by [`release_chain`], explicitly or on drop.

use crate::driver::{Closeable, Connection, CursorOf, ResourceKind, Statement};
use crate::error::{FsqlError, FsqlResult};
use crate::value::SqlValue;
use tracing::{debug, error};

/// Close every member of `chain` in order.
///
/// Members already closed are skipped. A failure on one member is logged and
/// does not stop the others; the number of failures is returned.
pub fn release_chain(chain: &mut [(ResourceKind, &mut dyn Closeable)]) -> usize {
    let mut failures = 0;
    for (kind, resource) in chain.iter_mut() {
        if resource.is_closed() {
            continue;
        }
        match resource.close() {
            Ok(()) => debug!(target: crate::logging::RESOURCES, resource = %kind, "released"),
            Err(e) => {
                failures += 1;
                error!(
                    target: crate::logging::RESOURCES,
                    resource = %kind,
                    error = %e,
                    "failed to release resource"
                );
            }
        }
    }
    failures
}

/// A statement together with the connection it was created on.
pub struct StatementHandle<K: Connection> {
    statement: Option<K::Statement>,
    connection: Option<K>,
    released: bool,
}

impl<K: Connection> StatementHandle<K> {
    pub fn new(statement: K::Statement, connection: K) -> Self {
        Self {
            statement: Some(statement),
            connection: Some(connection),
            released: false,
        }
    }

    /// Create a statement on `connection` with `create`.
    ///
    /// On failure the connection is closed before the error is returned.
    pub fn open<F>(mut connection: K, create: F) -> FsqlResult<Self>
    where
        F: FnOnce(&mut K) -> FsqlResult<K::Statement>,
    {
        match create(&mut connection) {
            Ok(statement) => Ok(Self::new(statement, connection)),
            Err(e) => {
                let connection: &mut dyn Closeable = &mut connection;
                release_chain(&mut [(ResourceKind::Connection, connection)]);
                Err(e)
            }
        }
    }

    /// Produce a cursor from the statement; ownership of statement and
    /// connection moves into the returned [`QueryCursor`].
    ///
    /// On failure the statement and connection are released before the error
    /// is returned.
    pub fn open_cursor<F>(mut self, produce: F) -> FsqlResult<QueryCursor<K>>
    where
        F: FnOnce(&mut K::Statement) -> FsqlResult<CursorOf<K>>,
    {
        let produced = match self.statement.as_mut() {
            Some(statement) => produce(statement),
            None => Err(FsqlError::sql("statement already released")),
        };
        match produced {
            Ok(cursor) => Ok(QueryCursor {
                cursor,
                statement: self.statement.take(),
                connection: self.connection.take(),
                released: false,
            }),
            Err(e) => {
                self.release();
                Err(e)
            }
        }
    }

    pub fn statement(&self) -> Option<&K::Statement> {
        self.statement.as_ref()
    }

    pub fn statement_mut(&mut self) -> Option<&mut K::Statement> {
        self.statement.as_mut()
    }

    pub fn connection(&self) -> Option<&K> {
        self.connection.as_ref()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Close statement, then connection. Later calls do nothing.
    pub fn release(&mut self) -> usize {
        if self.released {
            return 0;
        }
        self.released = true;

        let mut chain: Vec<(ResourceKind, &mut dyn Closeable)> = Vec::with_capacity(2);
        if let Some(statement) = self.statement.as_mut() {
            chain.push((ResourceKind::Statement, statement));
        }
        if let Some(connection) = self.connection.as_mut() {
            chain.push((ResourceKind::Connection, connection));
        }
        release_chain(&mut chain)
    }
}

impl<K: Connection> Drop for StatementHandle<K> {
    fn drop(&mut self) {
        self.release();
    }
}

/// A cursor together with the statement and connection it owns.
pub struct QueryCursor<K: Connection> {
    cursor: CursorOf<K>,
    statement: Option<K::Statement>,
    connection: Option<K>,
    released: bool,
}

impl<K: Connection> QueryCursor<K> {
    /// Record ownership explicitly. `statement` and `connection` are
    /// optional for cursors that do not own them.
    pub fn new(
        cursor: CursorOf<K>,
        statement: Option<K::Statement>,
        connection: Option<K>,
    ) -> Self {
        Self {
            cursor,
            statement,
            connection,
            released: false,
        }
    }

    pub fn cursor(&self) -> &CursorOf<K> {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut CursorOf<K> {
        &mut self.cursor
    }

    pub fn statement(&self) -> Option<&K::Statement> {
        self.statement.as_ref()
    }

    pub fn connection(&self) -> Option<&K> {
        self.connection.as_ref()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Close cursor, statement, connection. Later calls do nothing.
    pub fn release(&mut self) -> usize {
        if self.released {
            return 0;
        }
        self.released = true;

        let mut chain: Vec<(ResourceKind, &mut dyn Closeable)> = Vec::with_capacity(3);
        chain.push((ResourceKind::Cursor, &mut self.cursor));
        if let Some(statement) = self.statement.as_mut() {
            chain.push((ResourceKind::Statement, statement));
        }
        if let Some(connection) = self.connection.as_mut() {
            chain.push((ResourceKind::Connection, connection));
        }
        release_chain(&mut chain)
    }
}

impl<K: Connection> Drop for QueryCursor<K> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Bind `params` to positions `1..=params.len()`.
pub(crate) fn bind_positional<S: Statement>(
    statement: &mut S,
    params: &[SqlValue],
) -> FsqlResult<()> {
    for (i, value) in params.iter().enumerate() {
        statement.bind(i + 1, value.clone())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{Fault, MemoryConnection, MemoryDatabase, ResultTable};
    use crate::config::StatementOptions;

    fn db() -> MemoryDatabase {
        let db = MemoryDatabase::new();
        db.register_query(
            "SELECT 1",
            ResultTable::new(["one"]).row([SqlValue::Int64(1)]),
        );
        db
    }

    fn open(db: &MemoryDatabase) -> FsqlResult<QueryCursor<MemoryConnection>> {
        StatementHandle::open(db.connect()?, |c| {
            c.create_statement(&StatementOptions::default())
        })?
        .open_cursor(|s| s.query_sql("SELECT 1"))
    }

    #[test]
    fn test_release_closes_whole_chain_once() {
        let db = db();
        let mut cursor = open(&db).unwrap();
        assert_eq!(db.stats().open_resources(), 3);

        assert_eq!(cursor.release(), 0);
        assert_eq!(cursor.release(), 0);
        drop(cursor);

        let stats = db.stats();
        assert!(stats.all_released());
        assert_eq!(stats.redundant_closes, 0);
    }

    #[test]
    fn test_drop_releases() {
        let db = db();
        drop(open(&db).unwrap());
        assert!(db.stats().all_released());
    }

    #[test]
    fn test_failure_on_one_member_does_not_stop_the_rest() {
        let db = db();
        db.inject(Fault::CloseCursor);
        db.inject(Fault::CloseStatement);
        let mut cursor = open(&db).unwrap();

        assert_eq!(cursor.release(), 2);
        let stats = db.stats();
        assert_eq!(stats.connections_closed, 1);
        assert!(stats.all_released());
    }

    #[test]
    fn test_statement_failure_releases_connection() {
        let db = db();
        db.inject(Fault::CreateStatement);
        assert!(open(&db).is_err());
        let stats = db.stats();
        assert_eq!(stats.connections_opened, 1);
        assert_eq!(stats.statements_opened, 0);
        assert!(stats.all_released());
    }

    #[test]
    fn test_execute_failure_releases_statement_and_connection() {
        let db = db();
        db.inject(Fault::Execute);
        assert!(open(&db).is_err());
        let stats = db.stats();
        assert_eq!(stats.statements_closed, 1);
        assert!(stats.all_released());
    }

    #[test]
    fn test_release_chain_skips_closed_members() {
        let db = db();
        let mut conn = db.connect().unwrap();
        conn.close().unwrap();
        let conn: &mut dyn Closeable = &mut conn;
        assert_eq!(release_chain(&mut [(ResourceKind::Connection, conn)]), 0);
        assert_eq!(db.stats().redundant_closes, 0);
    }
}
