//! Execution engine
//!
//! Owned-resource chains, the lazy row iterator and its streaming adapter,
//! named-parameter rewriting and the [`FunctionalSql`] facade on top.

pub mod functional_sql;
pub mod iterator;
pub mod named;
pub mod resources;
pub mod stream;

#[cfg(test)]
mod iterator_tests;

pub use functional_sql::FunctionalSql;
pub use iterator::RowIterator;
pub use named::{NamedParameterStatement, NamedParams, NamedSql};
pub use resources::{QueryCursor, StatementHandle, release_chain};
pub use stream::RowStream;
