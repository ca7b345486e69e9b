//! # fsql: Functional SQL over forward-only cursors
//!
//! fsql는 외부에서 주어진 데이터베이스 드라이버 위에서 SQL을 함수형으로
//! 실행하는 라이브러리입니다. 쿼리 결과는 한 행씩 지연(lazy) 스트리밍되며,
//! 커서 → 스테이트먼트 → 커넥션 체인은 어떤 경로로 끝나든 정확히 한 번 해제됩니다.
//!
//! ## 주요 특징
//!
//! - **Lazy streaming**: [`RowStream`] / [`RowIterator`]: 한 번에 한 행
//! - **Owned-resource chain**: 소진, 실패, close, drop 모두 같은 해제 경로
//! - **Read-only row view**: row 함수는 커서를 이동/수정할 수 없음
//! - **Named parameters**: `:name` → `?` 재작성, 같은 이름은 한 번에 바인딩
//! - **Fallible functional traits**: [`SqlSupplier`], [`SqlFunction`],
//!   [`SqlPredicate`], [`SqlConsumer`]
//!
//! ## 빠른 시작
//!
//! ```rust
//! use fsql_core::backend::memory::{MemoryDatabase, ResultTable};
//! use fsql_core::{FsqlResult, FunctionalSql, RowExt, SqlValue};
//!
//! # fn main() -> FsqlResult<()> {
//! let db = MemoryDatabase::new();
//! db.register_query(
//!     "SELECT id, name FROM users",
//!     ResultTable::new(["id", "name"])
//!         .row([SqlValue::Int64(1), SqlValue::Utf8("alice".into())])
//!         .row([SqlValue::Int64(2), SqlValue::Utf8("bob".into())]),
//! );
//!
//! let fsql = FunctionalSql::new(db.clone());
//! let names = fsql
//!     .stream(fsql.query("SELECT id, name FROM users"), |row| row.get_string(1))?
//!     .collect::<FsqlResult<Vec<_>>>()?;
//!
//! assert_eq!(names, vec!["alice", "bob"]);
//! // 스트림이 소진되면 커서/스테이트먼트/커넥션 모두 해제
//! assert!(db.stats().all_released());
//! # Ok(())
//! # }
//! ```
//!
//! ### Query Builder
//!
//! ```rust
//! use fsql_core::backend::memory::{MemoryDatabase, ResultTable};
//! use fsql_core::{FsqlResult, FunctionalSql, SqlValue};
//!
//! # fn main() -> FsqlResult<()> {
//! let db = MemoryDatabase::new();
//! db.register_query(
//!     "SELECT name FROM users WHERE id = ?",
//!     ResultTable::new(["name"]).row([SqlValue::Utf8("bob".into())]),
//! );
//!
//! let fsql = FunctionalSql::new(db);
//! let (name,): (String,) = fsql
//!     .sql("SELECT name FROM users WHERE id = :id")
//!     .param("id", 2i64)
//!     .fetch_one()?;
//! assert_eq!(name, "bob");
//! # Ok(())
//! # }
//! ```
//!
//! ## 모듈 구조
//!
//! - [`driver`]: 드라이버 계약 (Connection / Statement / RowCursor)
//! - [`engine`]: 리소스 체인, iterator, stream, named parameter, [`FunctionalSql`]
//! - [`api`]: 함수형 트레이트, [`FromRow`], Query Builder
//! - [`backend`]: in-memory 드라이버, SQLite 드라이버 (feature `sqlite`)
//! - [`config`]: [`StatementOptions`]

// derive(FromRow) 확장 코드가 `::fsql_core` 경로를 사용
extern crate self as fsql_core;

pub mod api;
pub mod backend;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod value;

// Logging utilities
pub mod logging;

// ===== Re-exports =====
pub use api::{Execute, FromRow, Query, SqlConsumer, SqlFunction, SqlPredicate, SqlSupplier};
pub use config::StatementOptions;
pub use driver::{
    Closeable, Connection, CursorOf, ReadOnlyRow, ResourceKind, ResultMetadata, RowCursor, RowExt,
    Statement, StatementOf,
};
pub use engine::{
    FunctionalSql, NamedParameterStatement, NamedParams, NamedSql, QueryCursor, RowIterator,
    RowStream, StatementHandle,
};
pub use error::{FsqlError, FsqlResult};
pub use value::{FromValue, IntoParam, SqlValue};

// Re-export derive macros
pub use fsql_derive::FromRow;
