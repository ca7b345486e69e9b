//! API 모듈: Fluent 스타일 API
//!
//! 함수형 트레이트, FromRow, Query Builder 제공

pub mod functional;
pub mod query;
pub mod traits;

pub use functional::{SqlConsumer, SqlFunction, SqlPredicate, SqlSupplier, identity, is_equal};
pub use query::{Execute, Query};
pub use traits::FromRow;
