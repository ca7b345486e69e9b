//! Driver implementations
//!
//! - [`memory`]: scripted in-memory driver with fault injection
//! - [`sqlite`]: `rusqlite` driver (feature `sqlite`)

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;
