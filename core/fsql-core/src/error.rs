//! Error types for fsql.
//!
//! All public APIs return `FsqlResult<T>`: no panics in library code.
//! Driver failures surface as [`FsqlError::Sql`] (or [`FsqlError::Driver`]);
//! failures raised while lazily iterating rows are wrapped into
//! [`FsqlError::DataAccess`].

use thiserror::Error;

/// Unified error type for all fsql operations.
#[derive(Debug, Error)]
pub enum FsqlError {
    /// Failure reported by the underlying driver (connect, prepare, execute,
    /// advance, column access, close)
    #[error("sql error: {message}")]
    Sql { message: String },

    /// Failure raised by a concrete driver library, kept as the cause
    #[error("driver error: {source}")]
    Driver {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Canonical wrapping kind surfaced by the lazy row iterator
    #[error("data access error: {message}")]
    DataAccess {
        message: String,
        #[source]
        source: Box<FsqlError>,
    },

    /// Positioning or mutation attempted through a read-only cursor view
    #[error("operation not supported: {operation}")]
    Unsupported { operation: &'static str },

    /// Pull requested with no row available
    #[error("no more rows")]
    EndOfSequence,

    /// Bind referenced a name the statement does not contain
    #[error("statement does not contain parameter: {0}")]
    UnknownParameter(String),

    /// Type mismatch between expected and actual values
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Column label not present in the result metadata
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    /// Column index past the end of the row
    #[error("column index {index} out of range (column count {count})")]
    ColumnIndexOutOfRange { index: usize, count: usize },

    /// Parameter position outside `1..=count`
    #[error("parameter index {index} out of range (parameter count {count})")]
    ParameterIndexOutOfRange { index: usize, count: usize },

    /// Query expected at least one row
    #[error("query returned no rows")]
    NoRows,

    /// Invalid operation
    #[error("invalid operation: {message}\nContext: {context}")]
    InvalidOperation { message: String, context: String },

    /// Standard I/O error
    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for all fsql operations.
pub type FsqlResult<T> = Result<T, FsqlError>;

impl FsqlError {
    /// Driver failure with a message.
    pub fn sql(message: impl Into<String>) -> Self {
        FsqlError::Sql {
            message: message.into(),
        }
    }

    /// Rejection raised by the read-only view.
    pub fn unsupported(operation: &'static str) -> Self {
        FsqlError::Unsupported { operation }
    }

    /// Wrap into [`FsqlError::DataAccess`], carrying the original message.
    ///
    /// An error that already is a data-access failure is returned as is.
    pub fn into_data_access(self) -> Self {
        match self {
            FsqlError::DataAccess { .. } => self,
            other => FsqlError::DataAccess {
                message: other.to_string(),
                source: Box::new(other),
            },
        }
    }

    pub fn is_data_access(&self) -> bool {
        matches!(self, FsqlError::DataAccess { .. })
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, FsqlError::Unsupported { .. })
    }

    /// The innermost error behind any number of data-access wrappers.
    pub fn root_cause(&self) -> &FsqlError {
        match self {
            FsqlError::DataAccess { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

// From 구현들
impl From<serde_json::Error> for FsqlError {
    fn from(err: serde_json::Error) -> Self {
        FsqlError::Serialization(err.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for FsqlError {
    fn from(err: rusqlite::Error) -> Self {
        FsqlError::Driver {
            source: Box::new(err),
        }
    }
}
