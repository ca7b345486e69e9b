//! Row cursor capability set
//!
//! A [`RowCursor`] is a stateful, forward-only handle over query results,
//! positioned before the first row until [`RowCursor::advance`] is called.
//! Column indices are 0-based; labels are matched case-insensitively.

use super::Closeable;
use crate::error::{FsqlError, FsqlResult};
use crate::value::{FromValue, SqlValue};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Description of one result column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    pub name: String,
    /// Type as declared by the schema, when the driver knows it
    pub declared_type: Option<String>,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
        }
    }
}

/// Result column layout
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultMetadata {
    columns: Vec<ColumnMetadata>,
}

impl ResultMetadata {
    pub fn new(columns: Vec<ColumnMetadata>) -> Self {
        Self { columns }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(ColumnMetadata::new).collect())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    pub fn column_name(&self, index: usize) -> FsqlResult<&str> {
        self.columns
            .get(index)
            .map(|c| c.name.as_str())
            .ok_or(FsqlError::ColumnIndexOutOfRange {
                index,
                count: self.columns.len(),
            })
    }

    /// First column whose label matches, ignoring ASCII case.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(label))
    }
}

/// Target of a repositioning call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPosition {
    BeforeFirst,
    AfterLast,
    First,
    Last,
    Previous,
    Absolute(i64),
    Relative(i64),
}

/// Stateful, forward-only result cursor.
///
/// Repositioning and mutation calls default to
/// [`FsqlError::Unsupported`]; drivers backing scrollable or updatable
/// results override them.
pub trait RowCursor: Closeable {
    fn metadata(&self) -> &ResultMetadata;

    /// Value of column `index` on the current row.
    fn value(&self, index: usize) -> FsqlResult<SqlValue>;

    /// Whether the last value read was SQL NULL.
    fn was_null(&self) -> bool;

    /// 1-based number of the current row, 0 when not on a row.
    fn row_number(&self) -> u64;

    fn is_before_first(&self) -> bool;

    fn is_after_last(&self) -> bool;

    /// Move to the next row; `false` once the rows are exhausted. Calling it
    /// again after exhaustion keeps returning `false`.
    fn advance(&mut self) -> FsqlResult<bool>;

    fn move_to(&mut self, _position: CursorPosition) -> FsqlResult<bool> {
        Err(FsqlError::unsupported("move_to"))
    }

    fn update_value(&mut self, _index: usize, _value: SqlValue) -> FsqlResult<()> {
        Err(FsqlError::unsupported("update_value"))
    }

    fn insert_row(&mut self) -> FsqlResult<()> {
        Err(FsqlError::unsupported("insert_row"))
    }

    fn update_row(&mut self) -> FsqlResult<()> {
        Err(FsqlError::unsupported("update_row"))
    }

    fn delete_row(&mut self) -> FsqlResult<()> {
        Err(FsqlError::unsupported("delete_row"))
    }

    fn refresh_row(&mut self) -> FsqlResult<()> {
        Err(FsqlError::unsupported("refresh_row"))
    }

    fn cancel_row_updates(&mut self) -> FsqlResult<()> {
        Err(FsqlError::unsupported("cancel_row_updates"))
    }
}

/// Label lookup and typed accessors for every [`RowCursor`].
pub trait RowExt: RowCursor {
    fn column_count(&self) -> usize {
        self.metadata().column_count()
    }

    fn column_index(&self, label: &str) -> FsqlResult<usize> {
        self.metadata()
            .index_of(label)
            .ok_or_else(|| FsqlError::ColumnNotFound(label.to_string()))
    }

    fn value_by_label(&self, label: &str) -> FsqlResult<SqlValue> {
        self.value(self.column_index(label)?)
    }

    fn get<T: FromValue>(&self, index: usize) -> FsqlResult<T> {
        T::from_value(self.value(index)?)
    }

    fn get_by_label<T: FromValue>(&self, label: &str) -> FsqlResult<T> {
        T::from_value(self.value_by_label(label)?)
    }

    fn get_bool(&self, index: usize) -> FsqlResult<bool> {
        self.get(index)
    }

    fn get_i8(&self, index: usize) -> FsqlResult<i8> {
        self.get(index)
    }

    fn get_i16(&self, index: usize) -> FsqlResult<i16> {
        self.get(index)
    }

    fn get_i32(&self, index: usize) -> FsqlResult<i32> {
        self.get(index)
    }

    fn get_u32(&self, index: usize) -> FsqlResult<u32> {
        self.get(index)
    }

    fn get_i64(&self, index: usize) -> FsqlResult<i64> {
        self.get(index)
    }

    fn get_f32(&self, index: usize) -> FsqlResult<f32> {
        self.get(index)
    }

    fn get_f64(&self, index: usize) -> FsqlResult<f64> {
        self.get(index)
    }

    fn get_string(&self, index: usize) -> FsqlResult<String> {
        self.get(index)
    }

    fn get_bytes(&self, index: usize) -> FsqlResult<Vec<u8>> {
        self.get(index)
    }

    fn get_date(&self, index: usize) -> FsqlResult<NaiveDate> {
        self.get(index)
    }

    fn get_time(&self, index: usize) -> FsqlResult<NaiveTime> {
        self.get(index)
    }

    fn get_timestamp(&self, index: usize) -> FsqlResult<NaiveDateTime> {
        self.get(index)
    }
}

impl<C: RowCursor + ?Sized> RowExt for C {}
