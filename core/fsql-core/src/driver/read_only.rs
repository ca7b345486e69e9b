//! Forward-only, read-only cursor view
//!
//! Row functions never see the raw cursor. They receive a [`ReadOnlyRow`]
//! that forwards every read to the cursor and rejects every positioning or
//! mutation call with [`FsqlError::Unsupported`], leaving the cursor where
//! it was.

use super::cursor::{CursorPosition, ResultMetadata, RowCursor};
use super::Closeable;
use crate::error::{FsqlError, FsqlResult};
use crate::value::SqlValue;

/// Read-only view over the current row of a cursor.
pub struct ReadOnlyRow<'c, C: RowCursor + ?Sized> {
    cursor: &'c C,
}

impl<'c, C: RowCursor + ?Sized> ReadOnlyRow<'c, C> {
    pub fn new(cursor: &'c C) -> Self {
        Self { cursor }
    }
}

impl<C: RowCursor + ?Sized> Closeable for ReadOnlyRow<'_, C> {
    fn close(&mut self) -> FsqlResult<()> {
        Err(FsqlError::unsupported("close"))
    }

    fn is_closed(&self) -> bool {
        self.cursor.is_closed()
    }
}

impl<C: RowCursor + ?Sized> RowCursor for ReadOnlyRow<'_, C> {
    fn metadata(&self) -> &ResultMetadata {
        self.cursor.metadata()
    }

    fn value(&self, index: usize) -> FsqlResult<SqlValue> {
        self.cursor.value(index)
    }

    fn was_null(&self) -> bool {
        self.cursor.was_null()
    }

    fn row_number(&self) -> u64 {
        self.cursor.row_number()
    }

    fn is_before_first(&self) -> bool {
        self.cursor.is_before_first()
    }

    fn is_after_last(&self) -> bool {
        self.cursor.is_after_last()
    }

    fn advance(&mut self) -> FsqlResult<bool> {
        Err(FsqlError::unsupported("advance"))
    }

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
