//! Lazy row iterator
//!
//! The cursor is acquired when the iterator is built, so connection and
//! prepare failures reach the caller right away. Rows are fetched one per
//! pull. Every way out of the iterator (exhaustion, an advance failure, a
//! failing row function, an explicit close, a drop) goes through the same
//! release of the owned-resource chain.
//!
//! The row function runs while the iterator is mutably borrowed, so it can
//! never pull from the iterator that called it.

use super::resources::QueryCursor;
use crate::api::functional::SqlSupplier;
use crate::driver::{Connection, CursorOf, ReadOnlyRow, ResultMetadata, RowCursor};
use crate::error::{FsqlError, FsqlResult};
use std::iter::FusedIterator;
use std::marker::PhantomData;
use tracing::trace;

/// Peek state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// The cursor has not been advanced for the next logical row
    Unpeeked,
    /// The cursor sits on a row that was not handed out yet
    RowAvailable,
    /// No more rows; resources released
    Exhausted,
    /// Closed explicitly or after a failure; resources released
    Closed,
}

/// Pull-based sequence of transformed rows over one cursor.
pub struct RowIterator<K, F, T>
where
    K: Connection,
{
    resources: QueryCursor<K>,
    row_fn: F,
    state: State,
    _marker: PhantomData<fn() -> T>,
}

impl<K, F, T> RowIterator<K, F, T>
where
    K: Connection,
    F: FnMut(&ReadOnlyRow<'_, CursorOf<K>>) -> FsqlResult<T>,
{
    /// Acquire a cursor from `supplier` now; rows are fetched lazily.
    pub fn new<P>(supplier: &P, row_fn: F) -> FsqlResult<Self>
    where
        P: SqlSupplier<QueryCursor<K>> + ?Sized,
    {
        let resources = supplier.get()?;
        Ok(Self::from_cursor(resources, row_fn))
    }

    /// Wrap a cursor that is already open.
    pub fn from_cursor(resources: QueryCursor<K>, row_fn: F) -> Self {
        Self {
            resources,
            row_fn,
            state: State::Unpeeked,
            _marker: PhantomData,
        }
    }

    /// Whether another row is available.
    ///
    /// Advances the cursor at most once per row; repeated calls before
    /// [`pull`](Self::pull) return the cached answer.
    pub fn has_more(&mut self) -> FsqlResult<bool> {
        match self.state {
            State::RowAvailable => Ok(true),
            State::Exhausted | State::Closed => Ok(false),
            State::Unpeeked => match self.resources.cursor_mut().advance() {
                Ok(true) => {
                    self.state = State::RowAvailable;
                    Ok(true)
                }
                Ok(false) => {
                    trace!(target: crate::logging::STREAM, "cursor exhausted");
                    self.finish(State::Exhausted);
                    Ok(false)
                }
                Err(e) => {
                    self.finish(State::Closed);
                    Err(e.into_data_access())
                }
            },
        }
    }

    /// Transform the next row.
    ///
    /// Fails with [`FsqlError::EndOfSequence`] when no row is left. A failing
    /// row function closes the iterator and surfaces as
    /// [`FsqlError::DataAccess`], except a rejection from the read-only view
    /// ([`FsqlError::Unsupported`]), which is returned unwrapped.
    pub fn pull(&mut self) -> FsqlResult<T> {
        if !self.has_more()? {
            return Err(FsqlError::EndOfSequence);
        }
        self.state = State::Unpeeked;

        let row = ReadOnlyRow::new(self.resources.cursor());
        match (self.row_fn)(&row) {
            Ok(value) => Ok(value),
            Err(e) => {
                self.finish(State::Closed);
                if e.is_unsupported() {
                    return Err(e);
                }
                Err(e.into_data_access())
            }
        }
    }

    /// Release the owned-resource chain. Safe to call repeatedly and after
    /// exhaustion.
    pub fn close(&mut self) {
        if self.state != State::Closed {
            self.finish(State::Closed);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    /// No more rows, whether exhausted or closed.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Exhausted | State::Closed)
    }

    /// Column layout of the underlying cursor.
    pub fn metadata(&self) -> &ResultMetadata {
        self.resources.cursor().metadata()
    }

    fn finish(&mut self, state: State) {
        self.state = state;
        self.resources.release();
    }
}

impl<K, F, T> Iterator for RowIterator<K, F, T>
where
    K: Connection,
    F: FnMut(&ReadOnlyRow<'_, CursorOf<K>>) -> FsqlResult<T>,
{
    type Item = FsqlResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_more() {
            Ok(true) => Some(self.pull()),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl<K, F, T> FusedIterator for RowIterator<K, F, T>
where
    K: Connection,
    F: FnMut(&ReadOnlyRow<'_, CursorOf<K>>) -> FsqlResult<T>,
{
}
