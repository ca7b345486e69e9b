//! Streaming adapter over [`RowIterator`]
//!
//! A [`RowStream`] is single-pass and finite. When the consumer is done
//! (rows exhausted, [`RowStream::close`], or the stream dropped) the iterator
//! is closed and the registered closing hooks run once. Cleanup failures are
//! logged and never replace a result already produced.
//!
//! Hooks must be `Send`, so a stream is `Send` whenever its driver and row
//! function are and can be handed to a worker thread. It is never `Sync`:
//! one stream is consumed by one thread at a time.

use super::iterator::RowIterator;
use crate::api::functional::SqlConsumer;
use crate::driver::{Connection, CursorOf, ReadOnlyRow, ResultMetadata};
use crate::error::FsqlResult;
use std::iter::FusedIterator;
use tracing::{debug, error};

type CloseHook = Box<dyn FnOnce() -> FsqlResult<()> + Send>;

/// Lazy, single-pass stream of transformed rows.
pub struct RowStream<K, F, T>
where
    K: Connection,
    F: FnMut(&ReadOnlyRow<'_, CursorOf<K>>) -> FsqlResult<T>,
{
    iterator: RowIterator<K, F, T>,
    hooks: Vec<CloseHook>,
    closed: bool,
}

impl<K, F, T> RowStream<K, F, T>
where
    K: Connection,
    F: FnMut(&ReadOnlyRow<'_, CursorOf<K>>) -> FsqlResult<T>,
{
    pub fn new(iterator: RowIterator<K, F, T>) -> Self {
        Self {
            iterator,
            hooks: Vec::new(),
            closed: false,
        }
    }

    /// Register an extra closing hook. Hooks run in registration order.
    pub fn on_close<H>(mut self, hook: H) -> Self
    where
        H: FnOnce() -> FsqlResult<()> + Send + 'static,
    {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Peek without consuming.
    pub fn has_more(&mut self) -> FsqlResult<bool> {
        self.iterator.has_more()
    }

    pub fn metadata(&self) -> &ResultMetadata {
        self.iterator.metadata()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Close the iterator and run the closing hooks. Later calls do nothing.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.iterator.close();

        for (index, hook) in self.hooks.drain(..).enumerate() {
            if let Err(e) = hook() {
                error!(
                    target: crate::logging::STREAM,
                    hook = index,
                    error = %e,
                    "close hook failed"
                );
            }
        }
        debug!(target: crate::logging::STREAM, "row stream closed");
    }

    /// Feed every row to `consumer`, then close.
    pub fn consume<C>(mut self, consumer: &C) -> FsqlResult<()>
    where
        C: SqlConsumer<T> + ?Sized,
    {
        for item in &mut self {
            consumer.accept(&item?)?;
        }
        self.close();
        Ok(())
    }

    /// Collect all rows, stopping at the first failure.
    pub fn collect_rows(mut self) -> FsqlResult<Vec<T>> {
        let rows = (&mut self).collect::<FsqlResult<Vec<T>>>();
        self.close();
        rows
    }
}

impl<K, F, T> Iterator for RowStream<K, F, T>
where
    K: Connection,
    F: FnMut(&ReadOnlyRow<'_, CursorOf<K>>) -> FsqlResult<T>,
{
    type Item = FsqlResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }
        let item = self.iterator.next();
        if item.is_none() {
            self.close();
        }
        item
    }
}

impl<K, F, T> FusedIterator for RowStream<K, F, T>
where
    K: Connection,
    F: FnMut(&ReadOnlyRow<'_, CursorOf<K>>) -> FsqlResult<T>,
{
}

impl<K, F, T> Drop for RowStream<K, F, T>
where
    K: Connection,
    F: FnMut(&ReadOnlyRow<'_, CursorOf<K>>) -> FsqlResult<T>,
{
    fn drop(&mut self) {
        self.close();
    }
}
