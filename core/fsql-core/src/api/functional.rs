//! Fallible functional building blocks
//!
//! Supplier, function, predicate and consumer shapes whose calls may fail
//! with [`FsqlError`]. Any closure of the matching signature implements the
//! trait. Composition returns plain closures, so results chain with `?`.
//!
//! `data_access()` wraps every failure of the adapted value into
//! [`FsqlError::DataAccess`].
//!
//! A closure taking `&T` and returning `FsqlResult<()>` is both a consumer
//! and a function; call shared method names through the trait
//! (`SqlConsumer::and_then(first, second)`) in that case.

use crate::error::{FsqlError, FsqlResult};

/// Produces a value, e.g. a connection or an open cursor.
pub trait SqlSupplier<T> {
    fn get(&self) -> FsqlResult<T>;

    fn data_access(self) -> impl Fn() -> FsqlResult<T>
    where
        Self: Sized,
    {
        move || self.get().map_err(FsqlError::into_data_access)
    }
}

impl<T, F> SqlSupplier<T> for F
where
    F: Fn() -> FsqlResult<T>,
{
    fn get(&self) -> FsqlResult<T> {
        self()
    }
}

/// Maps `T` to `R`.
pub trait SqlFunction<T, R> {
    fn apply(&self, value: T) -> FsqlResult<R>;

    /// `self`, then `after`.
    fn and_then<V, G>(self, after: G) -> impl Fn(T) -> FsqlResult<V>
    where
        Self: Sized,
        G: SqlFunction<R, V>,
    {
        move |value| after.apply(self.apply(value)?)
    }

    /// `before`, then `self`.
    fn compose<V, G>(self, before: G) -> impl Fn(V) -> FsqlResult<R>
    where
        Self: Sized,
        G: SqlFunction<V, T>,
    {
        move |value| self.apply(before.apply(value)?)
    }

    fn data_access(self) -> impl Fn(T) -> FsqlResult<R>
    where
        Self: Sized,
    {
        move |value| self.apply(value).map_err(FsqlError::into_data_access)
    }
}

impl<T, R, F> SqlFunction<T, R> for F
where
    F: Fn(T) -> FsqlResult<R>,
{
    fn apply(&self, value: T) -> FsqlResult<R> {
        self(value)
    }
}

/// Function that returns its input.
pub fn identity<T>() -> impl Fn(T) -> FsqlResult<T> {
    Ok
}

/// Tests a value.
pub trait SqlPredicate<T: ?Sized> {
    fn test(&self, value: &T) -> FsqlResult<bool>;

    /// Short-circuits: `other` is not evaluated when `self` is false.
    fn and<P>(self, other: P) -> impl Fn(&T) -> FsqlResult<bool>
    where
        Self: Sized,
        P: SqlPredicate<T>,
    {
        move |value: &T| Ok(self.test(value)? && other.test(value)?)
    }

    /// Short-circuits: `other` is not evaluated when `self` is true.
    fn or<P>(self, other: P) -> impl Fn(&T) -> FsqlResult<bool>
    where
        Self: Sized,
        P: SqlPredicate<T>,
    {
        move |value: &T| Ok(self.test(value)? || other.test(value)?)
    }

    fn negate(self) -> impl Fn(&T) -> FsqlResult<bool>
    where
        Self: Sized,
    {
        move |value: &T| Ok(!self.test(value)?)
    }

    fn data_access(self) -> impl Fn(&T) -> FsqlResult<bool>
    where
        Self: Sized,
    {
        move |value: &T| self.test(value).map_err(FsqlError::into_data_access)
    }
}

impl<T: ?Sized, F> SqlPredicate<T> for F
where
    F: Fn(&T) -> FsqlResult<bool>,
{
    fn test(&self, value: &T) -> FsqlResult<bool> {
        self(value)
    }
}

/// Predicate that holds for values equal to `target`.
pub fn is_equal<T: PartialEq>(target: T) -> impl Fn(&T) -> FsqlResult<bool> {
    move |value: &T| Ok(*value == target)
}

/// Accepts a value for its side effect.
pub trait SqlConsumer<T: ?Sized> {
    fn accept(&self, value: &T) -> FsqlResult<()>;

    /// `self`, then `after`; `after` is skipped when `self` fails.
    fn and_then<C>(self, after: C) -> impl Fn(&T) -> FsqlResult<()>
    where
        Self: Sized,
        C: SqlConsumer<T>,
    {
        move |value: &T| {
            self.accept(value)?;
            after.accept(value)
        }
    }

    fn data_access(self) -> impl Fn(&T) -> FsqlResult<()>
    where
        Self: Sized,
    {
        move |value: &T| self.accept(value).map_err(FsqlError::into_data_access)
    }
}

impl<T: ?Sized, F> SqlConsumer<T> for F
where
    F: Fn(&T) -> FsqlResult<()>,
{
    fn accept(&self, value: &T) -> FsqlResult<()> {
        self(value)
    }
}
