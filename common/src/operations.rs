//! Abstract operations executed by [`Handler`]s.
//!
//! Operations carry no behavior on their own: their meaning is defined by
//! the [`Handler`] implementation accepting them.

use std::marker::PhantomData;

use crate::Handler;

/// Operation to store a new value.
#[derive(Clone, Copy, Debug)]
pub struct Insert<T>(pub T);

/// Operation to overwrite an already stored value.
#[derive(Clone, Copy, Debug)]
pub struct Update<T>(pub T);

/// Operation to remove a stored value.
#[derive(Clone, Copy, Debug)]
pub struct Delete<T>(pub T);

/// Operation to read a value.
#[derive(Clone, Copy, Debug)]
pub struct Select<T>(pub T);

/// Operation to exclusively lock a value until the end of the current
/// transaction.
#[derive(Clone, Copy, Debug)]
pub struct Lock<T>(pub T);

/// Operation to start a long-running process.
#[derive(Clone, Copy, Debug)]
pub struct Start<T>(pub T);

/// Operation to perform a single run of some process.
#[derive(Clone, Copy, Debug)]
pub struct Perform<T>(pub T);

/// Operation to open a new transaction.
#[derive(Clone, Copy, Debug)]
pub struct Transact;

/// [`Transact`]ed value.
pub type Transacted<T> = <T as Handler<Transact>>::Ok;

/// Operation to commit an opened transaction.
#[derive(Clone, Copy, Debug)]
pub struct Commit;

/// Selector of `W` by the `B` value.
#[derive(Clone, Copy, Debug)]
pub struct By<W, B> {
    /// Type of the value being selected.
    _what: PhantomData<W>,

    /// Value being selected by.
    by: B,
}

impl<W, B> By<W, B> {
    /// Creates a new [`By`] selector out of the provided value.
    #[must_use]
    pub fn new(by: B) -> Self {
        Self {
            _what: PhantomData,
            by,
        }
    }

    /// Unwraps the value this [`By`] selects by.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.by
    }
}
