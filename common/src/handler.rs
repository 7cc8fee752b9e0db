//! [`Handler`] abstractions.

use std::future::Future;

/// Executable handler of `Args`.
///
/// Commands, queries, database operations and background tasks are all
/// modeled as [`Handler`]s of different argument types.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Handles the provided `args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
