//! [`Connection`] definitions.

use std::{fmt, future::Future};

use futures::{FutureExt as _, TryFutureExt as _};
use ouroboros::self_referencing;
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{self, postgres};

pub use deadpool_postgres::{
    Client as Pooled, CreatePoolError as PoolCreationError, Pool, PoolError,
};
pub use tokio_postgres::Error;

/// SQL statement executor.
pub trait Connection {
    /// Runs the provided statement with the given parameters, returning all
    /// the resulting rows.
    ///
    /// # Errors
    ///
    /// If the statement fails.
    fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<Vec<Row>, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized;

    /// Runs the provided statement with the given parameters, returning at
    /// most one resulting row.
    ///
    /// # Errors
    ///
    /// If the statement fails or returns more than one row.
    fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<Option<Row>, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized;

    /// Runs the provided statement with the given parameters, returning the
    /// number of affected rows.
    ///
    /// # Errors
    ///
    /// If the statement fails.
    fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<u64, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized;
}

impl Connection for Pooled {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        (**self)
            .query(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        (**self)
            .query_opt(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        (**self)
            .execute(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

/// Open transaction on a [`Pooled`] connection.
///
/// Rolled back on drop, unless [`Transaction::commit()`]ted.
#[self_referencing]
pub struct Transaction {
    /// [`Pooled`] connection the transaction is opened on.
    client: Pooled,

    /// Transaction itself, taken once committed.
    #[borrows(mut client)]
    #[not_covariant]
    tx: Option<deadpool_postgres::Transaction<'this>>,
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = self.with_tx(|tx| tx.is_some());
        f.debug_struct("Transaction")
            .field("open", &open)
            .finish_non_exhaustive()
    }
}

impl Transaction {
    /// Begins a new [`Transaction`] on the provided [`Pooled`] connection.
    ///
    /// # Errors
    ///
    /// If the `BEGIN` statement fails.
    pub async fn begin(
        client: Pooled,
    ) -> Result<Self, Traced<database::Error>> {
        Self::try_new_async_send(client, |c| {
            c.transaction().map_ok(Some).boxed()
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
        .map_err(tracerr::map_from)
    }

    /// Commits this [`Transaction`].
    ///
    /// # Errors
    ///
    /// If the `COMMIT` statement fails, or this [`Transaction`] has been
    /// committed already.
    pub async fn commit(mut self) -> Result<(), Traced<database::Error>> {
        #[expect(
            clippy::redundant_closure_for_method_calls,
            reason = "`Option::take` doesn't fit the invariant lifetime"
        )]
        let tx = self
            .with_tx_mut(|tx| tx.take())
            .ok_or_else(|| tracerr::new!(postgres::Error::TxFinished))
            .map_err(tracerr::map_from)?;
        tx.commit()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    /// Returns the open [`deadpool_postgres::Transaction`].
    fn open(
        &self,
    ) -> Result<&deadpool_postgres::Transaction<'_>, Traced<database::Error>>
    {
        self.with_tx(|tx| tx.as_ref())
            .ok_or_else(|| tracerr::new!(postgres::Error::TxFinished))
            .map_err(tracerr::map_from)
    }
}

impl Connection for Transaction {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.open()?
            .query(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.open()?
            .query_opt(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.open()?
            .execute(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}
