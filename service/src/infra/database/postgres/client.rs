//! Postgres database clients.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

/// Non-transactional Postgres database client.
///
/// Every statement runs on a separate connection taken from the
/// [`connection::Pool`].
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] to take connections from.
    pub(crate) pool: connection::Pool,
}

impl NonTx {
    /// Creates a new [`NonTx`] client on top of the provided
    /// [`connection::Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: connection::Pool) -> Self {
        Self { pool }
    }

    /// Takes a [`connection::Pooled`] connection from the
    /// [`connection::Pool`].
    pub(crate) async fn pooled(
        &self,
    ) -> Result<connection::Pooled, Traced<database::Error>> {
        self.pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

impl Connection for NonTx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.pooled().await?.query(stmt, params).await
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.pooled().await?.query_opt(stmt, params).await
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.pooled().await?.exec(stmt, params).await
    }
}

/// Transactional Postgres database client.
///
/// The underlying [`connection::Transaction`] is begun lazily on the first
/// statement, and is shared between all the clones of this [`Tx`].
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`NonTx`] client to take a connection from.
    origin: NonTx,

    /// Lazily begun [`connection::Transaction`].
    tx: Arc<Mutex<Option<connection::Transaction>>>,
}

impl Tx {
    /// Creates a new [`Tx`] client out of the provided [`NonTx`] one.
    #[must_use]
    pub fn from_non_tx(origin: NonTx) -> Self {
        Self {
            origin,
            tx: Arc::default(),
        }
    }

    /// Returns the [`connection::Transaction`] of this [`Tx`], beginning it if
    /// it hasn't been yet.
    async fn begun(
        &self,
    ) -> Result<
        MutexGuard<'_, Option<connection::Transaction>>,
        Traced<database::Error>,
    > {
        let mut tx = self.tx.lock().await;
        if tx.is_none() {
            let pooled = self.origin.pooled().await?;
            *tx = Some(
                connection::Transaction::begin(pooled)
                    .await
                    .map_err(tracerr::wrap!())?,
            );
        }
        Ok(tx)
    }

    /// Commits this [`Tx`].
    ///
    /// Nothing happens if no statement has been run in this [`Tx`].
    ///
    /// # Errors
    ///
    /// If the `COMMIT` statement fails.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Some(tx) = self.tx.lock().await.take() else {
            return Ok(());
        };
        tx.commit().await.map_err(tracerr::wrap!())
    }
}

impl Connection for Tx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let tx = self.begun().await?;
        match tx.as_ref() {
            Some(tx) => tx.query(stmt, params).await,
            None => Err(tracerr::new!(postgres::Error::TxFinished))
                .map_err(tracerr::map_from),
        }
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let tx = self.begun().await?;
        match tx.as_ref() {
            Some(tx) => tx.query_opt(stmt, params).await,
            None => Err(tracerr::new!(postgres::Error::TxFinished))
                .map_err(tracerr::map_from),
        }
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let tx = self.begun().await?;
        match tx.as_ref() {
            Some(tx) => tx.exec(stmt, params).await,
            None => Err(tracerr::new!(postgres::Error::TxFinished))
                .map_err(tracerr::map_from),
        }
    }
}
