//! [`Database`] implementation backed by PostgreSQL.

mod client;
pub mod connection;
mod fuzz_pattern;
mod impls;

use deadpool_postgres::Runtime;
use derive_more::{Deref, Display, Error as StdError, From};
use tokio_postgres::{error::SqlState, NoTls};
use tracerr::Traced;

use crate::infra::database;
#[cfg(doc)]
use crate::infra::Database;

pub use refinery::embed_migrations;

pub use self::{
    client::{NonTx, Tx},
    connection::Connection,
    fuzz_pattern::FuzzPattern,
};

pub use deadpool_postgres::Config;

/// [`Database`] backed by PostgreSQL.
#[derive(Clone, Copy, Debug, Deref)]
pub struct Postgres<T = NonTx>(T);

impl Postgres {
    /// Creates a new [`Postgres`] database with a connection pool configured
    /// by the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If the [`Config`] is invalid.
    pub fn new(conf: &Config) -> Result<Self, Traced<database::Error>> {
        let pool = conf
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        Ok(Self(NonTx::from_pool(pool)))
    }
}

/// Error of the [`Postgres`] database.
#[derive(Debug, Display, StdError, From)]
pub enum Error {
    /// Statement failed.
    #[display("Statement failed: {_0}")]
    Connection(connection::Error),

    /// [`connection::Pool`] cannot be created.
    #[display("Cannot create `connection::Pool`: {_0}")]
    PoolCreationError(connection::PoolCreationError),

    /// Connection cannot be taken from the [`connection::Pool`].
    #[display("Cannot take a connection from `connection::Pool`: {_0}")]
    PoolError(connection::PoolError),

    /// Transaction is used after being committed.
    #[display("Transaction is committed already")]
    #[from(ignore)]
    TxFinished,
}

impl Error {
    /// Checks whether this [`Error`] is a violation of the unique constraint
    /// with the provided name (or of any unique constraint, if [`None`]).
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        let Self::Connection(e) = self else {
            return false;
        };
        e.code() == Some(&SqlState::UNIQUE_VIOLATION)
            && constraint.map_or(true, |name| {
                e.as_db_error().and_then(|db| db.constraint()) == Some(name)
            })
    }
}
