//! In-memory [`Database`] implementation.
//!
//! Keeps all the rows in process memory and emulates the transactional
//! guarantees the [`Service`] relies on: writes of a transaction stay
//! invisible to others until committed, row locks are held until commit (or
//! drop) of the transaction, and unique constraints are checked on every
//! write becoming visible.
//!
//! [`Service`]: crate::Service

mod impls;

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use derive_more::{Display, Error as StdError};
use tokio::{
    sync::{Mutex as RowLock, OwnedMutexGuard},
    task,
};
use tracerr::Traced;
use uuid::Uuid;

use crate::{
    domain::{
        building, contract, payment, room, room_type, student, user, Building,
        Contract, Payment, Room, RoomType, Student, User,
    },
    infra::database,
};
#[cfg(doc)]
use crate::infra::Database;

/// In-memory [`Database`].
#[derive(Clone, Debug, Default)]
pub struct Memory<C = NonTx> {
    /// Rows and locks shared between all the clients of this [`Memory`].
    shared: Arc<Shared>,

    /// [`Connection`] this client operates through.
    conn: C,
}

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl Memory {
    /// Modifies the committed [`State`] directly, skipping the constraint
    /// checks.
    pub(crate) fn write_unchecked(&self, f: impl FnOnce(&mut State)) {
        f(&mut lock(&self.shared.state));
    }
}

/// Kind of a [`Memory`] client connection.
pub trait Connection {
    /// Returns the [`Tx`] of this [`Connection`], if it's transactional.
    fn tx(&self) -> Option<&Tx>;
}

/// Non-transactional [`Memory`] connection, committing each write
/// immediately.
#[derive(Clone, Copy, Debug, Default)]
pub struct NonTx;

impl Connection for NonTx {
    fn tx(&self) -> Option<&Tx> {
        None
    }
}

/// Transactional [`Memory`] connection.
#[derive(Clone, Debug, Default)]
pub struct Tx(Arc<Journal>);

impl Connection for Tx {
    fn tx(&self) -> Option<&Tx> {
        Some(self)
    }
}

/// Single write operation over the [`State`].
type Write = Arc<dyn Fn(&mut State) + Send + Sync>;

/// Key of a locked row: its table name and ID.
type RowKey = (&'static str, Uuid);

/// Pending writes and held row locks of a [`Tx`].
#[derive(Default, derive_more::Debug)]
struct Journal {
    /// Writes to be applied on commit, in their order.
    #[debug(skip)]
    writes: Mutex<Vec<Write>>,

    /// Row locks held until commit.
    #[debug(skip)]
    guards: Mutex<HashMap<RowKey, OwnedMutexGuard<()>>>,
}

/// Data shared between all the clients of a [`Memory`] database.
#[derive(Debug, Default)]
struct Shared {
    /// Committed [`State`].
    state: Mutex<State>,

    /// Row locks, created lazily.
    locks: Mutex<HashMap<RowKey, Arc<RowLock<()>>>>,
}

/// Rows of all the tables.
#[derive(Clone, Debug, Default)]
pub(crate) struct State {
    pub(crate) users: HashMap<user::Id, User>,
    pub(crate) buildings: HashMap<building::Id, Building>,
    pub(crate) room_types: HashMap<room_type::Id, RoomType>,
    pub(crate) rooms: HashMap<room::Id, Room>,
    pub(crate) students: HashMap<student::Id, Student>,
    pub(crate) contracts: HashMap<contract::Id, Contract>,
    pub(crate) payments: HashMap<payment::Id, Payment>,
}

impl State {
    /// Checks the unique constraints over all the rows.
    fn check(&self) -> Result<(), Error> {
        use database::{
            ACTIVE_ROOM_CONTRACT, ACTIVE_STUDENT_CONTRACT, ROOM_NUMBER,
            STUDENT_NUMBER, STUDENT_USER, USER_LOGIN,
        };

        fn unique<T: Eq + std::hash::Hash>(
            constraint: &'static str,
            keys: impl IntoIterator<Item = T>,
        ) -> Result<(), Error> {
            let mut seen = HashSet::new();
            keys.into_iter()
                .all(|k| seen.insert(k))
                .then_some(())
                .ok_or(Error::UniqueViolation(constraint))
        }

        unique(USER_LOGIN, self.users.values().map(|u| u.login.as_ref()))?;
        unique(STUDENT_NUMBER, self.students.values().map(|s| &s.number))?;
        unique(STUDENT_USER, self.students.values().map(|s| s.user_id))?;
        unique(
            ROOM_NUMBER,
            self.rooms.values().map(|r| (r.building_id, &r.number)),
        )?;

        let active = || self.contracts.values().filter(|c| c.is_active());
        unique(ACTIVE_ROOM_CONTRACT, active().map(|c| c.room_id))?;
        unique(ACTIVE_STUDENT_CONTRACT, active().map(|c| c.student_id))
    }
}

/// Locks the provided [`Mutex`] ignoring its poisoning.
///
/// [`State`] is replaced atomically, so it never stays half-written.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    /// Applies the provided `writes` to the committed [`State`], if the
    /// result satisfies all the constraints.
    fn apply(&self, writes: &[Write]) -> Result<(), Error> {
        let mut state = lock(&self.state);
        let mut next = state.clone();
        for write in writes {
            write(&mut next);
        }
        next.check()?;
        *state = next;
        Ok(())
    }
}

impl<C: Connection> Memory<C> {
    /// Reads the [`State`] as seen by this client.
    async fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        // Gives concurrent transactions a chance to interleave, like they do
        // on network round-trips to a real database.
        task::yield_now().await;

        let committed = lock(&self.shared.state);
        let writes = self.conn.tx().map(Tx::writes).unwrap_or_default();
        if writes.is_empty() {
            return f(&committed);
        }

        let mut state = committed.clone();
        drop(committed);
        for write in &writes {
            write(&mut state);
        }
        f(&state)
    }

    /// Writes to the [`State`] as seen by this client.
    ///
    /// Outside a transaction the write is committed immediately.
    fn write(
        &self,
        write: impl Fn(&mut State) + Send + Sync + 'static,
    ) -> Result<(), Traced<database::Error>> {
        let write: Write = Arc::new(write);
        match self.conn.tx() {
            Some(tx) => {
                lock(&tx.0.writes).push(write);
                Ok(())
            }
            None => self
                .shared
                .apply(&[write])
                .map_err(tracerr::from_and_wrap!(=> database::Error)),
        }
    }

    /// Locks the row with the provided `id` in the provided `table` until
    /// the transaction ends.
    ///
    /// No-op outside a transaction.
    async fn lock_row(&self, table: &'static str, id: Uuid) {
        let Some(tx) = self.conn.tx() else {
            return;
        };
        let key = (table, id);
        if lock(&tx.0.guards).contains_key(&key) {
            return;
        }

        let row = Arc::clone(lock(&self.shared.locks).entry(key).or_default());
        let guard = row.lock_owned().await;
        drop(lock(&tx.0.guards).insert(key, guard));
    }
}

impl Memory<Tx> {
    /// Commits all the pending writes of this transaction and releases its
    /// row locks.
    fn commit(&self) -> Result<(), Traced<database::Error>> {
        let writes = std::mem::take(&mut *lock(&self.conn.0.writes));
        let result = self
            .shared
            .apply(&writes)
            .map_err(tracerr::from_and_wrap!(=> database::Error));
        lock(&self.conn.0.guards).clear();
        result
    }
}

impl Tx {
    /// Returns the pending writes of this [`Tx`].
    fn writes(&self) -> Vec<Write> {
        lock(&self.0.writes).clone()
    }
}

/// [`Memory`] database error.
#[derive(Debug, Display, StdError)]
pub enum Error {
    /// Unique constraint is violated.
    #[display("Unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Checks whether this [`Error`] is a violation of the unique constraint
    /// with the provided name (or of any unique constraint, if [`None`]).
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::UniqueViolation(c) => constraint.map_or(true, |n| n == *c),
        }
    }
}
