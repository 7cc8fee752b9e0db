//! [`Database`]-related implementations.

#[cfg(any(test, feature = "memory"))]
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(any(test, feature = "memory"))]
pub use self::memory::Memory;
#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// Name of the unique constraint allowing a single active contract per room.
pub const ACTIVE_ROOM_CONTRACT: &str = "contracts_active_room_idx";

/// Name of the unique constraint allowing a single active contract per
/// student.
pub const ACTIVE_STUDENT_CONTRACT: &str = "contracts_active_student_idx";

/// Name of the unique constraint on user logins.
pub const USER_LOGIN: &str = "users_login_key";

/// Name of the unique constraint on student numbers.
pub const STUDENT_NUMBER: &str = "students_number_key";

/// Name of the unique constraint allowing a single student profile per user.
pub const STUDENT_USER: &str = "students_user_id_key";

/// Name of the unique constraint on room numbers within a building.
pub const ROOM_NUMBER: &str = "rooms_building_id_number_key";

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// [`Memory`] error.
    #[cfg(any(test, feature = "memory"))]
    Memory(memory::Error),

    /// [`Postgres`] error.
    #[cfg(feature = "postgres")]
    Postgres(postgres::Error),
}

impl Error {
    /// Checks whether this [`Error`] is a violation of the unique constraint
    /// with the provided name (or of any unique constraint, if [`None`]).
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            #[cfg(any(test, feature = "memory"))]
            Self::Memory(e) => e.is_unique_violation(constraint),
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_unique_violation(constraint),
        }
    }
}
