//! [`Payment`] read model definition.

use common::{Date, Money};

use crate::domain::student;
#[cfg(doc)]
use crate::domain::{Payment, Student};

/// Statistics of [`Payment`]s.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Stats {
    /// Number of pending [`Payment`]s.
    pub pending: u32,

    /// Number of paid [`Payment`]s.
    pub paid: u32,

    /// Number of pending [`Payment`]s being overdue.
    pub overdue: u32,

    /// Sum of paid [`Payment`]s in [`Currency::Vnd`].
    ///
    /// [`Currency::Vnd`]: common::money::Currency::Vnd
    pub paid_amount: Money,
}

/// Scope to gather [`Stats`] within.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StatsScope {
    /// ID of the [`Student`] to gather [`Stats`] of, if any.
    ///
    /// [`None`] means all the [`Payment`]s.
    pub student_id: Option<student::Id>,

    /// [`Date`] to detect overdue [`Payment`]s against.
    pub today: Date,
}

/// Selector of pending [`Payment`]s due strictly before `today`, the most
/// recently due first.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Overdue {
    /// Current [`Date`].
    pub today: Date,

    /// Maximum number of [`Payment`]s to select.
    pub limit: u16,
}

/// Selector of pending [`Payment`]s due within the inclusive `[from, until]`
/// range, the earliest due first.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Upcoming {
    /// First [`Date`] of the range.
    pub from: Date,

    /// Last [`Date`] of the range.
    pub until: Date,

    /// Maximum number of [`Payment`]s to select.
    pub limit: u16,
}

pub mod list {
    //! [`Payment`]s list definitions.

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::domain::{payment, student};
    #[cfg(doc)]
    use crate::domain::{Payment, Student};

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = payment::Id;

    /// Cursor pointing to a specific [`Payment`] in a list.
    pub type Cursor = payment::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// [`payment::Status`] to filter by.
        pub status: Option<payment::Status>,

        /// ID of the [`Student`] to list [`Payment`]s of.
        pub student_id: Option<student::Id>,
    }

    /// Total count of [`Payment`]s.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}
