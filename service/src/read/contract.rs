//! [`Contract`] read model definition.

use common::Date;

#[cfg(doc)]
use crate::domain::Contract;

/// Wrapper around [`Contract`] indicating that it [`is_active()`].
///
/// [`is_active()`]: Contract::is_active
#[derive(Clone, Copy, Debug)]
pub struct Active<T>(pub T);

/// Selector of active [`Contract`]s whose end [`Date`] is strictly before
/// the wrapped one, ordered by their end [`Date`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EndingBefore(pub Date);

/// Numbers of [`Contract`]s grouped by their [`contract::Status`].
///
/// [`contract::Status`]: crate::domain::contract::Status
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Counts {
    /// Number of active [`Contract`]s.
    pub active: u32,

    /// Number of expired [`Contract`]s.
    pub expired: u32,

    /// Number of terminated [`Contract`]s.
    pub terminated: u32,
}

pub mod list {
    //! [`Contract`]s list definitions.

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::{
        domain::{contract, student},
        read::SearchQuery,
    };
    #[cfg(doc)]
    use crate::domain::{Contract, Room, Student};

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = contract::Id;

    /// Cursor pointing to a specific [`Contract`] in a list.
    pub type Cursor = contract::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// [`SearchQuery`] to fuzzy match against [`contract::Number`], the
        /// [`Student`] number and name, the [`Room`] number and its building
        /// name.
        pub search: Option<SearchQuery>,

        /// [`contract::Status`] to filter by.
        pub status: Option<contract::Status>,

        /// ID of the [`Student`] to list [`Contract`]s of.
        pub student_id: Option<student::Id>,
    }

    /// Total count of [`Contract`]s.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}
