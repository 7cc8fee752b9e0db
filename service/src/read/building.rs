//! [`Building`] read model definition.

use crate::{domain::Building, read::room};

/// [`Building`] along with the statistics of its [`Room`]s.
///
/// [`Room`]: crate::domain::Room
#[derive(Clone, Debug)]
pub struct Occupancy {
    /// [`Building`] the statistics is gathered for.
    pub building: Building,

    /// [`room::Counts`] of the [`Building`].
    pub rooms: room::Counts,
}

pub mod list {
    //! [`Building`]s list definitions.

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::{domain::building, read::SearchQuery};
    #[cfg(doc)]
    use crate::domain::Building;

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = building::Id;

    /// Cursor pointing to a specific [`Building`] in a list.
    pub type Cursor = building::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// [`SearchQuery`] to fuzzy match against [`building::Name`] and
        /// [`building::Address`].
        pub search: Option<SearchQuery>,
    }

    /// Total count of [`Building`]s.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}
