//! [`Room`] read model definition.

use common::Percent;

#[cfg(doc)]
use crate::domain::Room;

/// Numbers of [`Room`]s grouped by their [`room::Status`].
///
/// [`room::Status`]: crate::domain::room::Status
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Counts {
    /// Total number of [`Room`]s.
    pub total: u32,

    /// Number of available [`Room`]s.
    pub available: u32,

    /// Number of occupied [`Room`]s.
    pub occupied: u32,

    /// Number of [`Room`]s under maintenance.
    pub maintenance: u32,
}

impl Counts {
    /// Returns the share of occupied [`Room`]s.
    ///
    /// Zero if there are no [`Room`]s at all.
    #[must_use]
    pub fn occupancy(&self) -> Percent {
        Percent::ratio(self.occupied, self.total)
    }

    /// Returns the number of [`Room`]s not being occupied, regardless of
    /// whether they can be booked right now.
    #[must_use]
    pub fn unoccupied(&self) -> u32 {
        self.total.saturating_sub(self.occupied)
    }
}

pub mod list {
    //! [`Room`]s list definitions.

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::{
        domain::{building, room},
        read::SearchQuery,
    };
    #[cfg(doc)]
    use crate::domain::{Building, Room, RoomType};

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = room::Id;

    /// Cursor pointing to a specific [`Room`] in a list.
    pub type Cursor = room::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// [`SearchQuery`] to fuzzy match against [`room::Number`], the
        /// [`Building`] name and the [`RoomType`] name.
        pub search: Option<SearchQuery>,

        /// [`room::Status`] to filter by.
        pub status: Option<room::Status>,

        /// ID of the [`Building`] to filter by.
        pub building_id: Option<building::Id>,
    }

    /// Total count of [`Room`]s.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}
