//! [`Student`] read model definition.
//!
//! [`Student`]: crate::domain::Student

pub mod list {
    //! [`Student`]s list definitions.

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::{domain::student, read::SearchQuery};
    #[cfg(doc)]
    use crate::domain::Student;

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = student::Id;

    /// Cursor pointing to a specific [`Student`] in a list.
    pub type Cursor = student::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// [`SearchQuery`] to fuzzy match against [`student::Number`],
        /// [`student::FullName`], [`student::University`] and
        /// [`student::Faculty`].
        pub search: Option<SearchQuery>,
    }

    /// Total count of [`Student`]s.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}
