//! [`Query`] collection related to [`Room`]s.

use common::operations::By;

use crate::{
    domain::{room, Room},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Room`] by its [`room::Id`].
pub type ById = DatabaseQuery<By<Option<Room>, room::Id>>;

/// Queries a list of [`Room`]s.
pub type List =
    DatabaseQuery<By<read::room::list::Page, read::room::list::Selector>>;

/// Queries total count of [`Room`]s.
pub type TotalCount = DatabaseQuery<By<read::room::list::TotalCount, ()>>;
