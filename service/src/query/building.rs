//! [`Query`] collection related to [`Building`]s.

use common::operations::By;

use crate::{
    domain::{building, Building},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Building`] by its [`building::Id`].
pub type ById = DatabaseQuery<By<Option<Building>, building::Id>>;

/// Queries a list of [`Building`]s.
pub type List = DatabaseQuery<
    By<read::building::list::Page, read::building::list::Selector>,
>;

/// Queries total count of [`Building`]s.
pub type TotalCount = DatabaseQuery<By<read::building::list::TotalCount, ()>>;
