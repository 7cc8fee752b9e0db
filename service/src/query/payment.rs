//! [`Query`] collection related to [`Payment`]s.

use common::operations::By;

use crate::{
    domain::{payment, Payment},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Payment`] by its [`payment::Id`].
pub type ById = DatabaseQuery<By<Option<Payment>, payment::Id>>;

/// Queries a list of [`Payment`]s.
pub type List = DatabaseQuery<
    By<read::payment::list::Page, read::payment::list::Selector>,
>;

/// Queries total count of [`Payment`]s.
pub type TotalCount = DatabaseQuery<By<read::payment::list::TotalCount, ()>>;

/// Queries [`read::payment::Stats`] within a [`read::payment::StatsScope`].
pub type Stats =
    DatabaseQuery<By<read::payment::Stats, read::payment::StatsScope>>;
