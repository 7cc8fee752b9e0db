//! [`Query`] collection related to [`Contract`]s.

use common::operations::By;

use crate::{
    domain::{contract, student, Contract},
    read::{self, contract::Active},
};
#[cfg(doc)]
use crate::{domain::Student, Query};

use super::DatabaseQuery;

/// Queries a [`Contract`] by its [`contract::Id`].
pub type ById = DatabaseQuery<By<Option<Contract>, contract::Id>>;

/// Queries the [`Active`] [`Contract`] of a [`Student`].
pub type ActiveByStudent =
    DatabaseQuery<By<Option<Active<Contract>>, student::Id>>;

/// Queries a list of [`Contract`]s.
pub type List = DatabaseQuery<
    By<read::contract::list::Page, read::contract::list::Selector>,
>;

/// Queries total count of [`Contract`]s.
pub type TotalCount =
    DatabaseQuery<By<read::contract::list::TotalCount, ()>>;
