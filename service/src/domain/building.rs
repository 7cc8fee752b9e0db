//! [`Building`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_text, unit, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use uuid::Uuid;

/// Dormitory building containing [`Room`]s.
///
/// [`Room`]: crate::domain::Room
#[derive(Clone, Debug)]
pub struct Building {
    /// ID of this [`Building`].
    pub id: Id,

    /// [`Name`] of this [`Building`].
    pub name: Name,

    /// [`Address`] of this [`Building`].
    pub address: Address,

    /// Number of floors in this [`Building`].
    pub num_floors: u16,

    /// Optional [`Description`] of this [`Building`].
    pub description: Option<Description>,

    /// [`DateTime`] when this [`Building`] was created.
    pub created_at: CreationDateTime,
}

impl Building {
    /// Checks whether the provided `floor` exists in this [`Building`].
    ///
    /// Floors are numbered from `1`.
    #[must_use]
    pub fn has_floor(&self, floor: u16) -> bool {
        (1..=self.num_floors).contains(&floor)
    }
}

/// ID of a [`Building`].
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_text! {
    #[doc = "Name of a [`Building`]."]
    struct Name(max_len = 100);
}

define_text! {
    #[doc = "Postal address of a [`Building`]."]
    struct Address(max_len = 255);
}

define_text! {
    #[doc = "Free-form description of a [`Building`]."]
    struct Description(max_len = 2000);
}

/// [`DateTime`] when a [`Building`] was created.
pub type CreationDateTime = DateTimeOf<(Building, unit::Creation)>;
