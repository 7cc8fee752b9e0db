//! [`RoomType`] definitions.

use common::{define_text, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Room;

/// Category of a [`Room`] defining its capacity and monthly price.
#[derive(Clone, Debug)]
pub struct RoomType {
    /// ID of this [`RoomType`].
    pub id: Id,

    /// [`Name`] of this [`RoomType`].
    pub name: Name,

    /// Number of beds in a [`Room`] of this [`RoomType`].
    pub capacity: u16,

    /// Price of living in a [`Room`] of this [`RoomType`] for a month.
    pub monthly_price: Money,
}

/// ID of a [`RoomType`].
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
    #[doc = "Name of a [`RoomType`]."]
    struct Name(max_len = 100);
}
