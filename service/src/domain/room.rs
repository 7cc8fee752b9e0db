//! [`Room`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, define_text, unit, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use uuid::Uuid;

use crate::domain::{building, room_type};
#[cfg(doc)]
use crate::domain::{Building, Contract, RoomType};

/// Room of a [`Building`] to be rented by students.
#[derive(Clone, Debug)]
pub struct Room {
    /// ID of this [`Room`].
    pub id: Id,

    /// ID of the [`Building`] this [`Room`] belongs to.
    pub building_id: building::Id,

    /// [`Number`] of this [`Room`], unique within its [`Building`].
    pub number: Number,

    /// ID of the [`RoomType`] of this [`Room`].
    pub room_type_id: room_type::Id,

    /// Floor this [`Room`] is located on.
    pub floor: u16,

    /// Current [`Status`] of this [`Room`].
    pub status: Status,

    /// Optional [`Notes`] about this [`Room`].
    pub notes: Option<Notes>,

    /// [`DateTime`] when this [`Room`] was created.
    pub created_at: CreationDateTime,
}

impl Room {
    /// Indicates whether this [`Room`] can be booked right now.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == Status::Available
    }
}

/// ID of a [`Room`].
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
    #[doc = "Number of a [`Room`] (like `A101`)."]
    struct Number(max_len = 20);
}

define_text! {
    #[doc = "Free-form notes about a [`Room`]."]
    struct Notes(max_len = 2000);
}

define_kind! {
    #[doc = "Availability status of a [`Room`]."]
    enum Status {
        #[doc = "[`Room`] is free and can be booked."]
        Available = 1,

        #[doc = "[`Room`] is taken by an active [`Contract`]."]
        Occupied = 2,

        #[doc = "[`Room`] is under maintenance and cannot be booked."]
        Maintenance = 3,
    }
}

/// [`DateTime`] when a [`Room`] was created.
pub type CreationDateTime = DateTimeOf<(Room, unit::Creation)>;
