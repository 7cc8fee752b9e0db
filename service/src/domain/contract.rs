//! [`Contract`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, define_text, unit, Date, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use uuid::Uuid;

use crate::domain::{room, student};
#[cfg(doc)]
use crate::domain::{Room, Student};

/// Rental contract assigning a [`Room`] to a [`Student`].
#[derive(Clone, Debug)]
pub struct Contract {
    /// ID of this [`Contract`].
    pub id: Id,

    /// Human-readable [`Number`] of this [`Contract`].
    pub number: Number,

    /// ID of the [`Student`] renting the [`Room`].
    pub student_id: student::Id,

    /// ID of the rented [`Room`].
    pub room_id: room::Id,

    /// [`Date`] this [`Contract`] starts at.
    pub start_date: Date,

    /// [`Date`] this [`Contract`] ends at.
    pub end_date: Date,

    /// Deposit paid for the [`Room`] rent.
    pub deposit: Money,

    /// Current [`Status`] of this [`Contract`].
    pub status: Status,

    /// [`DateTime`] when this [`Contract`] was created.
    pub created_at: CreationDateTime,
}

impl Contract {
    /// Number of days a booked [`Contract`] lasts.
    pub const BOOKING_DAYS: u16 = 365;

    /// Indicates whether this [`Contract`] currently assigns its [`Room`].
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    /// Indicates whether this [`Contract`] has outlived its end [`Date`] as
    /// of the provided `today`.
    #[must_use]
    pub fn is_outdated(&self, today: Date) -> bool {
        self.is_active() && self.end_date < today
    }
}

/// ID of a [`Contract`].
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
    #[doc = "Human-readable number of a [`Contract`]."]
    struct Number(max_len = 50);
}

impl Number {
    /// Generates a [`Number`] for a [`Contract`] signed on the provided
    /// [`Date`] by the [`Student`] with the provided [`student::Number`].
    ///
    /// Format is `CT{YYYYMMDD}{student number}`.
    #[must_use]
    pub fn generate(signed_at: Date, student: &student::Number) -> Self {
        Self(format!("CT{}{student}", signed_at.to_compact_string()))
    }
}

define_kind! {
    #[doc = "Lifecycle status of a [`Contract`]."]
    enum Status {
        #[doc = "[`Contract`] is in effect and occupies its [`Room`]."]
        Active = 1,

        #[doc = "[`Contract`] has reached its end [`Date`]."]
        Expired = 2,

        #[doc = "[`Contract`] was terminated before its end [`Date`]."]
        Terminated = 3,
    }
}

/// [`DateTime`] when a [`Contract`] was created.
pub type CreationDateTime = DateTimeOf<(Contract, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::{Date, DateTime, Money};

    use crate::domain::{room, student};

    use super::{Contract, Id, Number, Status};

    #[test]
    fn generates_number_from_date_and_student() {
        let number = Number::generate(
            Date::from_calendar(2024, 9, 1).unwrap(),
            &"SV2024001".parse::<student::Number>().unwrap(),
        );

        assert_eq!(number.as_ref(), "CT20240901SV2024001");
    }

    #[test]
    fn detects_outdated_contracts() {
        let start = Date::from_calendar(2023, 9, 1).unwrap();
        let mut contract = Contract {
            id: Id::new(),
            number: Number::generate(
                start,
                &"SV1".parse::<student::Number>().unwrap(),
            ),
            student_id: student::Id::new(),
            room_id: room::Id::new(),
            start_date: start,
            end_date: start.add_days(Contract::BOOKING_DAYS),
            deposit: Money::vnd(1_000_000),
            status: Status::Active,
            created_at: DateTime::now().coerce(),
        };
        let end = contract.end_date;

        assert!(!contract.is_outdated(end));
        assert!(contract.is_outdated(end.add_days(1)));

        contract.status = Status::Terminated;
        assert!(!contract.is_outdated(end.add_days(1)));
    }
}
