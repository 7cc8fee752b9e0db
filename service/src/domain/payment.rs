//! [`Payment`] definitions.

use common::{define_kind, unit, Date, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Contract;
use crate::domain::{contract, student, user};

/// Payment due for a [`Contract`].
#[derive(Clone, Debug)]
pub struct Payment {
    /// ID of this [`Payment`].
    pub id: Id,

    /// ID of the [`Contract`] this [`Payment`] is due for.
    pub contract_id: contract::Id,

    /// Amount to be paid.
    pub amount: Money,

    /// [`Date`] this [`Payment`] is due at.
    pub due_date: Date,

    /// Current [`Status`] of this [`Payment`].
    pub status: Status,

    /// [`SettlementDateTime`] when this [`Payment`] was paid, if it was.
    pub paid_at: Option<SettlementDateTime>,

    /// [`CreationDateTime`] of this [`Payment`].
    pub created_at: CreationDateTime,
}

impl Payment {
    /// Indicates whether this [`Payment`] is still pending after its due
    /// [`Date`] as of the provided `today`.
    #[must_use]
    pub fn is_overdue(&self, today: Date) -> bool {
        self.status == Status::Pending && self.due_date < today
    }
}

/// ID of a [`Payment`].
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

define_kind! {
    #[doc = "Settlement status of a [`Payment`]."]
    enum Status {
        #[doc = "[`Payment`] is awaited."]
        Pending = 1,

        #[doc = "[`Payment`] has been paid."]
        Paid = 2,
    }
}

/// [`DateTimeOf`] when a [`Payment`] was created.
pub type CreationDateTime = DateTimeOf<(Payment, unit::Creation)>;

/// [`DateTimeOf`] when a [`Payment`] was paid.
pub type SettlementDateTime = DateTimeOf<(Payment, unit::Settlement)>;

/// Reminder about a pending [`Payment`] to be delivered to its payer.
#[derive(Clone, Debug)]
pub struct Reminder {
    /// ID of the [`Payment`] being reminded about.
    pub payment_id: Id,

    /// Number of the [`Contract`] the [`Payment`] is due for.
    pub contract_number: contract::Number,

    /// Full name of the student owing the [`Payment`].
    pub student_name: student::FullName,

    /// Email to deliver this [`Reminder`] to, if the student has any.
    pub email: Option<user::Email>,

    /// Amount to be paid.
    pub amount: Money,

    /// [`Date`] the [`Payment`] is due at.
    pub due_date: Date,
}

#[cfg(test)]
mod spec {
    use common::{Date, DateTime, Money};

    use crate::domain::contract;

    use super::{Id, Payment, Status};

    #[test]
    fn only_pending_payments_become_overdue() {
        let due = Date::from_calendar(2024, 10, 5).unwrap();
        let mut payment = Payment {
            id: Id::new(),
            contract_id: contract::Id::new(),
            amount: Money::vnd(1_000_000),
            due_date: due,
            status: Status::Pending,
            paid_at: None,
            created_at: DateTime::now().coerce(),
        };

        assert!(!payment.is_overdue(due));
        assert!(payment.is_overdue(due.add_days(1)));

        payment.status = Status::Paid;
        assert!(!payment.is_overdue(due.add_days(1)));
    }
}
