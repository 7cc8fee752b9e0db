//! [`Student`] definitions.

use common::{define_text, Date};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use uuid::Uuid;

use crate::domain::user;
#[cfg(doc)]
use crate::domain::User;

/// Profile of a student, linked to exactly one [`User`] account.
#[derive(Clone, Debug)]
pub struct Student {
    /// ID of this [`Student`].
    pub id: Id,

    /// ID of the [`User`] account this [`Student`] profile belongs to.
    pub user_id: user::Id,

    /// [`Number`] of this [`Student`] issued by the university.
    pub number: Number,

    /// [`FullName`] of this [`Student`].
    pub full_name: FullName,

    /// Date of birth of this [`Student`].
    pub date_of_birth: Option<Date>,

    /// [`University`] this [`Student`] studies at.
    pub university: University,

    /// [`Faculty`] this [`Student`] studies at.
    pub faculty: Faculty,

    /// [`Course`] this [`Student`] studies in.
    pub course: Course,
}

/// ID of a [`Student`].
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
    #[doc = "Globally unique student number (like `SV2024001`)."]
    struct Number(max_len = 20);
}

define_text! {
    #[doc = "Full name of a [`Student`]."]
    struct FullName(max_len = 100);
}

define_text! {
    #[doc = "University a [`Student`] studies at."]
    struct University(max_len = 100);
}

define_text! {
    #[doc = "Faculty a [`Student`] studies at."]
    struct Faculty(max_len = 100);
}

define_text! {
    #[doc = "Course (or cohort) a [`Student`] studies in."]
    struct Course(max_len = 20);
}
