//! [`User`] definitions.

pub mod session;

use std::{fmt, sync::LazyLock};

use argon2::{
    password_hash::{
        self, rand_core::OsRng, PasswordHasher as _, PasswordVerifier as _,
        SaltString,
    },
    Argon2,
};
#[cfg(doc)]
use common::DateTime;
use common::{define_kind, define_text, unit, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use secrecy::{zeroize::Zeroize, CloneableSecret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::session::Session;

/// Account of a person using the dormitory system.
#[derive(Clone, Debug)]
pub struct User {
    /// ID of this [`User`]
    pub id: Id,

    /// [`Name`] of this [`User`].
    pub name: Name,

    /// [`Login`] of this [`User`].
    pub login: Login,

    /// [`PasswordHash`] of this [`User`].
    pub password_hash: PasswordHash,

    /// [`Email`] of this [`User`].
    pub email: Option<Email>,

    /// [`Phone`] of this [`User`].
    pub phone: Option<Phone>,

    /// [`Role`] of this [`User`].
    pub role: Role,

    /// [`DateTime`] when this [`User`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`User`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_text! {
    #[doc = "Display name of a [`User`]."]
    struct Name(max_len = 256);
}

/// Login of a [`User`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Login(String);

impl Login {
    /// Creates a new [`Login`] if the given `login` is valid.
    #[must_use]
    pub fn new(login: impl Into<String>) -> Option<Self> {
        let login = login.into();
        Self::check(&login).then_some(Self(login))
    }

    /// Checks whether the given `login` is a valid [`Login`].
    ///
    /// A [`Login`] consists of 3 to 32 latin letters, digits, dots,
    /// underscores or dashes, starting with a letter.
    fn check(login: impl AsRef<str>) -> bool {
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[A-Za-z][A-Za-z0-9._-]{2,31}$").expect("valid regex")
        });

        REGEX.is_match(login.as_ref())
    }
}

impl AsRef<str> for Login {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Login {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Login`")
    }
}

/// Password of a [`User`] in its plain form.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Password(String);

impl Password {
    /// Creates a new [`Password`] if the given `password` is valid.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        Self::check(&password).then_some(Self(password))
    }

    /// Checks whether the given `password` is a valid [`Password`].
    fn check(password: impl AsRef<str>) -> bool {
        let password = password.as_ref();
        (6..=128).contains(&password.chars().count())
    }
}

impl AsRef<str> for Password {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("********")
    }
}

impl FromStr for Password {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Password`")
    }
}

impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// [Argon2id] hash of a [`User`]'s [`Password`] in [PHC string format].
///
/// [Argon2id]: https://datatracker.ietf.org/doc/html/rfc9106
/// [PHC string format]: https://github.com/P-H-C/phc-string-format
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hashes the provided [`Password`] with a random salt.
    ///
    /// # Errors
    ///
    /// If the [`Password`] cannot be hashed.
    pub fn new(password: &Password) -> Result<Self, password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.0.as_bytes(), &salt)
            .map(|h| Self(h.to_string()))
    }

    /// Checks whether the provided [`Password`] matches this [`PasswordHash`].
    #[must_use]
    pub fn verify(&self, password: &Password) -> bool {
        password_hash::PasswordHash::new(&self.0).is_ok_and(|hash| {
            Argon2::default()
                .verify_password(password.0.as_bytes(), &hash)
                .is_ok()
        })
    }
}

/// Email address of a [`User`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    fn check(address: impl AsRef<str>) -> bool {
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[^@\s]{1,64}@[^@\s.]+(\.[^@\s.]+)+$")
                .expect("valid regex")
        });

        let address = address.as_ref();
        address.len() <= 254 && REGEX.is_match(address)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

/// Phone number of a [`User`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Phone(String);

impl Phone {
    /// Creates a new [`Phone`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`Phone`].
    fn check(number: impl AsRef<str>) -> bool {
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\+?\d[\d\s-]{7,18}\d$").expect("valid regex")
        });

        REGEX.is_match(number.as_ref())
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Phone {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Phone`")
    }
}

define_kind! {
    #[doc = "Role of a [`User`] in the dormitory."]
    enum Role {
        #[doc = "Student living (or willing to live) in the dormitory."]
        Student = 1,

        #[doc = "Dormitory staff member."]
        Staff = 2,

        #[doc = "Dormitory manager."]
        Manager = 3,
    }
}

/// [`DateTime`] when a [`User`] was created.
pub type CreationDateTime = DateTimeOf<(User, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::{Email, Login, Password, PasswordHash, Phone, Role};

    #[test]
    fn validates_login() {
        assert!(Login::new("student01").is_some());
        assert!(Login::new("nguyen.van_a-2").is_some());

        assert!(Login::new("ab").is_none());
        assert!(Login::new("1student").is_none());
        assert!(Login::new("stu dent").is_none());
    }

    #[test]
    fn validates_contacts() {
        assert!(Email::new("sv01@dorm.edu.vn").is_some());
        assert!(Email::new("sv01@localhost").is_none());
        assert!(Email::new("sv01.dorm.edu.vn").is_none());

        assert!(Phone::new("+84 912 345 678").is_some());
        assert!(Phone::new("0912345678").is_some());
        assert!(Phone::new("call me").is_none());
    }

    #[test]
    fn verifies_password_hash() {
        let password = Password::new("correct horse").unwrap();
        let hash = PasswordHash::new(&password).unwrap();

        assert!(hash.verify(&password));
        assert!(!hash.verify(&Password::new("wrong horse").unwrap()));
        assert_ne!(hash, PasswordHash::new(&password).unwrap());
    }

    #[test]
    fn hides_password_on_display() {
        let password = Password::new("secret-42").unwrap();

        assert_eq!(password.to_string(), "********");
    }

    #[test]
    fn role_is_stored_as_number() {
        assert_eq!(Role::Student.u8(), 1);
        assert_eq!(Role::Manager.to_string(), "MANAGER");
        assert_eq!("STAFF".parse::<Role>().unwrap(), Role::Staff);
    }
}
