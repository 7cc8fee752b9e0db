//! Calendar [`Date`] definitions.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{fmt, str::FromStr};

#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use time::{macros::format_description, Duration, Month};

/// Calendar date without a time zone, as printed on contracts and invoices.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Date(time::Date);

impl Date {
    /// Returns the current UTC [`Date`].
    #[must_use]
    pub fn today() -> Self {
        Self(time::OffsetDateTime::now_utc().date())
    }

    /// Creates a new [`Date`] out of its calendar components.
    ///
    /// [`None`] is returned if the components don't form a valid date.
    #[must_use]
    pub fn from_calendar(year: i32, month: u8, day: u8) -> Option<Self> {
        let month = Month::try_from(month).ok()?;
        time::Date::from_calendar_date(year, month, day).ok().map(Self)
    }

    /// Returns the [`Date`] being the provided number of `days` after this
    /// one.
    ///
    /// Saturates at the maximum representable [`Date`].
    #[must_use]
    pub fn add_days(self, days: u16) -> Self {
        Self(self.0.saturating_add(Duration::days(days.into())))
    }

    /// Returns the number of whole days from this [`Date`] to the `other` one.
    ///
    /// Negative if the `other` [`Date`] is before this one.
    #[must_use]
    pub fn days_until(self, other: Self) -> i64 {
        (other.0 - self.0).whole_days()
    }

    /// Formats this [`Date`] as `YYYYMMDD` without separators.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn to_compact_string(&self) -> String {
        self.0
            .format(format_description!("[year][month][day]"))
            .expect("infallible")
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self
            .0
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(|_| fmt::Error)?;
        f.write_str(&formatted)
    }
}

impl FromStr for Date {
    type Err = time::error::Parse;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        time::Date::parse(s, format_description!("[year]-[month]-[day]"))
            .map(Self)
    }
}

impl From<time::Date> for Date {
    fn from(date: time::Date) -> Self {
        Self(date)
    }
}

impl From<Date> for time::Date {
    fn from(date: Date) -> Self {
        date.0
    }
}

#[cfg(feature = "postgres")]
impl FromSql<'_> for Date {
    accepts!(DATE);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        time::Date::from_sql(ty, raw).map(Self)
    }
}

#[cfg(feature = "postgres")]
impl ToSql for Date {
    accepts!(DATE);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.0.to_sql(ty, w)
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Calendar date in `YYYY-MM-DD` format.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Date = super::Date;

    impl Date {
        fn to_output<S: ScalarValue>(d: &Date) -> Value<S> {
            Value::scalar(d.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Date` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    s.parse().map_err(|e| {
                        format!("Cannot parse `Date` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use super::Date;

    #[test]
    fn parses_and_prints_iso_dates() {
        let date = "2024-02-29".parse::<Date>().unwrap();

        assert_eq!(date, Date::from_calendar(2024, 2, 29).unwrap());
        assert_eq!(date.to_string(), "2024-02-29");
        assert_eq!(date.to_compact_string(), "20240229");

        assert!("2023-02-29".parse::<Date>().is_err());
        assert!("29.02.2024".parse::<Date>().is_err());
    }

    #[test]
    fn pads_single_digit_components() {
        let date = Date::from_calendar(2025, 1, 5).unwrap();

        assert_eq!(date.to_string(), "2025-01-05");
        assert_eq!(date.to_compact_string(), "20250105");
    }

    #[test]
    fn adds_days_across_years() {
        let start = Date::from_calendar(2024, 3, 1).unwrap();
        let end = start.add_days(365);

        assert_eq!(end, Date::from_calendar(2025, 3, 1).unwrap());
        assert_eq!(start.days_until(end), 365);
        assert_eq!(end.days_until(start), -365);
    }
}
