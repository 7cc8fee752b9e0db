//! [`Percent`]-related definitions.

use std::str::FromStr;

use derive_more::Display;
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;

/// Percentage in the `0..=100` range.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Percent(Decimal);

impl Percent {
    /// Zero [`Percent`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Number of decimal places a [`Percent::ratio()`] is rounded to.
    const RATIO_SCALE: u32 = 2;

    /// Creates a new [`Percent`] if the provided value lies in the `0..=100`
    /// range.
    #[must_use]
    pub fn new(val: Decimal) -> Option<Self> {
        (Decimal::ZERO..=Decimal::ONE_HUNDRED)
            .contains(&val)
            .then_some(Self(val))
    }

    /// Calculates which [`Percent`] the `part` makes of the `total`.
    ///
    /// Result is rounded to 2 decimal places. Empty `total` gives
    /// [`Percent::ZERO`], and a `part` exceeding the `total` is capped at
    /// `100`.
    #[must_use]
    pub fn ratio(part: u32, total: u32) -> Self {
        if total == 0 {
            return Self::ZERO;
        }
        let val = Decimal::from(part.min(total)) * Decimal::ONE_HUNDRED
            / Decimal::from(total);
        Self(val.round_dp(Self::RATIO_SCALE).normalize())
    }

    /// Returns the underlying [`Decimal`] value of this [`Percent`].
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Percent {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .ok()
            .and_then(Self::new)
            .ok_or("invalid percent value")
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Decimal percentage in the `0..=100` range.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Percent = super::Percent;

    impl Percent {
        fn to_output<S: ScalarValue>(m: &Percent) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Percent` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Percent` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use super::Percent;

    #[test]
    fn ratio() {
        assert_eq!(Percent::ratio(0, 0), Percent::ZERO);
        assert_eq!(Percent::ratio(3, 0), Percent::ZERO);
        assert_eq!(Percent::ratio(0, 7).to_string(), "0");
        assert_eq!(Percent::ratio(1, 4).to_string(), "25");
        assert_eq!(Percent::ratio(1, 3).to_string(), "33.33");
        assert_eq!(Percent::ratio(2, 3).to_string(), "66.67");
        assert_eq!(Percent::ratio(5, 5).to_string(), "100");
        assert_eq!(Percent::ratio(6, 5).to_string(), "100");
    }

    #[test]
    fn from_str() {
        assert_eq!("42.5".parse::<Percent>().unwrap().to_string(), "42.5");
        assert!("100".parse::<Percent>().is_ok());
        assert!("100.01".parse::<Percent>().is_err());
        assert!("-1".parse::<Percent>().is_err());
        assert!("ten".parse::<Percent>().is_err());
    }
}
