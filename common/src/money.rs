//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;

use crate::define_kind;

/// Amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Creates a new [`Money`] in [`Currency::Vnd`].
    #[must_use]
    pub fn vnd(amount: impl Into<Decimal>) -> Self {
        Self {
            amount: amount.into(),
            currency: Currency::Vnd,
        }
    }

    /// Sums the provided amounts, if all of them are in the same `currency`.
    ///
    /// [`None`] is returned on a [`Currency`] mismatch.
    #[must_use]
    pub fn sum(
        currency: Currency,
        amounts: impl IntoIterator<Item = Self>,
    ) -> Option<Self> {
        amounts.into_iter().try_fold(
            Self {
                amount: Decimal::ZERO,
                currency,
            },
            |acc, m| {
                (m.currency == acc.currency).then(|| Self {
                    amount: acc.amount + m.amount,
                    currency,
                })
            },
        )
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        write!(f, "{}{currency}", amount.normalize())
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 || !s.is_char_boundary(s.len() - 3) {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        if amount.is_sign_negative() {
            return Err("negative amount");
        }
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "Vietnamese Dong."]
        Vnd = 1,

        #[doc = "US Dollar."]
        Usd = 2,
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Money in `{amount}{currency}` format, where:
    /// - `amount` is a non-negative decimal number;
    /// - `currency` is a three-letter currency code (`VND` or `USD`).
    #[graphql_scalar(with = Self, parse_token(String))]
    type Money = super::Money;

    impl Money {
        fn to_output<S: ScalarValue>(m: &Money) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Money` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Money` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("1000000VND").unwrap(),
            Money::vnd(1_000_000),
        );
        assert_eq!(
            Money::from_str("12.50USD").unwrap(),
            Money {
                amount: decimal("12.5"),
                currency: Currency::Usd,
            },
        );

        assert!(Money::from_str("1000000").is_err());
        assert!(Money::from_str("1000000VN").is_err());
        assert!(Money::from_str("1000000DONG").is_err());
        assert!(Money::from_str("-5VND").is_err());
        assert!(Money::from_str("VND").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(Money::vnd(1_500_000).to_string(), "1500000VND");
        assert_eq!(
            Money {
                amount: decimal("1500000.00"),
                currency: Currency::Vnd,
            }
            .to_string(),
            "1500000VND",
        );
        assert_eq!(
            Money {
                amount: decimal("12.50"),
                currency: Currency::Usd,
            }
            .to_string(),
            "12.5USD",
        );
    }

    #[test]
    fn sum() {
        assert_eq!(
            Money::sum(
                Currency::Vnd,
                [Money::vnd(500_000), Money::vnd(1_250_000)],
            ),
            Some(Money::vnd(1_750_000)),
        );
        assert_eq!(Money::sum(Currency::Vnd, []), Some(Money::vnd(0)));
        assert_eq!(
            Money::sum(
                Currency::Vnd,
                [
                    Money::vnd(1),
                    Money {
                        amount: Decimal::ONE,
                        currency: Currency::Usd,
                    },
                ],
            ),
            None,
        );
    }
}
