//! [`FuzzPattern`] definition.

use derive_more::Display;
use itertools::Itertools as _;
use postgres_types::{FromSql, ToSql};

/// `SIMILAR TO` pattern matching any of the words of a search query.
#[derive(Clone, Debug, Display, Eq, FromSql, PartialEq, ToSql)]
#[postgres(transparent)]
pub struct FuzzPattern(String);

impl FuzzPattern {
    /// Creates a new [`FuzzPattern`] out of the provided search `query`.
    ///
    /// Every whitespace-separated word is matched as a substring, with the
    /// `SIMILAR TO` metacharacters escaped.
    #[must_use]
    pub fn new(query: &str) -> Self {
        let words = query.split_whitespace().format_with("|", |word, f| {
            let escaped = word.chars().format_with("", |c, f| {
                if r"\%_|*+?{}()[]".contains(c) {
                    f(&format_args!("\\{c}"))
                } else {
                    f(&c)
                }
            });
            f(&format_args!("%{escaped}%"))
        });
        Self(format!("({words})"))
    }
}

#[cfg(test)]
mod spec {
    use super::FuzzPattern;

    #[test]
    fn matches_any_word() {
        assert_eq!(FuzzPattern::new("  A  101 ").to_string(), "(%A%|%101%)");
    }

    #[test]
    fn escapes_metacharacters() {
        assert_eq!(FuzzPattern::new("50%_off").to_string(), r"(%50\%\_off%)");
    }
}
