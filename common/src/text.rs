//! Macro for defining validated free-form text values.

/// Defines a text newtype which is non-empty, has no surrounding whitespace
/// and is limited by the provided number of characters.
///
/// The type is stored in a database as `VARCHAR`/`TEXT`.
///
/// # Example
///
/// ```rust
/// use common::define_text;
///
/// define_text! {
///     #[doc = "Title of a book."]
///     struct Title(max_len = 8);
/// }
///
/// assert!(Title::new("Dune").is_some());
/// assert!(Title::new(" Dune").is_none());
/// assert!(Title::new("").is_none());
/// assert!(Title::new("Foundation").is_none());
/// assert_eq!("Dune".parse::<Title>().unwrap().as_ref(), "Dune");
/// ```
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_text {
    (
        #[doc = $doc:literal]
        struct $name:ident(max_len = $max_len:literal);
    ) => {
        #[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        #[doc = $doc]
        pub struct $name(String);

        impl $name {
            /// Maximum number of characters.
            pub const MAX_LEN: usize = $max_len;

            /// Creates a new value if the provided `text` is valid.
            #[must_use]
            pub fn new(text: impl Into<String>) -> Option<Self> {
                let text = text.into();
                Self::check(&text).then_some(Self(text))
            }

            /// Checks whether the provided `text` is valid.
            fn check(text: &str) -> bool {
                !text.is_empty()
                    && text.trim() == text
                    && text.chars().count() <= Self::MAX_LEN
            }
        }

        impl ::core::convert::AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(
                &self,
                f: &mut ::core::fmt::Formatter<'_>,
            ) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = &'static str;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s).ok_or(::core::concat!(
                    "invalid `",
                    ::core::stringify!($name),
                    "`",
                ))
            }
        }

        #[cfg(feature = "postgres")]
        impl<'a> $crate::private::postgres_types::FromSql<'a> for $name {
            fn from_sql(
                ty: &$crate::private::postgres_types::Type,
                raw: &'a [u8],
            ) -> Result<
                Self,
                Box<dyn ::std::error::Error
                    + ::core::marker::Sync
                    + ::core::marker::Send>,
            > {
                <String as $crate::private::postgres_types::FromSql<'a>>
                    ::from_sql(ty, raw)
                    .map(Self)
            }

            fn accepts(ty: &$crate::private::postgres_types::Type) -> bool {
                <String as $crate::private::postgres_types::FromSql<'a>>
                    ::accepts(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl $crate::private::postgres_types::ToSql for $name {
            $crate::private::postgres_types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &$crate::private::postgres_types::Type,
                w: &mut $crate::private::postgres_types::private::BytesMut,
            ) -> Result<
                $crate::private::postgres_types::IsNull,
                Box<dyn ::std::error::Error
                    + ::core::marker::Sync
                    + ::core::marker::Send>,
            > {
                <String as $crate::private::postgres_types::ToSql>
                    ::to_sql(&self.0, ty, w)
            }

            fn accepts(ty: &$crate::private::postgres_types::Type) -> bool {
                <String as $crate::private::postgres_types::ToSql>
                    ::accepts(ty)
            }
        }
    };
}
