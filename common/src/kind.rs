//! Macro for defining closed sets of named states.

/// Defines a kind enum stored in a database as `INT2`.
///
/// The enum gets its `SCREAMING_SNAKE_CASE` textual representation from
/// [`strum`], the `u8` discriminant conversion and, depending on the enabled
/// features, [`serde`] and [`postgres_types`] integrations.
///
/// # Example
///
/// ```rust
/// use common::define_kind;
///
/// define_kind! {
///     #[doc = "State of a door."]
///     enum DoorState {
///         #[doc = "Door is open."]
///         Open = 1,
///
///         #[doc = "Door is locked."]
///         Locked = 2,
///     }
/// }
///
/// assert_eq!(DoorState::Locked.u8(), 2);
/// assert_eq!(DoorState::Open.to_string(), "OPEN");
/// assert_eq!(DoorState::ALL, &[DoorState::Open, DoorState::Locked]);
/// ```
///
/// [`postgres_types`]: https://docs.rs/postgres-types
/// [`serde`]: https://docs.rs/serde
/// [`strum`]: https://docs.rs/strum
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_kind {
    (
        #[doc = $doc:literal]
        enum $name:ident {
            $(
                #[doc = $variant_doc:literal]
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            $crate::private::strum::Display,
            $crate::private::strum::EnumString,
            Eq,
            Hash,
            PartialEq,
        )]
        #[cfg_attr(
            feature = "serde",
            derive(
                $crate::private::serde::Deserialize,
                $crate::private::serde::Serialize,
            ),
            serde(rename_all = "SCREAMING_SNAKE_CASE"),
        )]
        #[doc = $doc]
        #[repr(u8)]
        #[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $(
                 #[doc = $variant_doc]
                 $variant = $value,
            )*
        }

        impl $name {
            /// All the variants, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// Converts this into its [`u8`] representation.
            #[must_use]
            pub const fn u8(self) -> u8 {
                self as u8
            }
        }

        #[cfg(feature = "postgres")]
        impl<'a> $crate::private::postgres_types::FromSql<'a> for $name {
            $crate::private::postgres_types::accepts!(INT2);

            fn from_sql(
                ty: &$crate::private::postgres_types::Type,
                raw: &[u8],
            ) -> Result<
                $name,
                Box<dyn ::std::error::Error
                    + ::core::marker::Sync
                    + ::core::marker::Send>,
            > {
                let raw = u8::try_from(i16::from_sql(ty, raw)?)?;
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.u8() == raw)
                    .ok_or_else(|| ::std::format!(
                        "invalid `{}` value: {raw}",
                        ::core::stringify!($name),
                    ).into())
            }
        }

        #[cfg(feature = "postgres")]
        impl $crate::private::postgres_types::ToSql for $name {
            $crate::private::postgres_types::accepts!(INT2);
            $crate::private::postgres_types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &$crate::private::postgres_types::Type,
                w: &mut $crate::private::postgres_types::private::BytesMut,
            ) -> Result<
                $crate::private::postgres_types::IsNull,
                ::std::boxed::Box<
                    dyn ::std::error::Error
                        + ::core::marker::Sync
                        + ::core::marker::Send
                >,
            > {
                i16::from(self.u8()).to_sql(ty, w)
            }
        }
    };
}
