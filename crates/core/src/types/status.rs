//! Status enums for orders.
//!
//! Statuses are stored as plain text. Values written by a newer deployment (or
//! by hand in the database) must survive a round trip through an older one, so
//! each enum carries an `Unrecognized` variant holding the literal label instead
//! of failing to decode.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Defines a text-backed status enum with a forward-compatible fallback.
macro_rules! text_status {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// A label this build does not know about, kept verbatim.
            Unrecognized(String),
        }

        impl $name {
            /// Every status this build knows about.
            pub const KNOWN: &'static [Self] = &[$(Self::$variant),+];

            /// The label as stored and reported.
            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $label,)+
                    Self::Unrecognized(label) => label,
                }
            }

            /// Whether this is one of the labels this build knows about.
            #[must_use]
            pub const fn is_known(&self) -> bool {
                !matches!(self, Self::Unrecognized(_))
            }

            /// Parse a stored label. Never fails.
            #[must_use]
            pub fn from_label(label: &str) -> Self {
                match label {
                    $($label => Self::$variant,)+
                    other => Self::Unrecognized(other.to_string()),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<String> for $name {
            fn from(label: String) -> Self {
                Self::from_label(&label)
            }
        }

        impl From<$name> for String {
            fn from(status: $name) -> Self {
                match status {
                    $name::Unrecognized(label) => label,
                    known => known.as_str().to_string(),
                }
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let label = <&str as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self::from_label(label))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <&str as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

text_status! {
    /// Payment state of an order, as reported by the payment processor.
    PaymentStatus {
        Pending => "pending",
        /// Only paid orders contribute to revenue.
        Paid => "paid",
        Failed => "failed",
        Refunded => "refunded",
    }
}

text_status! {
    /// Fulfilment state of an order.
    OrderStatus {
        Confirmed => "confirmed",
        Shipped => "shipped",
        Delivered => "delivered",
        Cancelled => "cancelled",
    }
}

impl PaymentStatus {
    /// Whether the order's amount counts towards revenue.
    #[must_use]
    pub const fn counts_as_revenue(&self) -> bool {
        matches!(self, Self::Paid)
    }
}
