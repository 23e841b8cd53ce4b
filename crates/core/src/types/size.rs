//! Plant size categories.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Size category of a plant as listed in the catalog.
///
/// The catalog stores the French labels (`petit`, `moyen`, `grand`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeCategory {
    Petit,
    Moyen,
    Grand,
}

impl SizeCategory {
    /// Stored label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Petit => "petit",
            Self::Moyen => "moyen",
            Self::Grand => "grand",
        }
    }

    /// Customer-facing label.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Petit => "Small",
            Self::Moyen => "Medium",
            Self::Grand => "Large",
        }
    }

    /// Combine the category with an optional maximum height.
    ///
    /// ```
    /// use verdant_core::SizeCategory;
    ///
    /// assert_eq!(SizeCategory::Grand.describe(Some(180)), "Large (up to 180 cm)");
    /// assert_eq!(SizeCategory::Petit.describe(None), "Small");
    /// ```
    #[must_use]
    pub fn describe(&self, max_height_cm: Option<i32>) -> String {
        match max_height_cm {
            Some(height) => format!("{} (up to {height} cm)", self.display_name()),
            None => self.display_name().to_string(),
        }
    }
}

impl fmt::Display for SizeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "petit" => Ok(Self::Petit),
            "moyen" => Ok(Self::Moyen),
            "grand" => Ok(Self::Grand),
            _ => Err(format!("invalid size category: {s}")),
        }
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for SizeCategory {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for SizeCategory {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let label = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(label.parse::<Self>()?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for SizeCategory {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}
