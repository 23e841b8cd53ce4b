//! Monetary amounts in integer minor units.
//!
//! Amounts are carried as `i64` counts of the smallest currency unit (cents)
//! everywhere inside the system. Conversion to a two-decimal [`Decimal`]
//! happens only when a value leaves through a response body.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of decimal places of every supported currency.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Convert a minor-unit amount to its two-decimal presentation value.
///
/// ```
/// use verdant_core::types::money::to_major_units;
///
/// assert_eq!(to_major_units(34_900).to_string(), "349.00");
/// assert_eq!(to_major_units(5).to_string(), "0.05");
/// ```
#[must_use]
pub fn to_major_units(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_UNIT_SCALE)
}

/// An amount of money in a given currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the smallest currency unit (e.g., cents for EUR).
    pub amount_minor: i64,
    /// ISO 4217 currency code.
    pub currency: CurrencyCode,
}

impl Money {
    /// Create an amount from minor units.
    #[must_use]
    pub const fn from_minor(amount_minor: i64, currency: CurrencyCode) -> Self {
        Self {
            amount_minor,
            currency,
        }
    }

    /// The amount at presentation precision.
    #[must_use]
    pub fn major(&self) -> Decimal {
        to_major_units(self.amount_minor)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.major(), self.currency.code())
    }
}

/// ISO 4217 currency codes accepted at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    EUR,
    USD,
    GBP,
    CHF,
    CAD,
}

impl CurrencyCode {
    /// Upper-case ISO code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EUR => "EUR",
            Self::USD => "USD",
            Self::GBP => "GBP",
            Self::CHF => "CHF",
            Self::CAD => "CAD",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned for a currency the store does not accept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported currency: {0}")]
pub struct UnsupportedCurrency(pub String);

impl FromStr for CurrencyCode {
    type Err = UnsupportedCurrency;

    /// Payment processors commonly send lower-case codes, so parsing ignores case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(Self::EUR),
            "USD" => Ok(Self::USD),
            "GBP" => Ok(Self::GBP),
            "CHF" => Ok(Self::CHF),
            "CAD" => Ok(Self::CAD),
            _ => Err(UnsupportedCurrency(s.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_major_units_keep_two_decimals() {
        assert_eq!(to_major_units(0).to_string(), "0.00");
        assert_eq!(to_major_units(-150).to_string(), "-1.50");
    }

    #[test]
    fn test_display() {
        let price = Money::from_minor(1_999, CurrencyCode::EUR);
        assert_eq!(price.to_string(), "19.99 EUR");
    }

    #[test]
    fn test_currency_parse_is_case_insensitive() {
        assert_eq!("eur".parse::<CurrencyCode>().unwrap(), CurrencyCode::EUR);
        assert_eq!(" Usd ".parse::<CurrencyCode>().unwrap(), CurrencyCode::USD);
        assert!("xyz".parse::<CurrencyCode>().is_err());
    }
}
