//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are snapshots taken from the Catalog Provider when an item is added
//! to a cart. They travel over the wire as plain JSON numbers, matching the
//! provider's format.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
}

/// A non-negative price in the catalog's display currency.
///
/// Deserialization goes through [`Price::new`], so a negative amount never
/// becomes a `Price`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_rejected() {
        assert_eq!(Price::new(Decimal::new(-1, 0)), Err(PriceError::Negative));
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_deserializes_json_numbers() {
        let whole: Price = serde_json::from_str("200").unwrap();
        assert_eq!(whole.amount(), Decimal::new(200, 0));

        let fractional: Price = serde_json::from_str("19.99").unwrap();
        assert_eq!(fractional.amount(), Decimal::new(1999, 2));
    }

    #[test]
    fn test_negative_json_rejected() {
        assert!(serde_json::from_str::<Price>("-3").is_err());
        assert!(serde_json::from_str::<Price>("-0.01").is_err());
        assert!(serde_json::from_str::<Price>("0").is_ok());
    }

    #[test]
    fn test_serializes_as_number() {
        let price = Price::new(Decimal::new(1999, 2)).unwrap();
        let value = serde_json::to_value(price).unwrap();
        assert!(value.is_number());
        assert!((value.as_f64().unwrap() - 19.99).abs() < f64::EPSILON);
    }

    #[test]
    fn test_display_two_places() {
        let price = Price::new(Decimal::new(200, 0)).unwrap();
        assert_eq!(price.to_string(), "200.00");
    }
}
