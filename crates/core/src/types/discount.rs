//! Coupon discount percentages.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Error returned for a discount outside `0..=100`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("discount percentage must be between 0 and 100, got {0}")]
pub struct DiscountError(pub i64);

/// A whole-number discount percentage, guaranteed to lie in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct DiscountPercent(u8);

impl DiscountPercent {
    /// No discount.
    pub const ZERO: Self = Self(0);
    /// Everything free.
    pub const FULL: Self = Self(100);

    /// Validate a percentage.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError`] when `value` is negative or above 100.
    pub fn new(value: i64) -> Result<Self, DiscountError> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .map(Self)
            .ok_or(DiscountError(value))
    }

    /// The percentage as an integer.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// The multiplier applied to a subtotal: `1 - pct/100`.
    #[must_use]
    pub fn retained_fraction(self) -> Decimal {
        Decimal::ONE - self.as_fraction()
    }

    /// The discounted share of a subtotal: `pct/100`.
    #[must_use]
    pub fn as_fraction(self) -> Decimal {
        Decimal::from(self.0) / Decimal::ONE_HUNDRED
    }
}

impl TryFrom<i64> for DiscountPercent {
    type Error = DiscountError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DiscountPercent> for i64 {
    fn from(pct: DiscountPercent) -> Self {
        Self::from(pct.0)
    }
}

impl std::fmt::Display for DiscountPercent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}
