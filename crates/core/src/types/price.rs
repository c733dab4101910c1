//! Price arithmetic using decimal amounts.
//!
//! The backend owns pricing; the client only needs to display a selling
//! price, a struck-through list price, a discount badge and the total a
//! customer pays once the category commission is added.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when validating prices entered by sellers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    /// Amount is zero or negative.
    #[error("{field} must be greater than zero")]
    NotPositive {
        /// Name of the offending field.
        field: &'static str,
    },
    /// Selling price is above the list price.
    #[error("selling price {selling} exceeds maximum price {max}")]
    SellingAboveMax {
        /// Offered selling price.
        selling: Decimal,
        /// Offered list price.
        max: Decimal,
    },
}

/// A monetary amount in the store currency (INR).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero rupees.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build a price from whole rupees.
    #[must_use]
    pub fn from_rupees(rupees: i64) -> Self {
        Self(Decimal::from(rupees))
    }

    /// The underlying amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Add a commission percentage on top of this price.
    ///
    /// The result is rounded half-up to two decimal places.
    #[must_use]
    pub fn with_commission(&self, rate_percent: Decimal) -> Self {
        let factor = Decimal::ONE + rate_percent / Decimal::ONE_HUNDRED;
        Self(
            (self.0 * factor)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Multiply by an item quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Format for display, e.g. `₹749.50` or `₹750`.
    #[must_use]
    pub fn display(&self) -> String {
        let normalized = self.0.normalize();
        if normalized.scale() == 0 {
            format!("₹{normalized}")
        } else {
            format!("₹{:.2}", self.0)
        }
    }

    /// Validate a seller-entered selling/list price pair.
    ///
    /// # Errors
    ///
    /// Returns an error if either price is not positive or the selling price
    /// exceeds the list price.
    pub fn validate_pair(selling: Self, max: Self) -> Result<(), PriceError> {
        if !selling.is_positive() {
            return Err(PriceError::NotPositive {
                field: "selling_price",
            });
        }
        if !max.is_positive() {
            return Err(PriceError::NotPositive { field: "max_price" });
        }
        if selling > max {
            return Err(PriceError::SellingAboveMax {
                selling: selling.0,
                max: max.0,
            });
        }
        Ok(())
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl core::ops::Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl core::iter::Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, p| acc + p)
    }
}

/// Whole-number discount percentage for a selling/list price pair.
///
/// Returns `None` when no badge should be shown: the list price is zero or
/// negative, or the selling price is not below it. The server enforces
/// `max >= selling`, but stale or partial payloads can violate it.
#[must_use]
pub fn discount_percent(selling: Price, max: Price) -> Option<u32> {
    if !max.is_positive() || selling >= max {
        return None;
    }
    let pct = ((max.0 - selling.0) / max.0 * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let pct = pct.to_u32()?;
    (pct > 0).then_some(pct)
}

/// Amount saved against the list price, never negative.
#[must_use]
pub fn savings(selling: Price, max: Price) -> Price {
    if max > selling {
        Price(max.0 - selling.0)
    } else {
        Price::ZERO
    }
}
