//! # Money Module
//!
//! Integer money and quantity multipliers.
//!
//! ## Representation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Money       i64 cents          R$ 10,50  →  Money(1050)               │
//! │  Multiplier  i64 thousandths    "1/2 portion" → Multiplier(500)         │
//! │                                 "2x"          → Multiplier(2000)        │
//! │                                                                         │
//! │  unit_price × quantity  ──►  (cents × thousandths + 500) / 1000        │
//! │                               computed in i128, rounded half away       │
//! │                               from zero                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Kitchens sell fractional portions (half pizza, 1.5 kg of rice), so the
//! quantity is not an integer count. Floats never enter the arithmetic.
//!
//! ## Usage
//! ```rust
//! use comanda_core::money::{Money, Multiplier};
//!
//! let price = Money::from_cents(1000);
//! let total = price.times(Multiplier::from_units(2));
//! assert_eq!(total.cents(), 2000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// Signed so that refunds and corrections can be expressed, although the
/// order workflow itself only produces non-negative values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies by a fractional quantity.
    ///
    /// ## Example
    /// ```rust
    /// use comanda_core::money::{Money, Multiplier};
    ///
    /// // Half of R$ 10,25 = 512.5 cents → 513
    /// let half = Money::from_cents(1025).times(Multiplier::from_thousandths(500));
    /// assert_eq!(half.cents(), 513);
    /// ```
    pub fn times(&self, multiplier: Multiplier) -> Money {
        let raw = self.0 as i128 * multiplier.thousandths() as i128;
        let rounded = if raw >= 0 { (raw + 500) / 1000 } else { (raw - 500) / 1000 };
        Money(rounded as i64)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Multiplier
// =============================================================================

/// A quantity multiplier in thousandths (1000 = one whole unit).
///
/// Quantities are configured per category: a pizza category might offer
/// 1/2 and 1 while a drinks category offers 1, 2 and 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Multiplier(i64);

impl Multiplier {
    /// One whole unit.
    pub const ONE: Multiplier = Multiplier(1000);

    #[inline]
    pub const fn from_thousandths(thousandths: i64) -> Self {
        Multiplier(thousandths)
    }

    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Multiplier(units * 1000)
    }

    #[inline]
    pub const fn thousandths(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl Default for Multiplier {
    fn default() -> Self {
        Multiplier::ONE
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 1000;
        let frac = (self.0 % 1000).abs();
        if frac == 0 {
            write!(f, "{}", whole)
        } else {
            let digits = format!("{:03}", frac);
            write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_times_whole_units() {
        let price = Money::from_cents(1000);
        assert_eq!(price.times(Multiplier::from_units(2)).cents(), 2000);
        assert_eq!(price.times(Multiplier::ONE), price);
    }

    #[test]
    fn test_times_fraction_rounds_half_up() {
        assert_eq!(Money::from_cents(1025).times(Multiplier::from_thousandths(500)).cents(), 513);
        assert_eq!(Money::from_cents(999).times(Multiplier::from_thousandths(333)).cents(), 333);
    }

    #[test]
    fn test_times_negative_rounds_away_from_zero() {
        let refund = Money::from_cents(-1025);
        assert_eq!(refund.times(Multiplier::from_thousandths(500)).cents(), -513);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 650].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 1000);

        let empty: Money = std::iter::empty::<Money>().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(2000).to_string(), "20.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Multiplier::from_units(2).to_string(), "2");
        assert_eq!(Multiplier::from_thousandths(1500).to_string(), "1.5");
        assert_eq!(Multiplier::from_thousandths(250).to_string(), "0.25");
    }
}
