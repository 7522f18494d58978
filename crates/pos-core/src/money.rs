//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                 │
//! │                                                             │
//! │  In floating point:                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!               │
//! │                                                             │
//! │  OUR SOLUTION: Integer Cents                                │
//! │    Every amount is an exact count of the smallest unit.     │
//! │    A sale total is the exact sum of its line subtotals,     │
//! │    to the cent, with no rounding drift.                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pos_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(1099); // 10.99
//!
//! // Arithmetic operations
//! let line = price * 3;
//! assert_eq!(line.cents(), 3297);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: allows negative values for corrections
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - Fixed two-decimal precision by construction: the database, the cart
///   math, and the commit protocol all operate on cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit should be negative:
    /// `from_major_minor(-5, 50)` is -5.50, not -4.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99, absolute).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity, yielding a line subtotal.
    ///
    /// Saturates at the i64 range instead of wrapping, so an absurd
    /// price × quantity combination cannot silently overflow in release
    /// builds. Catalog validation caps prices long before this matters.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

/// Debug-friendly display. UI formatting and localization happen elsewhere.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.units().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}
