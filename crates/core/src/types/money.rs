//! Whole-rupee money type.
//!
//! The catalog prices everything in whole rupees (no paise), so the backing
//! representation is a plain `i64` rather than a fixed-point decimal.
//! Arithmetic saturates: a cart can never overflow into a negative total.

use core::fmt;

use serde::{Deserialize, Serialize};

/// An amount of Indian rupees.
///
/// `Display` renders the Indian numbering system grouping with a rupee sign,
/// e.g. `Rupees::new(123_456)` displays as `₹1,23,456`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Rupees(i64);

impl Rupees {
    /// Zero rupees.
    pub const ZERO: Self = Self(0);

    /// Create an amount from a whole-rupee value.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// The underlying whole-rupee value.
    #[must_use]
    pub const fn amount(self) -> i64 {
        self.0
    }

    /// Whether this amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction, floored at zero.
    ///
    /// Used for "add ₹X more for free shipping" style arithmetic where a
    /// negative remainder is meaningless.
    #[must_use]
    pub const fn saturating_sub_floor_zero(self, other: Self) -> Self {
        let diff = self.0.saturating_sub(other.0);
        if diff < 0 { Self::ZERO } else { Self(diff) }
    }

    /// Multiply a unit price by a quantity, saturating on overflow.
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as i64))
    }

    /// Format the amount with Indian-system digit grouping, without the
    /// currency sign (`123456` -> `1,23,456`).
    #[must_use]
    pub fn grouped(self) -> String {
        let negative = self.0 < 0;
        let digits: Vec<char> = self.0.unsigned_abs().to_string().chars().collect();
        let len = digits.len();

        let mut out = String::with_capacity(len + len / 2 + 1);
        if negative {
            out.push('-');
        }
        for (i, c) in digits.iter().enumerate() {
            if i > 0 {
                // Indian grouping: last group of three, then groups of two.
                let remaining = len - i;
                if remaining == 3 || (remaining > 3 && (remaining - 3) % 2 == 0) {
                    out.push(',');
                }
            }
            out.push(*c);
        }
        out
    }
}

impl fmt::Display for Rupees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\u{20b9}{}", self.grouped())
    }
}

impl From<i64> for Rupees {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

impl From<Rupees> for i64 {
    fn from(amount: Rupees) -> Self {
        amount.0
    }
}

impl core::iter::Sum for Rupees {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}
