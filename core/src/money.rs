//! Currency amounts in integer minor units.
//!
//! Prices are stored as whole cents so that cart totals never accumulate
//! binary floating point rounding error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced when parsing a [`Money`] amount
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The input was empty
    #[error("amount is empty")]
    Empty,

    /// The input was negative
    #[error("amount cannot be negative: {0}")]
    Negative(String),

    /// The input was not a decimal number with at most two fraction digits
    #[error("invalid amount: {0}")]
    Invalid(String),

    /// The amount does not fit in 64 bits of cents
    #[error("amount out of range: {0}")]
    Overflow(String),
}

/// A non-negative amount in US cents
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates an amount from whole cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }
}

impl Add for Money {
    type Output = Self;

    /// Saturates at `u64::MAX` cents.
    fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    /// Parses `"29.99"`, `"18.5"`, `"125"` or `"$14.99"`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(MoneyError::Empty);
        }
        if trimmed.starts_with('-') {
            return Err(MoneyError::Negative(trimmed.to_string()));
        }
        let digits = trimmed.strip_prefix('$').unwrap_or(trimmed);

        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !is_digits(whole) || !is_digits(fraction) || fraction.len() > 2 {
            return Err(MoneyError::Invalid(trimmed.to_string()));
        }
        if digits.ends_with('.') {
            return Err(MoneyError::Invalid(trimmed.to_string()));
        }

        let overflow = || MoneyError::Overflow(trimmed.to_string());
        let whole_cents = whole
            .parse::<u64>()
            .map_err(|_| overflow())?
            .checked_mul(100)
            .ok_or_else(overflow)?;
        let fraction_cents = match fraction.len() {
            0 => 0,
            1 => u64::from(fraction.as_bytes()[0] - b'0') * 10,
            _ => fraction.parse::<u64>().map_err(|_| overflow())?,
        };

        whole_cents
            .checked_add(fraction_cents)
            .map(Self)
            .ok_or_else(overflow)
    }
}
