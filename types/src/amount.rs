//! Token balances and the balance-weighting rule.
//!
//! Balances are fixed-point integers in the token's smallest unit. One whole
//! token is [`UNIT_SCALE`] smallest units. All weighting is exact integer
//! arithmetic; nothing here goes through floating point.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// Smallest units per whole token (8 decimals).
pub const UNIT_SCALE: u128 = 100_000_000;

/// Denominator applied to `balance * percent`: percent is out of 100 and the
/// result is expressed in whole tokens.
const WEIGHT_DIVISOR: u128 = 100 * UNIT_SCALE;

/// A token balance in the token's smallest unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Whole-token weight contributed by `percent` of this balance.
    ///
    /// `floor(balance * percent / 100 / 1e8)`, computed as a single integer
    /// division (floor of a floor by an integer equals the floor of the
    /// exact quotient). Saturates instead of overflowing for balances near
    /// `u128::MAX`.
    pub fn weighted(&self, percent: u8) -> Weight {
        let percent = u128::from(percent.min(100));
        match self.0.checked_mul(percent) {
            Some(product) => Weight(product / WEIGHT_DIVISOR),
            None => Weight((self.0 / WEIGHT_DIVISOR).saturating_mul(percent)),
        }
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Aggregated vote weight in whole tokens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weight(u128);

impl Weight {
    pub const ZERO: Self = Self(0);

    pub fn new(units: u128) -> Self {
        Self(units)
    }

    pub fn units(&self) -> u128 {
        self.0
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl Add for Weight {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
