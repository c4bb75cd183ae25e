//! Amount and balance types
//!
//! Amounts are non-negative integers in an asset's smallest unit. All
//! arithmetic is overflow-checked; overflow is an explicit error, never a
//! silent wrap.

use crate::{Denom, Result, SpendgateError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A non-negative amount in an asset's smallest unit
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(pub u128);

impl Amount {
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition
    pub fn checked_add(self, other: Self) -> Result<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or_else(|| SpendgateError::arithmetic("addition"))
    }

    /// Checked subtraction
    pub fn checked_sub(self, other: Self) -> Result<Self> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or_else(|| SpendgateError::arithmetic("subtraction"))
    }

    /// Subtraction clamped at zero
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A set of balances keyed by denomination
///
/// Absent denominations read as zero. Ordering is deterministic (BTreeMap)
/// so valuation sums are stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balances(BTreeMap<Denom, Amount>);

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance for a denomination, zero if absent
    pub fn get(&self, denom: &Denom) -> Amount {
        self.0.get(denom).copied().unwrap_or(Amount::zero())
    }

    pub fn set(&mut self, denom: Denom, amount: Amount) {
        self.0.insert(denom, amount);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Denom, &Amount)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Denom, Amount)> for Balances {
    fn from_iter<I: IntoIterator<Item = (Denom, Amount)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
