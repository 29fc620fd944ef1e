//! Reward token amounts.
//!
//! Rewards are configured in whole token units. The external ledger works in
//! its smallest unit, so every transfer converts with [`TokenAmount::to_ledger_units`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of decimal places of the token ledger's smallest unit.
pub const LEDGER_DECIMALS: u32 = 18;

/// A whole-token amount (e.g. `10` means ten tokens, not ten base units).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenAmount(u64);

impl TokenAmount {
    pub const ZERO: Self = Self(0);

    pub fn new(tokens: u64) -> Self {
        Self(tokens)
    }

    pub fn tokens(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Convert to the ledger's smallest unit (`tokens * 10^decimals`).
    ///
    /// Returns `None` when the result does not fit in a `u128`.
    pub fn to_ledger_units(&self, decimals: u32) -> Option<u128> {
        10u128
            .checked_pow(decimals)
            .and_then(|scale| (self.0 as u128).checked_mul(scale))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} tokens", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_units_use_eighteen_decimals() {
        let ten = TokenAmount::new(10);
        assert_eq!(
            ten.to_ledger_units(LEDGER_DECIMALS),
            Some(10_000_000_000_000_000_000)
        );
        assert_eq!(TokenAmount::ZERO.to_ledger_units(LEDGER_DECIMALS), Some(0));
    }

    #[test]
    fn ledger_units_overflow_is_detected() {
        assert_eq!(TokenAmount::new(u64::MAX).to_ledger_units(39), None);
        assert!(TokenAmount::new(u64::MAX).to_ledger_units(18).is_some());
    }

    #[test]
    fn counter_addition_saturates() {
        let near_max = TokenAmount::new(u64::MAX - 1);
        assert_eq!(near_max.saturating_add(TokenAmount::new(5)), TokenAmount::new(u64::MAX));
        assert_eq!(TokenAmount::new(2).saturating_add(TokenAmount::new(3)), TokenAmount::new(5));
    }
}
