//! # Canonical Token Ordering
//!
//! The AMM identifies a pool by `(token0, token1, fee)` with `token0` the
//! numerically smaller address. Ordering must be canonicalized before any
//! pool query or mint, otherwise amounts land in the wrong slot.

use crate::errors::{CoreError, CoreResult};
use alloy_primitives::{Address, U256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenPair {
    pub token0: Address,
    pub token1: Address,
}

impl TokenPair {
    /// Order two assets by numeric address value. Address parsing is
    /// case-insensitive, so checksummed and lowercase input sort identically.
    pub fn canonical(a: Address, b: Address) -> CoreResult<Self> {
        if a == b {
            return Err(CoreError::IdenticalTokens);
        }
        let (token0, token1) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { token0, token1 })
    }

    pub fn is_token0(&self, asset: &Address) -> bool {
        self.token0 == *asset
    }

    /// Place `asset_amount` in the slot of `asset` and `other_amount` in the
    /// opposite slot, returning `(amount0, amount1)`.
    pub fn order_amounts(&self, asset: &Address, asset_amount: U256, other_amount: U256) -> (U256, U256) {
        if self.is_token0(asset) {
            (asset_amount, other_amount)
        } else {
            (other_amount, asset_amount)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_canonical_is_symmetric() {
        let low = Address::with_last_byte(0x01);
        let high = Address::repeat_byte(0xfe);
        assert_eq!(
            TokenPair::canonical(low, high).unwrap(),
            TokenPair::canonical(high, low).unwrap()
        );
        assert_eq!(TokenPair::canonical(high, low).unwrap().token0, low);
    }

    #[test]
    fn test_case_insensitive_ordering() {
        let upper = Address::from_str("0xC02AAA39B223FE8D0A0E5C4F27EAD9083C756CC2").unwrap();
        let lower = Address::from_str("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(
            TokenPair::canonical(upper, Address::ZERO).unwrap(),
            TokenPair::canonical(Address::ZERO, lower).unwrap()
        );
    }

    #[test]
    fn test_order_amounts() {
        let pair = TokenPair::canonical(Address::repeat_byte(0x22), Address::repeat_byte(0x11)).unwrap();
        let asset = Address::repeat_byte(0x22);
        assert_eq!(
            pair.order_amounts(&asset, U256::from(7), U256::from(3)),
            (U256::from(3), U256::from(7))
        );
    }

    #[test]
    fn test_identical_tokens_rejected() {
        let a = Address::repeat_byte(0x33);
        assert_eq!(TokenPair::canonical(a, a), Err(CoreError::IdenticalTokens));
    }
}
