//! # Slippage Bounds
//!
//! Minimum accepted amounts for a mint, derived from desired amounts.

use crate::constants::BPS_DENOMINATOR;
use crate::errors::{CoreError, CoreResult};
use alloy_primitives::U256;

/// `desired * (10_000 - slippage_bps) / 10_000`, floored.
pub fn minimum_amount(desired: U256, slippage_bps: u32) -> CoreResult<U256> {
    if slippage_bps >= BPS_DENOMINATOR {
        return Err(CoreError::InvalidBasisPoints(slippage_bps));
    }
    let keep = U256::from(BPS_DENOMINATOR - slippage_bps);
    let scaled = desired.checked_mul(keep).ok_or(CoreError::MathOverflow)?;
    Ok(scaled / U256::from(BPS_DENOMINATOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_five_percent_slippage() {
        assert_eq!(minimum_amount(U256::from(1_000u64), 500).unwrap(), U256::from(950u64));
        assert_eq!(minimum_amount(U256::from(999u64), 500).unwrap(), U256::from(949u64));
        assert_eq!(minimum_amount(U256::ZERO, 500).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_invalid_slippage() {
        assert_eq!(
            minimum_amount(U256::from(1u8), 10_000),
            Err(CoreError::InvalidBasisPoints(10_000))
        );
        assert_eq!(minimum_amount(U256::MAX, 500), Err(CoreError::MathOverflow));
    }
}
