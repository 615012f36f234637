//! # Allocation Engine
//!
//! Fixed-percentage distribution of a freshly minted supply:
//! influencer 30%, treasury 65%, platform 5%. Shares are floored and the
//! rounding remainder goes to the treasury, so the three parts always sum to
//! exactly the total supply.

use crate::constants::*;
use crate::errors::{CoreError, CoreResult};

/// Token distribution for one launch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct AllocationPlan {
    pub total_supply: u128,
    pub influencer: u128,
    pub treasury: u128,
    pub platform: u128,
}

impl AllocationPlan {
    pub fn sum(&self) -> u128 {
        // Cannot overflow: the parts partition total_supply
        self.influencer + self.treasury + self.platform
    }

    /// Token amount seeded into the pool, funded from the treasury share
    pub fn liquidity_seed(&self, liquidity_bps: u32) -> CoreResult<u128> {
        if liquidity_bps == 0 || liquidity_bps > BPS_DENOMINATOR {
            return Err(CoreError::InvalidBasisPoints(liquidity_bps));
        }
        let seed = mul_div_floor(self.total_supply, liquidity_bps as u128, BPS_DENOMINATOR as u128);
        if seed > self.treasury {
            return Err(CoreError::LiquidityExceedsTreasury {
                requested: seed,
                available: self.treasury,
            });
        }
        Ok(seed)
    }
}

/// Split `total_supply` into influencer, treasury and platform shares.
pub fn allocate(total_supply: u128) -> CoreResult<AllocationPlan> {
    if total_supply == 0 {
        return Err(CoreError::InvalidSupply);
    }

    let influencer = mul_div_floor(total_supply, INFLUENCER_SHARE_PERCENT, PERCENT_DENOMINATOR);
    let platform = mul_div_floor(total_supply, PLATFORM_SHARE_PERCENT, PERCENT_DENOMINATOR);
    let treasury = total_supply - influencer - platform;

    Ok(AllocationPlan {
        total_supply,
        influencer,
        treasury,
        platform,
    })
}

/// floor(value * numerator / denominator) for numerator <= denominator,
/// split into quotient and remainder so the product never exceeds u128.
pub(crate) fn mul_div_floor(value: u128, numerator: u128, denominator: u128) -> u128 {
    let quotient = value / denominator;
    let remainder = value % denominator;
    quotient * numerator + remainder * numerator / denominator
}
