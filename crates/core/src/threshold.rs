//! # Threshold Evaluator
//!
//! Pure check of pledged aggregates against the configured funding
//! thresholds. Either currency reaching its threshold is sufficient.
//! A zero threshold means the currency is not configured and never triggers.

use crate::constants::BPS_DENOMINATOR;
use alloy_primitives::U256;

/// Funding targets of a launch in smallest currency units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct Thresholds {
    pub eth: u128,
    pub usdc: u128,
}

impl Thresholds {
    pub fn new(eth: u128, usdc: u128) -> Self {
        Self { eth, usdc }
    }

    /// At least one currency has a non-zero target
    pub fn is_configured(&self) -> bool {
        self.eth > 0 || self.usdc > 0
    }

    pub fn is_met(&self, total_eth: u128, total_usdc: u128) -> bool {
        evaluate(total_eth, total_usdc, self.eth, self.usdc)
    }
}

/// True iff either total reached its (non-zero) threshold.
pub fn evaluate(total_eth: u128, total_usdc: u128, threshold_eth: u128, threshold_usdc: u128) -> bool {
    reached(total_eth, threshold_eth) || reached(total_usdc, threshold_usdc)
}

fn reached(total: u128, threshold: u128) -> bool {
    threshold > 0 && total >= threshold
}

/// Progress towards a threshold in basis points, capped at 100%.
/// Unconfigured thresholds report zero progress.
pub fn progress_bps(total: u128, threshold: u128) -> u32 {
    if threshold == 0 {
        return 0;
    }
    if total >= threshold {
        return BPS_DENOMINATOR;
    }
    // total < threshold keeps the result below 10_000
    let scaled = U256::from(total) * U256::from(BPS_DENOMINATOR) / U256::from(threshold);
    scaled.saturating_to::<u32>()
}
