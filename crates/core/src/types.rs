//! # Core Types
//!
//! Currencies, launch lifecycle states and fee tiers.

use crate::constants::*;
use crate::errors::{CoreError, CoreResult};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Currency
// ============================================================================

/// Currency a pledge is denominated in. Amounts are always integers in the
/// smallest unit (wei for ETH, 6-decimal units for USDC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "client", serde(rename_all = "UPPERCASE"))]
pub enum Currency {
    Eth,
    Usdc,
}

impl Currency {
    pub const ALL: [Currency; 2] = [Currency::Eth, Currency::Usdc];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Eth => "ETH",
            Currency::Usdc => "USDC",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ETH" => Ok(Currency::Eth),
            "USDC" => Ok(Currency::Usdc),
            _ => Err(CoreError::UnknownCurrency(s.to_string())),
        }
    }
}

// ============================================================================
// Launch Status
// ============================================================================

/// Lifecycle of an influencer launch. Variants are declared in lifecycle
/// order so `Ord` doubles as the "never backward" comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum LaunchStatus {
    Collecting,
    ThresholdMet,
    Approved,
    Launched,
}

impl LaunchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaunchStatus::Collecting => "Collecting",
            LaunchStatus::ThresholdMet => "ThresholdMet",
            LaunchStatus::Approved => "Approved",
            LaunchStatus::Launched => "Launched",
        }
    }

    /// Pledges and withdrawals are frozen once the asset exists
    pub fn accepts_pledges(&self) -> bool {
        *self != LaunchStatus::Launched
    }
}

impl fmt::Display for LaunchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LaunchStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "Collecting" => Ok(LaunchStatus::Collecting),
            "ThresholdMet" => Ok(LaunchStatus::ThresholdMet),
            "Approved" => Ok(LaunchStatus::Approved),
            "Launched" => Ok(LaunchStatus::Launched),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

// ============================================================================
// Fee Tier
// ============================================================================

/// Pool fee in hundredths of a basis point. Kept as a raw value because the
/// AMM may be configured with tiers outside the enumerated set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "client", serde(transparent))]
pub struct FeeTier(pub u32);

impl FeeTier {
    pub const LOW: FeeTier = FeeTier(FEE_LOW);
    pub const MEDIUM: FeeTier = FeeTier(FEE_MEDIUM);
    pub const HIGH: FeeTier = FeeTier(FEE_HIGH);

    pub fn fee(&self) -> u32 {
        self.0
    }

    /// Tick spacing enforced by the AMM for this tier. Unknown tiers fall
    /// back to the 0.3% spacing.
    pub fn tick_spacing(&self) -> i32 {
        match self.0 {
            FEE_LOW => TICK_SPACING_LOW,
            FEE_MEDIUM => TICK_SPACING_MEDIUM,
            FEE_HIGH => TICK_SPACING_HIGH,
            _ => DEFAULT_TICK_SPACING,
        }
    }

    pub fn is_enumerated(&self) -> bool {
        matches!(self.0, FEE_LOW | FEE_MEDIUM | FEE_HIGH)
    }
}

impl Default for FeeTier {
    fn default() -> Self {
        FeeTier::MEDIUM
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
