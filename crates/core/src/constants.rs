//! # Launch Constants
//!
//! Fundamental constants for influencer launches including:
//! - Fixed-point scale factors and sqrt price bounds
//! - Global tick bounds of the concentrated-liquidity AMM
//! - Fee tiers and their tick spacings
//! - Allocation percentages and liquidity defaults

use alloy_primitives::U256;

// ============================================================================
// Mathematical Constants
// ============================================================================

/// Q96 fixed-point scale factor: 2^96
pub const Q96: u128 = 1u128 << 96;

/// Basis points denominator (10,000 = 100%)
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Percent denominator used by the allocation split
pub const PERCENT_DENOMINATOR: u128 = 100;

// ============================================================================
// AMM Bounds
// ============================================================================

/// Minimum tick of the AMM price space
pub const MIN_TICK: i32 = -887_272;

/// Maximum tick of the AMM price space
pub const MAX_TICK: i32 = 887_272;

/// Smallest sqrt price a pool accepts (sqrt price at MIN_TICK)
pub const MIN_SQRT_RATIO: U256 = U256::from_limbs([4_295_128_739, 0, 0, 0]);

/// Largest sqrt price a pool accepts (exclusive, sqrt price at MAX_TICK)
pub const MAX_SQRT_RATIO: U256 =
    U256::from_limbs([0x5d95_1d52_6398_8d26, 0xefd1_fc6a_5064_8849, 0xfffd_8963, 0]);

// ============================================================================
// Fee Tiers
// ============================================================================

/// 0.05% fee tier (hundredths of a basis point)
pub const FEE_LOW: u32 = 500;

/// 0.3% fee tier
pub const FEE_MEDIUM: u32 = 3_000;

/// 1% fee tier
pub const FEE_HIGH: u32 = 10_000;

pub const TICK_SPACING_LOW: i32 = 10;
pub const TICK_SPACING_MEDIUM: i32 = 60;
pub const TICK_SPACING_HIGH: i32 = 200;

/// Spacing used for fee tiers the AMM does not enumerate
pub const DEFAULT_TICK_SPACING: i32 = TICK_SPACING_MEDIUM;

// ============================================================================
// Allocation
// ============================================================================

pub const INFLUENCER_SHARE_PERCENT: u128 = 30;
pub const TREASURY_SHARE_PERCENT: u128 = 65;
pub const PLATFORM_SHARE_PERCENT: u128 = 5;

/// Default launch supply: one million whole tokens at 18 decimals
pub const DEFAULT_TOTAL_SUPPLY: u128 = 1_000_000 * 10u128.pow(18);

// ============================================================================
// Liquidity Defaults
// ============================================================================

/// Minimum accepted amounts are 95% of desired
pub const DEFAULT_SLIPPAGE_BPS: u32 = 500;

/// Mint deadline offset from submission (20 minutes)
pub const DEFAULT_DEADLINE_SECS: u64 = 20 * 60;

/// Share of total supply seeded into the pool on testnets (15%)
pub const DEFAULT_LIQUIDITY_TOKEN_BPS: u32 = 1_500;
