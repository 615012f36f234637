//! # Core Error Types
//!
//! Errors raised by the pure launch logic. The launcher service maps these onto
//! its own classified errors; nothing here performs I/O.

use thiserror::Error;

/// Errors of the allocation, ordering, threshold and tick math code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum CoreError {
    // ========================================================================
    // Math Errors
    // ========================================================================

    #[error("Math overflow")]
    MathOverflow,

    #[error("Math underflow")]
    MathUnderflow,

    #[error("Division by zero")]
    DivisionByZero,

    // ========================================================================
    // Validation Errors
    // ========================================================================

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Invalid total supply: must be greater than zero")]
    InvalidSupply,

    #[error("Invalid price")]
    InvalidPrice,

    #[error("Invalid tick spacing: {0}")]
    InvalidTickSpacing(i32),

    #[error("Invalid tick range [{lower}, {upper}] for spacing {spacing}")]
    InvalidTickRange { lower: i32, upper: i32, spacing: i32 },

    #[error("Liquidity seed of {requested} exceeds treasury allocation of {available}")]
    LiquidityExceedsTreasury { requested: u128, available: u128 },

    #[error("Invalid basis points: {0}")]
    InvalidBasisPoints(u32),

    #[error("Token pair must contain two distinct assets")]
    IdenticalTokens,

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================

    #[error("Threshold not met")]
    NotThresholdMet,

    #[error("Launch not approved")]
    NotApproved,

    #[error("Already launched")]
    AlreadyLaunched,

    #[error("Unknown launch status: {0}")]
    UnknownStatus(String),
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
