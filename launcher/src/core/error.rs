//! Centralized error types for the CoinFluence launcher

use super::types::{BootstrapStep, PledgeId};
use alloy_primitives::{Address, B256, U256};
use coinfluence_core::CoreError;
use std::time::Duration;
use thiserror::Error;

/// How callers should react to a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorClass {
    /// Bad input or wrong state: reject immediately, never retry
    Validation,
    /// Lost a race or repeated an action: re-query before deciding
    Conflict,
    /// Timeout or unavailable dependency: retry with backoff at idempotent steps
    Transient,
    /// Cannot proceed without operator action; the launch stays `Approved`
    Fatal,
}

/// Main launcher error type
#[derive(Error, Debug)]
pub enum LaunchError {
    // ========================================================================
    // Validation
    // ========================================================================

    #[error("Invalid amount: pledges must be greater than zero")]
    InvalidAmount,

    #[error("Unknown influencer: {0}")]
    UnknownInfluencer(Address),

    #[error("Pledge not found: {0}")]
    NotFound(PledgeId),

    #[error("Launch for {0} is closed to pledges")]
    LaunchClosed(Address),

    #[error("Threshold not met for {0}")]
    NotThresholdMet(Address),

    #[error("Launch for {0} is not approved")]
    NotApproved(Address),

    #[error("Invalid launch parameters: {0}")]
    InvalidParameters(String),

    #[error("Caller {caller} is not allowed to {action}")]
    Unauthorized { caller: Address, action: &'static str },

    // ========================================================================
    // Conflict
    // ========================================================================

    #[error("Pledge {0} already withdrawn")]
    AlreadyWithdrawn(PledgeId),

    #[error("Launch for {0} already registered")]
    AlreadyRegistered(Address),

    #[error("Launch for {0} already launched")]
    AlreadyLaunched(Address),

    #[error("Launch record for {0} was modified concurrently")]
    VersionConflict(Address),

    #[error("Liquidity bootstrap for {0} is already in flight")]
    BootstrapInFlight(Address),

    #[error("Transaction {0} already backs a different pledge")]
    DuplicateTransaction(B256),

    // ========================================================================
    // Fatal
    // ========================================================================

    #[error("Insufficient balance of {asset}: required {required}, available {available}")]
    InsufficientBalance {
        asset: Address,
        required: U256,
        available: U256,
    },

    #[error("Deadline {deadline} passed before transaction {tx_hash} was mined")]
    DeadlineExpired { tx_hash: B256, deadline: u64 },

    #[error("Transaction {tx_hash} reverted during {call}")]
    TransactionReverted { tx_hash: B256, call: &'static str },

    #[error("Unparsable result from {call}: {reason}")]
    UnparsableResult { call: &'static str, reason: String },

    #[error("Token factory is not configured; a token address is required")]
    TokenFactoryMissing,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    // ========================================================================
    // Infrastructure
    // ========================================================================

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Bootstrap(#[from] BootstrapFailure),
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Chain access errors
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Execution reverted: {0}")]
    Reverted(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Transaction {0} not confirmed in time")]
    ConfirmationTimeout(B256),

    #[error("Earlier mint submission may still land until deadline {0}")]
    SubmissionPending(u64),
}

/// A liquidity bootstrap attempt that stopped before completion
#[derive(Error, Debug)]
#[error("Liquidity bootstrap for {influencer} failed at step {step} (state mutated: {state_mutated}): {source}")]
pub struct BootstrapFailure {
    pub influencer: Address,
    pub step: BootstrapStep,
    /// A transaction was broadcast or the resume record advanced during this attempt
    pub state_mutated: bool,
    #[source]
    pub source: Box<LaunchError>,
}

/// Result type alias for launcher operations
pub type LaunchResult<T> = Result<T, LaunchError>;

impl LaunchError {
    pub fn class(&self) -> ErrorClass {
        match self {
            LaunchError::InvalidAmount
            | LaunchError::UnknownInfluencer(_)
            | LaunchError::NotFound(_)
            | LaunchError::LaunchClosed(_)
            | LaunchError::NotThresholdMet(_)
            | LaunchError::NotApproved(_)
            | LaunchError::InvalidParameters(_)
            | LaunchError::Unauthorized { .. } => ErrorClass::Validation,

            LaunchError::AlreadyWithdrawn(_)
            | LaunchError::AlreadyRegistered(_)
            | LaunchError::AlreadyLaunched(_)
            | LaunchError::VersionConflict(_)
            | LaunchError::BootstrapInFlight(_)
            | LaunchError::DuplicateTransaction(_) => ErrorClass::Conflict,

            LaunchError::InsufficientBalance { .. }
            | LaunchError::DeadlineExpired { .. }
            | LaunchError::TransactionReverted { .. }
            | LaunchError::UnparsableResult { .. }
            | LaunchError::TokenFactoryMissing
            | LaunchError::Configuration(_) => ErrorClass::Fatal,

            LaunchError::Core(err) => match err {
                CoreError::InvalidAmount
                | CoreError::InvalidSupply
                | CoreError::UnknownCurrency(_)
                | CoreError::IdenticalTokens
                | CoreError::NotThresholdMet
                | CoreError::NotApproved => ErrorClass::Validation,
                CoreError::AlreadyLaunched => ErrorClass::Conflict,
                _ => ErrorClass::Fatal,
            },

            LaunchError::Storage(err) => match err {
                StorageError::Database(_) => ErrorClass::Transient,
                _ => ErrorClass::Fatal,
            },

            LaunchError::Chain(err) => match err {
                ChainError::Reverted(_) => ErrorClass::Fatal,
                _ => ErrorClass::Transient,
            },

            LaunchError::Bootstrap(failure) => failure.source.class(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    pub fn unparsable(call: &'static str, reason: impl ToString) -> Self {
        LaunchError::UnparsableResult {
            call,
            reason: reason.to_string(),
        }
    }
}

impl BootstrapFailure {
    pub fn new(influencer: Address, step: BootstrapStep, state_mutated: bool, source: LaunchError) -> Self {
        Self {
            influencer,
            step,
            state_mutated,
            source: Box::new(source),
        }
    }
}

/// Helper to convert sqlx errors
impl From<sqlx::Error> for LaunchError {
    fn from(err: sqlx::Error) -> Self {
        LaunchError::Storage(StorageError::Database(err.to_string()))
    }
}

impl From<serde_json::Error> for LaunchError {
    fn from(err: serde_json::Error) -> Self {
        LaunchError::Storage(StorageError::Serialization(err.to_string()))
    }
}

impl From<reqwest::Error> for LaunchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LaunchError::Chain(ChainError::Timeout(Duration::ZERO))
        } else {
            LaunchError::Chain(ChainError::ConnectionFailed(err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(LaunchError::InvalidAmount.class(), ErrorClass::Validation);
        assert_eq!(
            LaunchError::AlreadyWithdrawn(PledgeId::new()).class(),
            ErrorClass::Conflict
        );
        assert_eq!(
            LaunchError::Chain(ChainError::Timeout(Duration::from_secs(1))).class(),
            ErrorClass::Transient
        );
        assert_eq!(
            LaunchError::Core(CoreError::InvalidTickRange { lower: 0, upper: 0, spacing: 60 }).class(),
            ErrorClass::Fatal
        );
    }

    #[test]
    fn test_bootstrap_failure_inherits_source_class() {
        let failure = BootstrapFailure::new(
            Address::ZERO,
            BootstrapStep::Mint,
            true,
            LaunchError::InsufficientBalance {
                asset: Address::ZERO,
                required: U256::from(2),
                available: U256::from(1),
            },
        );
        let err = LaunchError::from(failure);
        assert_eq!(err.class(), ErrorClass::Fatal);
        assert!(err.to_string().contains("step mint"));
    }
}
