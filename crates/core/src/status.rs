//! # Status Transitions
//!
//! Forward-only lifecycle rules: `Collecting → ThresholdMet → Approved → Launched`.
//! Every function returns the status to move to, or `None` when the request is
//! already satisfied, so callers can apply transitions idempotently.

use crate::errors::{CoreError, CoreResult};
use crate::types::LaunchStatus;

impl LaunchStatus {
    /// Automatic promotion after a ledger mutation. Only `Collecting` moves;
    /// later states never revert when totals drop.
    pub fn on_threshold(self, met: bool) -> Option<LaunchStatus> {
        match (self, met) {
            (LaunchStatus::Collecting, true) => Some(LaunchStatus::ThresholdMet),
            _ => None,
        }
    }

    /// Administrative approval.
    pub fn approve(self) -> CoreResult<Option<LaunchStatus>> {
        match self {
            LaunchStatus::Collecting => Err(CoreError::NotThresholdMet),
            LaunchStatus::ThresholdMet => Ok(Some(LaunchStatus::Approved)),
            LaunchStatus::Approved => Ok(None),
            LaunchStatus::Launched => Err(CoreError::AlreadyLaunched),
        }
    }

    /// Completion after allocation and liquidity bootstrap both succeeded.
    pub fn complete_launch(self) -> CoreResult<LaunchStatus> {
        match self {
            LaunchStatus::Approved => Ok(LaunchStatus::Launched),
            LaunchStatus::Launched => Err(CoreError::AlreadyLaunched),
            _ => Err(CoreError::NotApproved),
        }
    }
}
