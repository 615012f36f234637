//! Launch lifecycle transitions
//!
//! `Collecting -> ThresholdMet -> Approved -> Launched`, forward only. All
//! status writes go through here so the transition table lives in one place.

use crate::core::{InfluencerLaunch, LaunchError, LaunchResult};
use alloy_primitives::Address;
use chrono::Utc;
use coinfluence_core::{CoreError, LaunchStatus};

pub struct LaunchStateMachine;

impl LaunchStateMachine {
    /// Re-evaluate the threshold after a ledger change. Returns `true` when the
    /// launch was promoted to `ThresholdMet`; an already-met launch never reverts.
    pub fn on_ledger_change(launch: &mut InfluencerLaunch) -> bool {
        match launch.status.on_threshold(launch.threshold_met()) {
            Some(next) => {
                launch.status = next;
                true
            }
            None => false,
        }
    }

    /// `ThresholdMet -> Approved`. Approving an approved launch is a no-op and
    /// returns `false`.
    pub fn approve(launch: &mut InfluencerLaunch, approver: Address) -> LaunchResult<bool> {
        let next = launch
            .status
            .approve()
            .map_err(|e| lifecycle_error(e, launch.influencer))?;

        match next {
            Some(status) => {
                launch.status = status;
                launch.approved_at = Some(Utc::now());
                launch.approved_by = Some(approver);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Only approved launches may start the launch procedure
    pub fn ensure_launchable(launch: &InfluencerLaunch) -> LaunchResult<()> {
        match launch.status {
            LaunchStatus::Approved => Ok(()),
            LaunchStatus::Launched => Err(LaunchError::AlreadyLaunched(launch.influencer)),
            LaunchStatus::Collecting | LaunchStatus::ThresholdMet => Err(LaunchError::NotApproved(launch.influencer)),
        }
    }

    /// `Approved -> Launched`, recording where the asset and its pool live
    pub fn complete(launch: &mut InfluencerLaunch, token: Address, pool: Address) -> LaunchResult<()> {
        launch.status = launch
            .status
            .complete_launch()
            .map_err(|e| lifecycle_error(e, launch.influencer))?;
        launch.token_address = Some(token);
        launch.pool_address = Some(pool);
        launch.token_deployment_tx = None;
        launch.launched_at = Some(Utc::now());
        Ok(())
    }
}

fn lifecycle_error(err: CoreError, influencer: Address) -> LaunchError {
    match err {
        CoreError::NotThresholdMet => LaunchError::NotThresholdMet(influencer),
        CoreError::NotApproved => LaunchError::NotApproved(influencer),
        CoreError::AlreadyLaunched => LaunchError::AlreadyLaunched(influencer),
        other => LaunchError::Core(other),
    }
}
