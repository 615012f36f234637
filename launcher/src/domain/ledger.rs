//! Pledge ledger
//!
//! Owns pledge records and the per-launch aggregates. Every mutation runs
//! under the influencer's lock and is committed together with the launch
//! record, so `total_pledged_*` always equals the sum of active pledges.

use crate::core::{
    InfluencerLaunch, LaunchError, LaunchEvent, LaunchEventKind, LaunchProgress, LaunchResult, LaunchStore,
    NewLaunch, PlatformStats, Pledge, PledgeId,
};
use crate::domain::locks::KeyedLocks;
use crate::domain::state_machine::LaunchStateMachine;
use crate::metrics::LaunchMetrics;
use alloy_primitives::{Address, B256};
use chrono::Utc;
use coinfluence_core::{Currency, Thresholds};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Attempts at a ledger unit that lost a version race to another writer
const MAX_CONFLICT_ATTEMPTS: usize = 3;

/// Longest accepted token symbol
const MAX_SYMBOL_LEN: usize = 11;

pub struct PledgeLedger<S: LaunchStore> {
    store: Arc<S>,
    locks: Arc<KeyedLocks>,
    metrics: Arc<LaunchMetrics>,
}

impl<S: LaunchStore> PledgeLedger<S> {
    pub fn new(store: Arc<S>, locks: Arc<KeyedLocks>, metrics: Arc<LaunchMetrics>) -> Self {
        Self { store, locks, metrics }
    }

    /// Open a launch for pledges
    pub async fn register_launch(&self, params: NewLaunch) -> LaunchResult<InfluencerLaunch> {
        validate_registration(&params)?;

        let _guard = self.locks.lock(params.influencer).await;
        if self.store.get_launch(&params.influencer).await?.is_some() {
            return Err(LaunchError::AlreadyRegistered(params.influencer));
        }

        let launch = InfluencerLaunch::new(params);
        self.store.insert_launch(&launch).await?;

        info!(
            influencer = %launch.influencer,
            symbol = %launch.token_symbol,
            threshold_eth = %launch.threshold_eth,
            threshold_usdc = %launch.threshold_usdc,
            "Launch registered"
        );
        Ok(launch)
    }

    /// Record a pledge and re-evaluate the threshold in the same atomic unit
    pub async fn submit_pledge(
        &self,
        influencer: Address,
        pledger: Address,
        amount: u128,
        currency: Currency,
        tx_hash: Option<B256>,
    ) -> LaunchResult<PledgeId> {
        if amount == 0 {
            return Err(LaunchError::InvalidAmount);
        }

        // Unregistered addresses never reach the lock map; try_submit re-reads under the lock
        self.load(influencer).await?;

        let _guard = self.locks.lock(influencer).await;
        let mut attempt = 1;
        loop {
            match self.try_submit(influencer, pledger, amount, currency, tx_hash).await {
                Err(LaunchError::VersionConflict(_)) if attempt < MAX_CONFLICT_ATTEMPTS => {
                    debug!(%influencer, attempt, "Pledge lost a version race, re-reading launch");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn try_submit(
        &self,
        influencer: Address,
        pledger: Address,
        amount: u128,
        currency: Currency,
        tx_hash: Option<B256>,
    ) -> LaunchResult<PledgeId> {
        let mut launch = self.load(influencer).await?;

        // A redelivered transfer resolves to the pledge it already backs
        if let Some(tx_hash) = tx_hash {
            if let Some(existing) = self.store.pledge_by_tx(&tx_hash).await? {
                let same_transfer = existing.influencer == influencer
                    && existing.pledger == pledger
                    && existing.amount == amount
                    && existing.currency == currency;
                if !same_transfer {
                    return Err(LaunchError::DuplicateTransaction(tx_hash));
                }
                debug!(%influencer, pledge_id = %existing.id, %tx_hash, "Pledge already recorded for transaction");
                return Ok(existing.id);
            }
        }

        if !launch.status.accepts_pledges() {
            return Err(LaunchError::LaunchClosed(influencer));
        }

        let expected_version = launch.version;
        let first_pledge = !self.store.has_pledged(&influencer, &pledger).await?;

        launch.credit(currency, amount)?;
        if first_pledge {
            launch.pledger_count += 1;
        }
        let promoted = LaunchStateMachine::on_ledger_change(&mut launch);
        launch.touch();

        let pledge = Pledge::new(influencer, pledger, amount, currency, tx_hash);
        self.store.commit_pledge(&launch, expected_version, &pledge).await?;

        self.metrics
            .pledges_submitted
            .with_label_values(&[currency.as_str()])
            .inc();
        info!(
            %influencer,
            %pledger,
            pledge_id = %pledge.id,
            amount = %amount,
            currency = %currency,
            total = %launch.total_for(currency),
            "Pledge recorded"
        );

        if promoted {
            self.metrics.threshold_triggers.inc();
            info!(%influencer, "Funding threshold met");
            let event = LaunchEvent::new(
                influencer,
                LaunchEventKind::ThresholdMet,
                json!({
                    "total_pledged_eth": launch.total_pledged_eth.to_string(),
                    "total_pledged_usdc": launch.total_pledged_usdc.to_string(),
                    "pledger_count": launch.pledger_count,
                }),
            );
            // The pledge is committed; a lost audit entry must not fail it
            if let Err(e) = self.store.append_event(&event).await {
                warn!(%influencer, error = %e, "Failed to append ThresholdMet event");
            }
        }

        Ok(pledge.id)
    }

    /// Withdraw an active pledge before launch, releasing its exact amount
    pub async fn withdraw_pledge(&self, id: PledgeId) -> LaunchResult<Pledge> {
        // Unlocked read only to pick the lock; try_withdraw re-reads the pledge under it
        let influencer = self
            .store
            .get_pledge(&id)
            .await?
            .ok_or(LaunchError::NotFound(id))?
            .influencer;

        let _guard = self.locks.lock(influencer).await;
        let mut attempt = 1;
        loop {
            match self.try_withdraw(id).await {
                Err(LaunchError::VersionConflict(_)) if attempt < MAX_CONFLICT_ATTEMPTS => {
                    debug!(%influencer, attempt, "Withdrawal lost a version race, re-reading launch");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn try_withdraw(&self, id: PledgeId) -> LaunchResult<Pledge> {
        let mut pledge = self.store.get_pledge(&id).await?.ok_or(LaunchError::NotFound(id))?;
        if pledge.withdrawn {
            return Err(LaunchError::AlreadyWithdrawn(id));
        }

        let mut launch = self.load(pledge.influencer).await?;
        if !launch.status.accepts_pledges() {
            return Err(LaunchError::LaunchClosed(pledge.influencer));
        }

        let expected_version = launch.version;
        launch.debit(pledge.currency, pledge.amount)?;
        LaunchStateMachine::on_ledger_change(&mut launch);
        launch.touch();

        pledge.withdrawn = true;
        pledge.withdrawn_at = Some(Utc::now());
        self.store.commit_pledge(&launch, expected_version, &pledge).await?;

        self.metrics
            .pledges_withdrawn
            .with_label_values(&[pledge.currency.as_str()])
            .inc();
        info!(
            influencer = %pledge.influencer,
            pledge_id = %id,
            amount = %pledge.amount,
            currency = %pledge.currency,
            "Pledge withdrawn"
        );
        Ok(pledge)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn launch(&self, influencer: Address) -> LaunchResult<InfluencerLaunch> {
        self.load(influencer).await
    }

    pub async fn launches(&self) -> LaunchResult<Vec<InfluencerLaunch>> {
        self.store.list_launches().await
    }

    pub async fn pledge(&self, id: PledgeId) -> LaunchResult<Pledge> {
        self.store.get_pledge(&id).await?.ok_or(LaunchError::NotFound(id))
    }

    pub async fn pledges_for(&self, influencer: Address) -> LaunchResult<Vec<Pledge>> {
        self.load(influencer).await?;
        self.store.pledges_for(&influencer).await
    }

    pub async fn pledges_by(&self, pledger: Address) -> LaunchResult<Vec<Pledge>> {
        self.store.pledges_by(&pledger).await
    }

    pub async fn progress(&self, influencer: Address) -> LaunchResult<LaunchProgress> {
        Ok(self.load(influencer).await?.progress())
    }

    pub async fn stats(&self) -> LaunchResult<PlatformStats> {
        let launches = self.store.list_launches().await?;
        Ok(PlatformStats::from_launches(&launches))
    }

    pub async fn events(&self, influencer: Address) -> LaunchResult<Vec<LaunchEvent>> {
        self.load(influencer).await?;
        self.store.events_for(&influencer).await
    }

    async fn load(&self, influencer: Address) -> LaunchResult<InfluencerLaunch> {
        self.store
            .get_launch(&influencer)
            .await?
            .ok_or(LaunchError::UnknownInfluencer(influencer))
    }
}

fn validate_registration(params: &NewLaunch) -> LaunchResult<()> {
    if params.influencer == Address::ZERO {
        return Err(LaunchError::InvalidParameters("influencer address cannot be zero".to_string()));
    }
    if params.influencer_name.trim().is_empty() || params.token_name.trim().is_empty() {
        return Err(LaunchError::InvalidParameters("influencer and token names are required".to_string()));
    }
    let symbol = params.token_symbol.trim();
    if symbol.is_empty() || symbol.len() > MAX_SYMBOL_LEN || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(LaunchError::InvalidParameters(format!(
            "token symbol must be 1-{} ASCII alphanumeric characters",
            MAX_SYMBOL_LEN
        )));
    }
    if !Thresholds::new(params.threshold_eth, params.threshold_usdc).is_configured() {
        return Err(LaunchError::InvalidParameters(
            "at least one funding threshold must be configured".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> NewLaunch {
        NewLaunch {
            influencer: Address::repeat_byte(0x11),
            influencer_name: "Alice".to_string(),
            token_name: "Alice Coin".to_string(),
            token_symbol: "ALICE".to_string(),
            threshold_eth: 1_000,
            threshold_usdc: 0,
        }
    }

    #[test]
    fn test_registration_validation() {
        assert!(validate_registration(&params()).is_ok());

        let mut no_threshold = params();
        no_threshold.threshold_eth = 0;
        assert!(matches!(
            validate_registration(&no_threshold),
            Err(LaunchError::InvalidParameters(_))
        ));

        let mut bad_symbol = params();
        bad_symbol.token_symbol = "AL ICE".to_string();
        assert!(validate_registration(&bad_symbol).is_err());

        let mut zero = params();
        zero.influencer = Address::ZERO;
        assert!(validate_registration(&zero).is_err());
    }
}
