//! Launch orchestration: approval, asset creation and the liquidity bootstrap

use crate::abi;
use crate::config::LauncherConfig;
use crate::core::{
    BootstrapFailure, BootstrapStep, ChainPort, ContractCall, InfluencerLaunch, LaunchError, LaunchEvent,
    LaunchEventKind, LaunchResult, LaunchStore, PoolBootstrapRecord,
};
use crate::domain::bootstrap::{BootstrapRequest, LiquidityBootstrapCoordinator};
use crate::domain::locks::KeyedLocks;
use crate::domain::retry::{Confirmations, RetryPolicy};
use crate::domain::state_machine::LaunchStateMachine;
use crate::metrics::LaunchMetrics;
use alloy_primitives::{Address, B256, U256};
use coinfluence_core::allocate;
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Caller identities allowed to perform administrative actions. An empty
/// policy admits nobody.
#[derive(Debug, Clone, Default)]
pub struct AdminPolicy {
    admins: HashSet<Address>,
}

impl AdminPolicy {
    pub fn new(admins: impl IntoIterator<Item = Address>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    pub fn is_admin(&self, caller: &Address) -> bool {
        self.admins.contains(caller)
    }

    pub fn check(&self, caller: Address, action: &'static str) -> LaunchResult<()> {
        if self.is_admin(&caller) {
            Ok(())
        } else {
            Err(LaunchError::Unauthorized { caller, action })
        }
    }
}

/// Asset creation parameters
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub token_factory: Option<Address>,
    pub total_supply: u128,
    pub creation_fee: U256,
}

impl TokenSettings {
    pub fn from_config(config: &LauncherConfig) -> Self {
        Self {
            token_factory: config.chain.token_factory,
            total_supply: config.token.total_supply,
            creation_fee: U256::from(config.token.creation_fee),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LaunchOutcome {
    pub launch: InfluencerLaunch,
    pub bootstrap: PoolBootstrapRecord,
}

pub struct LaunchService<S: LaunchStore, C: ChainPort> {
    store: Arc<S>,
    chain: Arc<C>,
    locks: Arc<KeyedLocks>,
    coordinator: Arc<LiquidityBootstrapCoordinator<S, C>>,
    admins: AdminPolicy,
    token: TokenSettings,
    retry: RetryPolicy,
    confirmations: Confirmations,
    metrics: Arc<LaunchMetrics>,
}

impl<S: LaunchStore, C: ChainPort> LaunchService<S, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<S>,
        chain: Arc<C>,
        locks: Arc<KeyedLocks>,
        coordinator: Arc<LiquidityBootstrapCoordinator<S, C>>,
        admins: AdminPolicy,
        token: TokenSettings,
        retry: RetryPolicy,
        metrics: Arc<LaunchMetrics>,
    ) -> Self {
        let confirmations = coordinator.settings().confirmations;
        Self {
            store,
            chain,
            locks,
            coordinator,
            admins,
            token,
            retry,
            confirmations,
            metrics,
        }
    }

    pub fn admins(&self) -> &AdminPolicy {
        &self.admins
    }

    pub fn coordinator(&self) -> &Arc<LiquidityBootstrapCoordinator<S, C>> {
        &self.coordinator
    }

    pub async fn bootstrap_record(&self, influencer: Address) -> LaunchResult<Option<PoolBootstrapRecord>> {
        self.load(influencer).await?;
        self.coordinator.record(&influencer).await
    }

    /// `ThresholdMet -> Approved`; approving twice is a no-op
    pub async fn approve(&self, caller: Address, influencer: Address) -> LaunchResult<InfluencerLaunch> {
        self.admins.check(caller, "approve launches")?;

        let _guard = self.locks.lock(influencer).await;
        let mut launch = self.load(influencer).await?;
        let expected_version = launch.version;
        if !LaunchStateMachine::approve(&mut launch, caller)? {
            return Ok(launch);
        }
        launch.touch();
        self.store.update_launch(&launch, expected_version).await?;

        self.metrics.approvals.inc();
        info!(%influencer, approved_by = %caller, "Launch approved");
        self.emit(influencer, LaunchEventKind::Approved, json!({ "approved_by": caller }))
            .await;
        Ok(launch)
    }

    /// Launch an approved influencer: resolve the asset (supplied, recorded,
    /// or created through the token factory), then run or resume the
    /// liquidity bootstrap. Any failure leaves the launch `Approved`.
    pub async fn launch(
        &self,
        caller: Address,
        influencer: Address,
        token_address: Option<Address>,
    ) -> LaunchResult<LaunchOutcome> {
        self.admins.check(caller, "launch")?;
        if token_address == Some(Address::ZERO) {
            return Err(LaunchError::InvalidParameters("token address cannot be zero".to_string()));
        }
        LaunchStateMachine::ensure_launchable(&self.load(influencer).await?)?;

        let slot = self.coordinator.begin(influencer)?;
        // Re-read under the slot: a concurrent launch may have just finished
        let launch = self.load(influencer).await?;
        LaunchStateMachine::ensure_launchable(&launch)?;

        let plan = allocate(self.token.total_supply)?;
        let target_asset = match (self.coordinator.record(&influencer).await?, token_address) {
            (Some(record), Some(requested)) if record.target_asset != requested => {
                return Err(LaunchError::InvalidParameters(format!(
                    "launch is already bootstrapping asset {}",
                    record.target_asset
                )));
            }
            (Some(record), _) => record.target_asset,
            (None, Some(requested)) => requested,
            (None, None) => match self.create_token(&launch).await {
                Ok(token) => token,
                Err(failure) => return Err(self.report_failure(failure).await),
            },
        };

        info!(%influencer, %target_asset, supply = %plan.total_supply, "Starting launch");
        let request = BootstrapRequest {
            influencer,
            target_asset,
            plan,
        };

        match self.coordinator.bootstrap(&slot, request).await {
            Ok(record) => {
                let launch = self.load(influencer).await?;
                self.metrics.launches_completed.inc();
                if let Some(position) = record.position {
                    self.emit(
                        influencer,
                        LaunchEventKind::LiquidityCreated,
                        json!({
                            "pool": record.pool_address,
                            "token_id": position.token_id,
                            "liquidity": position.liquidity.to_string(),
                            "amount0": position.amount0,
                            "amount1": position.amount1,
                            "tx_hash": position.tx_hash,
                        }),
                    )
                    .await;
                }
                self.emit(
                    influencer,
                    LaunchEventKind::Launched,
                    json!({ "token": launch.token_address, "pool": launch.pool_address }),
                )
                .await;
                info!(%influencer, token = %target_asset, pool = ?launch.pool_address, "Launch complete");
                Ok(LaunchOutcome {
                    launch,
                    bootstrap: record,
                })
            }
            Err(failure) => Err(self.report_failure(failure).await),
        }
    }

    async fn report_failure(&self, failure: BootstrapFailure) -> LaunchError {
        self.emit(
            failure.influencer,
            LaunchEventKind::LiquidityFailed,
            json!({
                "step": failure.step.as_str(),
                "state_mutated": failure.state_mutated,
                "class": failure.source.class(),
                "error": failure.source.to_string(),
            }),
        )
        .await;
        failure.into()
    }

    /// Deploy the launch asset through the token factory, or resolve a
    /// deployment submitted by an earlier attempt
    async fn create_token(&self, launch: &InfluencerLaunch) -> Result<Address, BootstrapFailure> {
        let influencer = launch.influencer;
        let mut mutated = false;
        match self.deploy_token(launch, &mut mutated).await {
            Ok(token) => {
                self.metrics.record_step(BootstrapStep::CreateToken.as_str(), "ok");
                Ok(token)
            }
            Err(err) => {
                self.metrics.record_step(BootstrapStep::CreateToken.as_str(), "failed");
                error!(
                    %influencer,
                    state_mutated = mutated,
                    class = ?err.class(),
                    error = %err,
                    "Token deployment failed"
                );
                Err(BootstrapFailure::new(influencer, BootstrapStep::CreateToken, mutated, err))
            }
        }
    }

    async fn deploy_token(&self, launch: &InfluencerLaunch, mutated: &mut bool) -> LaunchResult<Address> {
        let factory = self.token.token_factory.ok_or(LaunchError::TokenFactoryMissing)?;
        let influencer = launch.influencer;

        let tx_hash = match launch.token_deployment_tx {
            Some(tx_hash) => tx_hash,
            None => {
                let call = ContractCall::CreateToken {
                    name: launch.token_name.clone(),
                    symbol: launch.token_symbol.clone(),
                    influencer_name: launch.influencer_name.clone(),
                    influencer,
                    total_supply: U256::from(self.token.total_supply),
                    creation_fee: self.token.creation_fee,
                };
                // Never resubmitted blindly: a second call would deploy a second asset
                let tx_hash = self.retry.once(self.chain.submit(call)).await?;
                *mutated = true;
                self.set_deployment_tx(influencer, Some(tx_hash)).await?;
                info!(%influencer, %tx_hash, "Token deployment submitted");
                tx_hash
            }
        };

        let receipt = self
            .confirmations
            .wait(self.chain.as_ref(), &self.retry, tx_hash)
            .await?;
        if !receipt.success {
            *mutated = true;
            self.set_deployment_tx(influencer, None).await?;
            return Err(LaunchError::TransactionReverted {
                tx_hash,
                call: "create_token",
            });
        }

        let token = abi::decode_created_token(&receipt, factory)?;
        info!(%influencer, %token, %tx_hash, "Token deployed");
        self.emit(
            influencer,
            LaunchEventKind::TokenCreated,
            json!({ "token": token, "tx_hash": tx_hash }),
        )
        .await;
        Ok(token)
    }

    async fn set_deployment_tx(&self, influencer: Address, tx_hash: Option<B256>) -> LaunchResult<()> {
        let _guard = self.locks.lock(influencer).await;
        let mut launch = self.load(influencer).await?;
        let expected_version = launch.version;
        launch.token_deployment_tx = tx_hash;
        launch.touch();
        self.store.update_launch(&launch, expected_version).await
    }

    async fn emit(&self, influencer: Address, kind: LaunchEventKind, payload: serde_json::Value) {
        let event = LaunchEvent::new(influencer, kind, payload);
        if let Err(e) = self.store.append_event(&event).await {
            warn!(%influencer, kind = kind.as_str(), error = %e, "Failed to append launch event");
        }
    }

    async fn load(&self, influencer: Address) -> LaunchResult<InfluencerLaunch> {
        self.store
            .get_launch(&influencer)
            .await?
            .ok_or(LaunchError::UnknownInfluencer(influencer))
    }
}
