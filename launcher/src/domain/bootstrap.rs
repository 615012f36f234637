//! Liquidity bootstrap coordinator
//!
//! Drives a launched asset from "tokens in the launcher account" to "full-range
//! position on the AMM" as a resumable sequence of steps:
//!
//! 1. canonicalize the pair and plan amounts
//! 2. ensure the pool exists and is initialized
//! 3. check balances and authorize the position manager
//! 4. compute the full-range ticks
//! 5. mint the position
//! 6. finalize the launch record
//!
//! Progress is persisted in a [`PoolBootstrapRecord`] after every step and
//! every broadcast, so a retry resumes where the last attempt stopped. Pool
//! creation and approvals are safe to repeat; a mint is only re-submitted once
//! the previous submission is known to have failed or expired, and never while
//! a matching position already exists.

use crate::abi::{self, Deployment};
use crate::config::LauncherConfig;
use crate::core::{
    BootstrapFailure, BootstrapStep, ChainError, ChainPort, ContractCall, LaunchError, LaunchResult, LaunchStore,
    MintIntent, MintParams, MintSubmission, MintedPosition, PoolBootstrapRecord, TxReceipt,
};
use crate::domain::locks::{InFlightGuard, InFlightRegistry, KeyedLocks};
use crate::domain::retry::{Confirmations, RetryPolicy};
use crate::domain::state_machine::LaunchStateMachine;
use crate::metrics::LaunchMetrics;
use alloy_primitives::{Address, B256, U256};
use chrono::Utc;
use coinfluence_core::math::{encode_sqrt_price_x96, full_range_for_fee, minimum_amount};
use coinfluence_core::{AllocationPlan, FeeTier, LaunchStatus, TokenPair};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Attempts at the finalize write when it races another writer
const MAX_FINALIZE_ATTEMPTS: usize = 3;

/// Liquidity parameters shared by every bootstrap
#[derive(Debug, Clone)]
pub struct LiquiditySettings {
    pub deployment: Deployment,
    pub fee_tier: FeeTier,
    pub base_amount: u128,
    pub token_bps: u32,
    pub slippage_bps: u32,
    pub deadline_secs: u64,
    pub gas_reserve: U256,
    pub confirmations: Confirmations,
}

impl LiquiditySettings {
    pub fn from_config(config: &LauncherConfig) -> Self {
        Self {
            deployment: Deployment::from(&config.chain),
            fee_tier: config.fee_tier(),
            base_amount: config.liquidity.base_amount,
            token_bps: config.liquidity.token_bps,
            slippage_bps: config.liquidity.slippage_bps,
            deadline_secs: config.liquidity.deadline_secs,
            gas_reserve: U256::from(config.liquidity.gas_reserve),
            confirmations: Confirmations {
                poll_interval: config.chain.poll_interval(),
                timeout: config.chain.confirmation_timeout(),
            },
        }
    }
}

/// What to bootstrap
#[derive(Debug, Clone)]
pub struct BootstrapRequest {
    pub influencer: Address,
    /// The launched asset
    pub target_asset: Address,
    pub plan: AllocationPlan,
}

/// How a recorded mint submission resolved. Anything but `Minted` allows a
/// fresh submission.
enum MintResolution {
    Minted(MintedPosition),
    Reverted,
    Expired,
}

pub struct LiquidityBootstrapCoordinator<S: LaunchStore, C: ChainPort> {
    store: Arc<S>,
    chain: Arc<C>,
    locks: Arc<KeyedLocks>,
    in_flight: InFlightRegistry,
    retry: RetryPolicy,
    settings: LiquiditySettings,
    metrics: Arc<LaunchMetrics>,
}

impl<S: LaunchStore, C: ChainPort> LiquidityBootstrapCoordinator<S, C> {
    pub fn new(
        store: Arc<S>,
        chain: Arc<C>,
        locks: Arc<KeyedLocks>,
        retry: RetryPolicy,
        settings: LiquiditySettings,
        metrics: Arc<LaunchMetrics>,
    ) -> Self {
        Self {
            store,
            chain,
            locks,
            in_flight: InFlightRegistry::new(),
            retry,
            settings,
            metrics,
        }
    }

    pub fn settings(&self) -> &LiquiditySettings {
        &self.settings
    }

    /// Claim the bootstrap slot for an influencer; held for the whole launch
    pub fn begin(&self, influencer: Address) -> LaunchResult<InFlightGuard<'_>> {
        self.in_flight
            .try_acquire(influencer)
            .ok_or(LaunchError::BootstrapInFlight(influencer))
    }

    pub fn is_in_flight(&self, influencer: &Address) -> bool {
        self.in_flight.is_active(influencer)
    }

    pub async fn record(&self, influencer: &Address) -> LaunchResult<Option<PoolBootstrapRecord>> {
        self.store.get_bootstrap(influencer).await
    }

    /// Run or resume the bootstrap. On failure the launch stays `Approved` and
    /// the error names the step reached and whether anything was mutated.
    pub async fn bootstrap(
        &self,
        slot: &InFlightGuard<'_>,
        request: BootstrapRequest,
    ) -> Result<PoolBootstrapRecord, BootstrapFailure> {
        let influencer = request.influencer;
        if slot.key() != influencer {
            return Err(BootstrapFailure::new(
                influencer,
                BootstrapStep::Canonicalize,
                false,
                LaunchError::BootstrapInFlight(slot.key()),
            ));
        }

        self.metrics.bootstraps_in_flight.inc();
        let mut mutated = false;
        let mut latest = None;
        let result = self.drive(&request, &mut latest, &mut mutated).await;
        self.metrics.bootstraps_in_flight.dec();

        match result {
            Ok(record) => {
                info!(
                    %influencer,
                    pool = ?record.pool_address,
                    token_id = ?record.position.map(|p| p.token_id),
                    attempts = record.attempts,
                    "Liquidity bootstrap complete"
                );
                Ok(record)
            }
            Err((step, err)) => {
                self.metrics.record_step(step.as_str(), "failed");
                error!(
                    %influencer,
                    step = %step,
                    state_mutated = mutated,
                    class = ?err.class(),
                    error = %err,
                    "Liquidity bootstrap failed"
                );
                if let Some(mut record) = latest {
                    record.last_error = Some(format!("{}: {}", step, err));
                    record.updated_at = Utc::now();
                    if let Err(e) = self.save(&record).await {
                        warn!(%influencer, error = %e, "Failed to persist bootstrap failure");
                    }
                }
                Err(BootstrapFailure::new(influencer, step, mutated, err))
            }
        }
    }

    async fn drive(
        &self,
        request: &BootstrapRequest,
        latest: &mut Option<PoolBootstrapRecord>,
        mutated: &mut bool,
    ) -> Result<PoolBootstrapRecord, (BootstrapStep, LaunchError)> {
        let mut record = self
            .load_or_plan(request, mutated)
            .await
            .map_err(|e| (BootstrapStep::Canonicalize, e))?;

        if !record.is_complete() {
            record.attempts += 1;
            record.last_error = None;
        }
        *latest = Some(record.clone());

        macro_rules! step {
            ($step:expr, $call:expr) => {{
                let outcome = $call.await;
                *latest = Some(record.clone());
                match outcome {
                    Ok(value) => {
                        self.metrics.record_step($step.as_str(), "ok");
                        value
                    }
                    Err(e) => return Err(($step, e)),
                }
            }};
        }

        if record.position.is_none() {
            step!(BootstrapStep::EnsurePool, self.ensure_pool(&mut record, mutated));
            step!(BootstrapStep::Authorize, self.authorize(&mut record, mutated));
            step!(BootstrapStep::ComputeRange, self.compute_range(&mut record, mutated));
            step!(BootstrapStep::Mint, self.mint(&mut record, mutated));
        }
        step!(BootstrapStep::Finalize, self.finalize(&mut record, mutated));

        Ok(record)
    }

    // ========================================================================
    // Step 1: canonicalize and plan
    // ========================================================================

    async fn load_or_plan(&self, request: &BootstrapRequest, mutated: &mut bool) -> LaunchResult<PoolBootstrapRecord> {
        if let Some(existing) = self.retry.run("get_bootstrap", || self.store.get_bootstrap(&request.influencer)).await? {
            if existing.target_asset != request.target_asset {
                return Err(LaunchError::InvalidParameters(format!(
                    "bootstrap for {} is already planned against asset {}",
                    request.influencer, existing.target_asset
                )));
            }
            debug!(influencer = %request.influencer, step = %existing.step, "Resuming liquidity bootstrap");
            return Ok(existing);
        }

        let record = self.plan(request)?;
        self.save(&record).await?;
        *mutated = true;

        info!(
            influencer = %request.influencer,
            token0 = %record.token0,
            token1 = %record.token1,
            fee = %record.fee_tier,
            token_amount = %record.token_amount,
            base_amount = %record.base_amount,
            "Liquidity bootstrap planned"
        );
        Ok(record)
    }

    fn plan(&self, request: &BootstrapRequest) -> LaunchResult<PoolBootstrapRecord> {
        let base_asset = self.settings.deployment.base_asset;
        let pair = TokenPair::canonical(request.target_asset, base_asset)?;
        let token_amount = request.plan.liquidity_seed(self.settings.token_bps)?;
        let base_amount = self.settings.base_amount;

        let (amount0_desired, amount1_desired) =
            pair.order_amounts(&request.target_asset, U256::from(token_amount), U256::from(base_amount));
        let amount0_min = minimum_amount(amount0_desired, self.settings.slippage_bps)?;
        let amount1_min = minimum_amount(amount1_desired, self.settings.slippage_bps)?;

        let now = Utc::now();
        Ok(PoolBootstrapRecord {
            influencer: request.influencer,
            target_asset: request.target_asset,
            base_asset,
            fee_tier: self.settings.fee_tier,
            token0: pair.token0,
            token1: pair.token1,
            total_supply: request.plan.total_supply,
            influencer_allocation: request.plan.influencer,
            treasury_allocation: request.plan.treasury,
            platform_allocation: request.plan.platform,
            token_amount,
            base_amount,
            amount0_desired,
            amount1_desired,
            amount0_min,
            amount1_min,
            tick_range: None,
            pool_address: None,
            pool_tx: None,
            approval_tx: None,
            mint_intent: None,
            mint: None,
            position: None,
            step: BootstrapStep::EnsurePool,
            attempts: 0,
            last_error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        })
    }

    // ========================================================================
    // Step 2: pool
    // ========================================================================

    async fn ensure_pool(&self, record: &mut PoolBootstrapRecord, mutated: &mut bool) -> LaunchResult<()> {
        let pool = match self.initialized_pool(record).await? {
            Some(pool) => pool,
            None => self.create_pool(record, mutated).await?,
        };

        if record.pool_address != Some(pool) || record.step < BootstrapStep::Authorize {
            record.pool_address = Some(pool);
            record.advance(BootstrapStep::Authorize);
            self.save(record).await?;
            *mutated = true;
        }
        Ok(())
    }

    /// The pair's pool, if it exists and carries a price
    async fn initialized_pool(&self, record: &PoolBootstrapRecord) -> LaunchResult<Option<Address>> {
        let pair = record.pair();
        let fee = record.fee_tier;
        let Some(pool) = self.retry.run("getPool", || self.chain.get_pool(&pair, fee)).await? else {
            return Ok(None);
        };
        let sqrt_price = self.retry.run("slot0", || self.chain.pool_sqrt_price(pool)).await?;
        if sqrt_price.is_zero() {
            debug!(%pool, "Pool exists but is uninitialized");
            return Ok(None);
        }
        Ok(Some(pool))
    }

    async fn create_pool(&self, record: &mut PoolBootstrapRecord, mutated: &mut bool) -> LaunchResult<Address> {
        let tx_hash = match record.pool_tx {
            Some(tx_hash) => tx_hash,
            None => {
                let (amount0, amount1) = record.ordered_seed();
                let call = ContractCall::CreateAndInitializePool {
                    token0: record.token0,
                    token1: record.token1,
                    fee: record.fee_tier,
                    sqrt_price_x96: encode_sqrt_price_x96(amount1, amount0)?,
                };
                // createAndInitializePoolIfNecessary is a no-op once the pool is live
                let tx_hash = self
                    .retry
                    .run("createAndInitializePoolIfNecessary", || self.chain.submit(call.clone()))
                    .await?;
                *mutated = true;
                record.pool_tx = Some(tx_hash);
                self.save(record).await?;
                info!(influencer = %record.influencer, %tx_hash, "Pool creation submitted");
                tx_hash
            }
        };

        let receipt = self.confirm(tx_hash).await?;
        if !receipt.success {
            record.pool_tx = None;
            self.save(record).await?;
            // Another party may have created the pool first
            if let Some(pool) = self.initialized_pool(record).await? {
                warn!(%tx_hash, %pool, "Pool creation reverted but the pool is live, continuing");
                return Ok(pool);
            }
            return Err(LaunchError::TransactionReverted {
                tx_hash,
                call: "create_pool",
            });
        }

        self.initialized_pool(record)
            .await?
            .ok_or_else(|| LaunchError::unparsable("getPool", "pool missing or uninitialized after creation"))
    }

    // ========================================================================
    // Step 3: balances and approval
    // ========================================================================

    async fn authorize(&self, record: &mut PoolBootstrapRecord, mutated: &mut bool) -> LaunchResult<()> {
        if record.mint.is_some() {
            // Funds may already be committed to a pending mint
            return Ok(());
        }
        self.check_balances(record).await?;

        let token_amount = U256::from(record.token_amount);
        if self.current_allowance(record).await? < token_amount {
            self.approve(record, token_amount, mutated).await?;
        }

        if record.step < BootstrapStep::ComputeRange {
            record.advance(BootstrapStep::ComputeRange);
            self.save(record).await?;
            *mutated = true;
        }
        Ok(())
    }

    async fn check_balances(&self, record: &PoolBootstrapRecord) -> LaunchResult<()> {
        let sender = self.chain.sender();
        let token_amount = U256::from(record.token_amount);
        let token_balance = self
            .retry
            .run("balanceOf", || self.chain.token_balance(record.target_asset, sender))
            .await?;
        if token_balance < token_amount {
            return Err(LaunchError::InsufficientBalance {
                asset: record.target_asset,
                required: token_amount,
                available: token_balance,
            });
        }

        let required_native = U256::from(record.base_amount).saturating_add(self.settings.gas_reserve);
        let native_balance = self.retry.run("eth_getBalance", || self.chain.native_balance(sender)).await?;
        if native_balance < required_native {
            return Err(LaunchError::InsufficientBalance {
                asset: record.base_asset,
                required: required_native,
                available: native_balance,
            });
        }
        Ok(())
    }

    async fn current_allowance(&self, record: &PoolBootstrapRecord) -> LaunchResult<U256> {
        let sender = self.chain.sender();
        let spender = self.settings.deployment.position_manager;
        self.retry
            .run("allowance", || self.chain.allowance(record.target_asset, sender, spender))
            .await
    }

    async fn approve(&self, record: &mut PoolBootstrapRecord, amount: U256, mutated: &mut bool) -> LaunchResult<()> {
        // Resolve an approval left behind by an earlier attempt
        if let Some(tx_hash) = record.approval_tx.take() {
            let receipt = self.confirm(tx_hash).await?;
            self.save(record).await?;
            if receipt.success && self.current_allowance(record).await? >= amount {
                return Ok(());
            }
        }

        let call = ContractCall::Approve {
            token: record.target_asset,
            spender: self.settings.deployment.position_manager,
            amount,
        };
        // approve sets an absolute allowance, so repeats are harmless
        let tx_hash = self.retry.run("approve", || self.chain.submit(call.clone())).await?;
        *mutated = true;
        record.approval_tx = Some(tx_hash);
        self.save(record).await?;
        info!(influencer = %record.influencer, %tx_hash, amount = %amount, "Approval submitted");

        let receipt = self.confirm(tx_hash).await?;
        if !receipt.success {
            return Err(LaunchError::TransactionReverted { tx_hash, call: "approve" });
        }
        let allowance = self.current_allowance(record).await?;
        if allowance < amount {
            return Err(LaunchError::unparsable(
                "allowance",
                format!("allowance {} below approved amount {}", allowance, amount),
            ));
        }
        Ok(())
    }

    // ========================================================================
    // Step 4: ticks
    // ========================================================================

    async fn compute_range(&self, record: &mut PoolBootstrapRecord, mutated: &mut bool) -> LaunchResult<()> {
        let range = full_range_for_fee(record.fee_tier)?;
        range.validate(record.fee_tier.tick_spacing())?;

        if record.tick_range != Some(range) || record.step < BootstrapStep::Mint {
            record.tick_range = Some(range);
            record.advance(BootstrapStep::Mint);
            self.save(record).await?;
            *mutated = true;
        }
        Ok(())
    }

    // ========================================================================
    // Step 5: mint
    // ========================================================================

    async fn mint(&self, record: &mut PoolBootstrapRecord, mutated: &mut bool) -> LaunchResult<()> {
        if record.position.is_some() {
            return Ok(());
        }

        if let Some(submission) = record.mint {
            match self.resolve_mint(record, submission).await? {
                MintResolution::Minted(position) => return self.record_position(record, position, mutated).await,
                MintResolution::Reverted | MintResolution::Expired => {
                    record.mint = None;
                    self.save(record).await?;
                    // Funds were released; re-verify before minting again
                    self.authorize(record, mutated).await?;
                }
            }
        } else if let Some(intent) = record.mint_intent {
            // Submitted without a recorded hash: wait out the deadline before minting again
            if let Some(position) = self.find_existing_position(record).await? {
                return self.record_position(record, position, mutated).await;
            }
            let now = self.retry.run("latest_timestamp", || self.chain.latest_timestamp()).await?;
            if now <= intent.deadline {
                return Err(ChainError::SubmissionPending(intent.deadline).into());
            }
            warn!(
                influencer = %record.influencer,
                deadline = intent.deadline,
                now,
                "Unconfirmed mint submission expired"
            );
            record.mint_intent = None;
            self.save(record).await?;
            self.authorize(record, mutated).await?;
        }

        // Never mint twice: adopt a matching position left by a lost response
        if let Some(position) = self.find_existing_position(record).await? {
            info!(
                influencer = %record.influencer,
                token_id = %position.token_id,
                "Adopting existing position instead of minting"
            );
            return self.record_position(record, position, mutated).await;
        }

        let range = record
            .tick_range
            .ok_or_else(|| LaunchError::InvalidParameters("tick range missing before mint".to_string()))?;
        let now = self.retry.run("latest_timestamp", || self.chain.latest_timestamp()).await?;
        let deadline = now.saturating_add(self.settings.deadline_secs);

        let call = ContractCall::Mint(MintParams {
            token0: record.token0,
            token1: record.token1,
            fee: record.fee_tier,
            tick_lower: range.lower,
            tick_upper: range.upper,
            amount0_desired: record.amount0_desired,
            amount1_desired: record.amount1_desired,
            amount0_min: record.amount0_min,
            amount1_min: record.amount1_min,
            recipient: self.chain.sender(),
            deadline,
            value: U256::from(record.base_amount),
        });

        record.mint_intent = Some(MintIntent {
            deadline,
            recorded_at: Utc::now(),
        });
        self.save(record).await?;
        *mutated = true;

        // A single attempt: a lost response is resolved through the record, not a resubmit
        let tx_hash = self.retry.once(self.chain.submit(call)).await?;
        let submission = MintSubmission {
            tx_hash,
            deadline,
            submitted_at: Utc::now(),
        };
        record.mint_intent = None;
        record.mint = Some(submission);
        self.save(record).await?;
        info!(influencer = %record.influencer, %tx_hash, deadline, "Mint submitted");

        match self.resolve_mint(record, submission).await? {
            MintResolution::Minted(position) => self.record_position(record, position, mutated).await,
            MintResolution::Reverted => Err(LaunchError::TransactionReverted { tx_hash, call: "mint" }),
            MintResolution::Expired => Err(LaunchError::DeadlineExpired { tx_hash, deadline }),
        }
    }

    /// Wait for a submitted mint. A submission still unmined past its
    /// deadline can never land; one pending within it is a transient timeout.
    async fn resolve_mint(
        &self,
        record: &PoolBootstrapRecord,
        submission: MintSubmission,
    ) -> LaunchResult<MintResolution> {
        let tx_hash = submission.tx_hash;
        let receipt = match self.confirm(tx_hash).await {
            Ok(receipt) => receipt,
            Err(LaunchError::Chain(ChainError::ConfirmationTimeout(_))) => {
                let now = self.retry.run("latest_timestamp", || self.chain.latest_timestamp()).await?;
                if now <= submission.deadline {
                    return Err(ChainError::ConfirmationTimeout(tx_hash).into());
                }
                if let Some(position) = self.find_existing_position(record).await? {
                    return Ok(MintResolution::Minted(position));
                }
                warn!(%tx_hash, deadline = submission.deadline, now, "Mint expired unmined");
                return Ok(MintResolution::Expired);
            }
            Err(e) => return Err(e),
        };

        if !receipt.success {
            warn!(%tx_hash, "Mint reverted");
            return Ok(MintResolution::Reverted);
        }
        self.position_from_receipt(record, &receipt).await.map(MintResolution::Minted)
    }

    async fn position_from_receipt(
        &self,
        record: &PoolBootstrapRecord,
        receipt: &TxReceipt,
    ) -> LaunchResult<MintedPosition> {
        match abi::decode_minted_position(receipt, self.settings.deployment.position_manager) {
            Ok(position) => Ok(position),
            Err(decode_err) => {
                warn!(tx_hash = %receipt.tx_hash, error = %decode_err, "Mint receipt unreadable, querying positions");
                self.find_existing_position(record).await?.ok_or(decode_err)
            }
        }
    }

    async fn find_existing_position(&self, record: &PoolBootstrapRecord) -> LaunchResult<Option<MintedPosition>> {
        let Some(range) = record.tick_range else {
            return Ok(None);
        };
        let owner = self.chain.sender();
        let pair = record.pair();
        let fee = record.fee_tier;
        self.retry
            .run("find_position", || self.chain.find_position(owner, &pair, fee, range))
            .await
    }

    async fn record_position(
        &self,
        record: &mut PoolBootstrapRecord,
        position: MintedPosition,
        mutated: &mut bool,
    ) -> LaunchResult<()> {
        record.position = Some(position);
        record.mint_intent = None;
        record.advance(BootstrapStep::Finalize);
        self.save(record).await?;
        *mutated = true;
        info!(
            influencer = %record.influencer,
            token_id = %position.token_id,
            liquidity = %position.liquidity,
            amount0 = %position.amount0,
            amount1 = %position.amount1,
            tx_hash = %position.tx_hash,
            "Liquidity position minted"
        );
        Ok(())
    }

    // ========================================================================
    // Step 6: finalize
    // ========================================================================

    async fn finalize(&self, record: &mut PoolBootstrapRecord, mutated: &mut bool) -> LaunchResult<()> {
        let pool = record
            .pool_address
            .ok_or_else(|| LaunchError::InvalidParameters("pool address missing at finalize".to_string()))?;
        if record.position.is_none() {
            return Err(LaunchError::InvalidParameters("position missing at finalize".to_string()));
        }

        let mut attempt = 1;
        loop {
            match self.complete_launch(record.influencer, record.target_asset, pool, mutated).await {
                Err(LaunchError::VersionConflict(_)) if attempt < MAX_FINALIZE_ATTEMPTS => attempt += 1,
                other => {
                    other?;
                    break;
                }
            }
        }

        if !record.is_complete() {
            record.advance(BootstrapStep::Complete);
            record.completed_at = Some(Utc::now());
            self.save(record).await?;
            *mutated = true;
        }
        Ok(())
    }

    async fn complete_launch(
        &self,
        influencer: Address,
        token: Address,
        pool: Address,
        mutated: &mut bool,
    ) -> LaunchResult<()> {
        let _guard = self.locks.lock(influencer).await;
        let mut launch = self
            .store
            .get_launch(&influencer)
            .await?
            .ok_or(LaunchError::UnknownInfluencer(influencer))?;

        if launch.status == LaunchStatus::Launched {
            // Finalized by an earlier attempt
            return if launch.pool_address == Some(pool) {
                Ok(())
            } else {
                Err(LaunchError::AlreadyLaunched(influencer))
            };
        }

        let expected_version = launch.version;
        LaunchStateMachine::complete(&mut launch, token, pool)?;
        launch.touch();
        self.store.update_launch(&launch, expected_version).await?;
        *mutated = true;
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn save(&self, record: &PoolBootstrapRecord) -> LaunchResult<()> {
        self.retry.run("save_bootstrap", || self.store.save_bootstrap(record)).await
    }

    async fn confirm(&self, tx_hash: B256) -> LaunchResult<TxReceipt> {
        self.settings
            .confirmations
            .wait(self.chain.as_ref(), &self.retry, tx_hash)
            .await
    }
}
