//! Core trait abstractions (Ports in Hexagonal Architecture)

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use coinfluence_core::math::TickRange;
use coinfluence_core::{FeeTier, TokenPair};

use super::error::LaunchResult;
use super::types::*;

/// Storage port - durable launch, pledge, bootstrap and audit state.
///
/// Launch writes are compare-and-swap on `version`: the stored record must
/// still carry `expected_version`, otherwise the write fails with
/// `VersionConflict` and nothing is persisted.
#[async_trait]
pub trait LaunchStore: Send + Sync {
    /// Insert a new launch; `AlreadyRegistered` if one exists
    async fn insert_launch(&self, launch: &InfluencerLaunch) -> LaunchResult<()>;

    async fn get_launch(&self, influencer: &Address) -> LaunchResult<Option<InfluencerLaunch>>;

    async fn list_launches(&self) -> LaunchResult<Vec<InfluencerLaunch>>;

    /// Replace a launch record guarded by its previous version
    async fn update_launch(&self, launch: &InfluencerLaunch, expected_version: u64) -> LaunchResult<()>;

    /// Upsert a pledge and replace its launch record as one atomic unit
    async fn commit_pledge(
        &self,
        launch: &InfluencerLaunch,
        expected_version: u64,
        pledge: &Pledge,
    ) -> LaunchResult<()>;

    async fn get_pledge(&self, id: &PledgeId) -> LaunchResult<Option<Pledge>>;

    /// Pledge backed by this transfer transaction, withdrawn or not
    async fn pledge_by_tx(&self, tx_hash: &B256) -> LaunchResult<Option<Pledge>>;

    /// Pledges of one influencer, oldest first
    async fn pledges_for(&self, influencer: &Address) -> LaunchResult<Vec<Pledge>>;

    /// Pledges made by one pledger, oldest first
    async fn pledges_by(&self, pledger: &Address) -> LaunchResult<Vec<Pledge>>;

    /// Whether the pledger ever pledged to this influencer, withdrawn or not
    async fn has_pledged(&self, influencer: &Address, pledger: &Address) -> LaunchResult<bool>;

    async fn get_bootstrap(&self, influencer: &Address) -> LaunchResult<Option<PoolBootstrapRecord>>;

    async fn save_bootstrap(&self, record: &PoolBootstrapRecord) -> LaunchResult<()>;

    async fn append_event(&self, event: &LaunchEvent) -> LaunchResult<()>;

    async fn events_for(&self, influencer: &Address) -> LaunchResult<Vec<LaunchEvent>>;

    /// Health check
    async fn health_check(&self) -> LaunchResult<()>;
}

/// Chain port - reads and transactions against the EVM ledger.
///
/// Submissions return as soon as the node accepted the transaction; callers
/// persist the hash and resolve it later through `receipt`.
#[async_trait]
pub trait ChainPort: Send + Sync {
    /// Account that signs launcher transactions and holds launch liquidity
    fn sender(&self) -> Address;

    /// Pool for the canonical pair and fee, if the factory knows one
    async fn get_pool(&self, pair: &TokenPair, fee: FeeTier) -> LaunchResult<Option<Address>>;

    /// Current sqrt price of a pool; zero while uninitialized
    async fn pool_sqrt_price(&self, pool: Address) -> LaunchResult<U256>;

    async fn token_balance(&self, token: Address, owner: Address) -> LaunchResult<U256>;

    async fn native_balance(&self, owner: Address) -> LaunchResult<U256>;

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> LaunchResult<U256>;

    /// Timestamp of the latest block, used for transaction deadlines
    async fn latest_timestamp(&self) -> LaunchResult<u64>;

    async fn submit(&self, call: ContractCall) -> LaunchResult<B256>;

    /// `None` while the transaction is pending or unknown
    async fn receipt(&self, tx_hash: B256) -> LaunchResult<Option<TxReceipt>>;

    /// Position owned by `owner` on exactly this pair, fee and range, with the
    /// amounts deposited when it was minted
    async fn find_position(
        &self,
        owner: Address,
        pair: &TokenPair,
        fee: FeeTier,
        range: TickRange,
    ) -> LaunchResult<Option<MintedPosition>>;

    /// Health check
    async fn health_check(&self) -> LaunchResult<()>;
}
