//! Core domain records shared across ports, services and the API

use alloy_primitives::{Address, Bytes, B256, U256};
use chrono::{DateTime, Utc};
use coinfluence_core::math::TickRange;
use coinfluence_core::threshold::progress_bps;
use coinfluence_core::{
    AllocationPlan, CoreError, CoreResult, Currency, FeeTier, LaunchStatus, Thresholds, TokenPair,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Pledges
// ============================================================================

/// Ledger-assigned pledge identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PledgeId(pub Uuid);

impl PledgeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PledgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PledgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PledgeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(PledgeId)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pledge {
    pub id: PledgeId,
    pub influencer: Address,
    pub pledger: Address,
    #[serde(with = "amount_serde")]
    pub amount: u128,
    pub currency: Currency,
    /// Hash of the external transfer backing the pledge, if any
    pub tx_hash: Option<B256>,
    pub created_at: DateTime<Utc>,
    pub withdrawn: bool,
    pub withdrawn_at: Option<DateTime<Utc>>,
}

impl Pledge {
    pub fn new(
        influencer: Address,
        pledger: Address,
        amount: u128,
        currency: Currency,
        tx_hash: Option<B256>,
    ) -> Self {
        Self {
            id: PledgeId::new(),
            influencer,
            pledger,
            amount,
            currency,
            tx_hash,
            created_at: Utc::now(),
            withdrawn: false,
            withdrawn_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.withdrawn
    }
}

// ============================================================================
// Launch record
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfluencerLaunch {
    pub influencer: Address,
    pub influencer_name: String,
    pub token_name: String,
    pub token_symbol: String,

    #[serde(with = "amount_serde")]
    pub threshold_eth: u128,
    #[serde(with = "amount_serde")]
    pub threshold_usdc: u128,

    #[serde(with = "amount_serde")]
    pub total_pledged_eth: u128,
    #[serde(with = "amount_serde")]
    pub total_pledged_usdc: u128,
    pub pledger_count: u64,

    pub status: LaunchStatus,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Address>,

    /// Token factory transaction awaiting confirmation
    pub token_deployment_tx: Option<B256>,
    pub token_address: Option<Address>,
    pub pool_address: Option<Address>,
    pub launched_at: Option<DateTime<Utc>>,

    /// Optimistic concurrency counter, bumped on every write
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters of a new launch registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLaunch {
    pub influencer: Address,
    pub influencer_name: String,
    pub token_name: String,
    pub token_symbol: String,
    pub threshold_eth: u128,
    pub threshold_usdc: u128,
}

impl InfluencerLaunch {
    pub fn new(params: NewLaunch) -> Self {
        let now = Utc::now();
        Self {
            influencer: params.influencer,
            influencer_name: params.influencer_name,
            token_name: params.token_name,
            token_symbol: params.token_symbol,
            threshold_eth: params.threshold_eth,
            threshold_usdc: params.threshold_usdc,
            total_pledged_eth: 0,
            total_pledged_usdc: 0,
            pledger_count: 0,
            status: LaunchStatus::Collecting,
            approved_at: None,
            approved_by: None,
            token_deployment_tx: None,
            token_address: None,
            pool_address: None,
            launched_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds::new(self.threshold_eth, self.threshold_usdc)
    }

    pub fn total_for(&self, currency: Currency) -> u128 {
        match currency {
            Currency::Eth => self.total_pledged_eth,
            Currency::Usdc => self.total_pledged_usdc,
        }
    }

    fn total_mut(&mut self, currency: Currency) -> &mut u128 {
        match currency {
            Currency::Eth => &mut self.total_pledged_eth,
            Currency::Usdc => &mut self.total_pledged_usdc,
        }
    }

    pub fn credit(&mut self, currency: Currency, amount: u128) -> CoreResult<()> {
        let total = self.total_mut(currency);
        *total = total.checked_add(amount).ok_or(CoreError::MathOverflow)?;
        Ok(())
    }

    pub fn debit(&mut self, currency: Currency, amount: u128) -> CoreResult<()> {
        let total = self.total_mut(currency);
        *total = total.checked_sub(amount).ok_or(CoreError::MathUnderflow)?;
        Ok(())
    }

    pub fn threshold_met(&self) -> bool {
        self.thresholds().is_met(self.total_pledged_eth, self.total_pledged_usdc)
    }

    pub fn progress(&self) -> LaunchProgress {
        let eth_bps = progress_bps(self.total_pledged_eth, self.threshold_eth);
        let usdc_bps = progress_bps(self.total_pledged_usdc, self.threshold_usdc);
        LaunchProgress {
            eth_bps,
            usdc_bps,
            overall_bps: eth_bps.max(usdc_bps),
            threshold_met: self.threshold_met(),
        }
    }

    /// Advance the version and touch the update timestamp before a write
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchProgress {
    pub eth_bps: u32,
    pub usdc_bps: u32,
    pub overall_bps: u32,
    pub threshold_met: bool,
}

/// Platform-wide aggregates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStats {
    pub launches: u64,
    pub collecting: u64,
    /// Launches past threshold awaiting admin approval
    pub pending_approval: u64,
    pub approved: u64,
    pub launched: u64,
    #[serde(with = "amount_serde")]
    pub total_pledged_eth: u128,
    #[serde(with = "amount_serde")]
    pub total_pledged_usdc: u128,
    pub total_pledgers: u64,
}

impl PlatformStats {
    pub fn from_launches<'a>(launches: impl IntoIterator<Item = &'a InfluencerLaunch>) -> Self {
        let mut stats = Self::default();
        for launch in launches {
            stats.launches += 1;
            match launch.status {
                LaunchStatus::Collecting => stats.collecting += 1,
                LaunchStatus::ThresholdMet => stats.pending_approval += 1,
                LaunchStatus::Approved => stats.approved += 1,
                LaunchStatus::Launched => stats.launched += 1,
            }
            stats.total_pledged_eth = stats.total_pledged_eth.saturating_add(launch.total_pledged_eth);
            stats.total_pledged_usdc = stats.total_pledged_usdc.saturating_add(launch.total_pledged_usdc);
            stats.total_pledgers += launch.pledger_count;
        }
        stats
    }
}

// ============================================================================
// Liquidity bootstrap
// ============================================================================

/// Steps of the bootstrap procedure, in execution order. `CreateToken` only
/// runs when the launch asset comes from the token factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BootstrapStep {
    CreateToken,
    Canonicalize,
    EnsurePool,
    Authorize,
    ComputeRange,
    Mint,
    Finalize,
    Complete,
}

impl BootstrapStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            BootstrapStep::CreateToken => "create_token",
            BootstrapStep::Canonicalize => "canonicalize",
            BootstrapStep::EnsurePool => "ensure_pool",
            BootstrapStep::Authorize => "authorize",
            BootstrapStep::ComputeRange => "compute_range",
            BootstrapStep::Mint => "mint",
            BootstrapStep::Finalize => "finalize",
            BootstrapStep::Complete => "complete",
        }
    }
}

impl fmt::Display for BootstrapStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted mint awaiting its receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintSubmission {
    pub tx_hash: B256,
    /// Unix timestamp after which the position manager rejects the mint
    pub deadline: u64,
    pub submitted_at: DateTime<Utc>,
}

/// A mint about to be submitted. Recorded before broadcast so a lost submit
/// response still bounds when the transaction could land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintIntent {
    pub deadline: u64,
    pub recorded_at: DateTime<Utc>,
}

/// Position created by a confirmed mint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintedPosition {
    pub token_id: U256,
    pub liquidity: u128,
    pub amount0: U256,
    pub amount1: U256,
    pub tx_hash: B256,
}

/// Resume state of one launch's liquidity bootstrap. Created once per launch
/// and terminal once `position` is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolBootstrapRecord {
    pub influencer: Address,
    pub target_asset: Address,
    pub base_asset: Address,
    pub fee_tier: FeeTier,
    pub token0: Address,
    pub token1: Address,

    #[serde(with = "amount_serde")]
    pub total_supply: u128,
    #[serde(with = "amount_serde")]
    pub influencer_allocation: u128,
    #[serde(with = "amount_serde")]
    pub treasury_allocation: u128,
    #[serde(with = "amount_serde")]
    pub platform_allocation: u128,

    /// Seeded tokens, taken from the treasury share
    #[serde(with = "amount_serde")]
    pub token_amount: u128,
    /// Base asset sent as native value with the mint
    #[serde(with = "amount_serde")]
    pub base_amount: u128,
    pub amount0_desired: U256,
    pub amount1_desired: U256,
    pub amount0_min: U256,
    pub amount1_min: U256,
    pub tick_range: Option<TickRange>,

    pub pool_address: Option<Address>,
    pub pool_tx: Option<B256>,
    pub approval_tx: Option<B256>,
    #[serde(default)]
    pub mint_intent: Option<MintIntent>,
    pub mint: Option<MintSubmission>,
    pub position: Option<MintedPosition>,

    pub step: BootstrapStep,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl PoolBootstrapRecord {
    /// Allocation the bootstrap was planned against
    pub fn plan(&self) -> AllocationPlan {
        AllocationPlan {
            total_supply: self.total_supply,
            influencer: self.influencer_allocation,
            treasury: self.treasury_allocation,
            platform: self.platform_allocation,
        }
    }

    pub fn pair(&self) -> TokenPair {
        TokenPair {
            token0: self.token0,
            token1: self.token1,
        }
    }

    /// `(amount0, amount1)` of the seed in canonical order
    pub fn ordered_seed(&self) -> (u128, u128) {
        if self.token0 == self.target_asset {
            (self.token_amount, self.base_amount)
        } else {
            (self.base_amount, self.token_amount)
        }
    }

    pub fn is_complete(&self) -> bool {
        self.step == BootstrapStep::Complete
    }

    /// Move the resume pointer forward; never backward
    pub fn advance(&mut self, step: BootstrapStep) {
        if step > self.step {
            self.step = step;
        }
        self.updated_at = Utc::now();
    }
}

// ============================================================================
// Audit log
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaunchEventKind {
    ThresholdMet,
    Approved,
    TokenCreated,
    LiquidityCreated,
    LiquidityFailed,
    Launched,
}

impl LaunchEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaunchEventKind::ThresholdMet => "ThresholdMet",
            LaunchEventKind::Approved => "Approved",
            LaunchEventKind::TokenCreated => "TokenCreated",
            LaunchEventKind::LiquidityCreated => "LiquidityCreated",
            LaunchEventKind::LiquidityFailed => "LiquidityFailed",
            LaunchEventKind::Launched => "Launched",
        }
    }
}

impl FromStr for LaunchEventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ThresholdMet" => Ok(LaunchEventKind::ThresholdMet),
            "Approved" => Ok(LaunchEventKind::Approved),
            "TokenCreated" => Ok(LaunchEventKind::TokenCreated),
            "LiquidityCreated" => Ok(LaunchEventKind::LiquidityCreated),
            "LiquidityFailed" => Ok(LaunchEventKind::LiquidityFailed),
            "Launched" => Ok(LaunchEventKind::Launched),
            other => Err(format!("unknown launch event kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchEvent {
    pub id: Uuid,
    pub influencer: Address,
    pub kind: LaunchEventKind,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl LaunchEvent {
    pub fn new(influencer: Address, kind: LaunchEventKind, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            influencer,
            kind,
            payload,
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// Chain port messages
// ============================================================================

/// Full-range mint request for the position manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintParams {
    pub token0: Address,
    pub token1: Address,
    pub fee: FeeTier,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount0_desired: U256,
    pub amount1_desired: U256,
    pub amount0_min: U256,
    pub amount1_min: U256,
    pub recipient: Address,
    pub deadline: u64,
    /// Native value attached to the call (base asset side)
    pub value: U256,
}

/// State-changing calls the launcher submits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    CreateToken {
        name: String,
        symbol: String,
        influencer_name: String,
        influencer: Address,
        total_supply: U256,
        creation_fee: U256,
    },
    CreateAndInitializePool {
        token0: Address,
        token1: Address,
        fee: FeeTier,
        sqrt_price_x96: U256,
    },
    Approve {
        token: Address,
        spender: Address,
        amount: U256,
    },
    Mint(MintParams),
}

impl ContractCall {
    pub fn label(&self) -> &'static str {
        match self {
            ContractCall::CreateToken { .. } => "create_token",
            ContractCall::CreateAndInitializePool { .. } => "create_pool",
            ContractCall::Approve { .. } => "approve",
            ContractCall::Mint(_) => "mint",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub success: bool,
    pub block_number: u64,
    pub logs: Vec<ReceiptLog>,
}

/// Serde helpers for integer amounts: serialized as decimal strings so
/// clients never lose precision, accepted as strings or plain integers.
pub mod amount_serde {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(amount: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }

    struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = u128;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative integer amount or decimal string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
            Ok(v as u128)
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
            u128::try_from(v).map_err(|_| E::custom("amount cannot be negative"))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
            v.trim().parse::<u128>().map_err(E::custom)
        }
    }
}
