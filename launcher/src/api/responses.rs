//! API request and response types

use crate::core::types::amount_serde;
use crate::core::{InfluencerLaunch, LaunchEvent, LaunchProgress, PlatformStats, Pledge, PledgeId, PoolBootstrapRecord};
use alloy_primitives::{Address, B256};
use coinfluence_core::Currency;
use serde::{Deserialize, Serialize};

// ============================================================================
// Requests
// ============================================================================

/// Admin registration of a new launch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterLaunchRequest {
    pub influencer: Address,
    pub influencer_name: String,
    pub token_name: String,
    pub token_symbol: String,
    #[serde(default, with = "amount_serde")]
    pub threshold_eth: u128,
    #[serde(default, with = "amount_serde")]
    pub threshold_usdc: u128,
}

/// Pledge on behalf of the calling identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PledgeRequest {
    pub influencer: Address,
    #[serde(with = "amount_serde")]
    pub amount: u128,
    pub currency: Currency,
    #[serde(default)]
    pub tx_hash: Option<B256>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveRequest {
    pub influencer: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchRequest {
    pub influencer: Address,
    /// Existing asset to bootstrap; deployed through the token factory when absent
    #[serde(default)]
    pub token_address: Option<Address>,
}

// ============================================================================
// Responses
// ============================================================================

/// Response for a single launch
#[derive(Debug, Serialize, Deserialize)]
pub struct LaunchResponse {
    pub launch: InfluencerLaunch,
    pub progress: LaunchProgress,
}

/// Response for launches list
#[derive(Debug, Serialize, Deserialize)]
pub struct LaunchesResponse {
    pub launches: Vec<InfluencerLaunch>,
    pub total: usize,
}

/// Response for pledges list
#[derive(Debug, Serialize, Deserialize)]
pub struct PledgesResponse {
    pub pledges: Vec<Pledge>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PledgeCreatedResponse {
    pub pledge_id: PledgeId,
    pub launch: InfluencerLaunch,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PledgeResponse {
    pub pledge: Pledge,
}

/// Bootstrap progress of one launch
#[derive(Debug, Serialize, Deserialize)]
pub struct BootstrapResponse {
    pub bootstrap: Option<PoolBootstrapRecord>,
    pub in_flight: bool,
}

/// Completed launch with its liquidity position
#[derive(Debug, Serialize, Deserialize)]
pub struct LaunchedResponse {
    pub launch: InfluencerLaunch,
    pub bootstrap: PoolBootstrapRecord,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventsResponse {
    pub events: Vec<LaunchEvent>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub stats: PlatformStats,
}
