//! Chain adapters

pub mod json_rpc;
pub mod simulated;

use crate::abi::Deployment;
use crate::config::LauncherConfig;
use crate::core::{ChainPort, ContractCall, LaunchResult, MintedPosition, TxReceipt};
use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use coinfluence_core::math::TickRange;
use coinfluence_core::{FeeTier, TokenPair};
use tracing::info;

pub use json_rpc::JsonRpcChain;
pub use simulated::{Fault, SimulatedChain, SIMULATED_PLATFORM_WALLET};

/// Unified chain adapter over a live node or the in-process simulator
pub enum ChainAdapter {
    JsonRpc(JsonRpcChain),
    Simulated(SimulatedChain),
}

impl ChainAdapter {
    pub fn new(config: &LauncherConfig, simulate: bool) -> LaunchResult<Self> {
        let adapter = if simulate {
            ChainAdapter::Simulated(SimulatedChain::new(
                config.chain.launcher_account,
                Deployment::from(&config.chain),
            ))
        } else {
            ChainAdapter::JsonRpc(JsonRpcChain::new(&config.chain, config.retry.call_timeout())?)
        };
        info!(
            backend = adapter.backend_name(),
            chain_id = config.chain.chain_id,
            sender = %config.chain.launcher_account,
            "Chain adapter initialized"
        );
        Ok(adapter)
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            ChainAdapter::JsonRpc(_) => "json-rpc",
            ChainAdapter::Simulated(_) => "simulated",
        }
    }

    pub fn as_simulated(&self) -> Option<&SimulatedChain> {
        match self {
            ChainAdapter::Simulated(chain) => Some(chain),
            ChainAdapter::JsonRpc(_) => None,
        }
    }
}

macro_rules! delegate {
    ($self:ident, $chain:ident => $call:expr) => {
        match $self {
            ChainAdapter::JsonRpc($chain) => $call.await,
            ChainAdapter::Simulated($chain) => $call.await,
        }
    };
}

#[async_trait]
impl ChainPort for ChainAdapter {
    fn sender(&self) -> Address {
        match self {
            ChainAdapter::JsonRpc(chain) => chain.sender(),
            ChainAdapter::Simulated(chain) => chain.sender(),
        }
    }

    async fn get_pool(&self, pair: &TokenPair, fee: FeeTier) -> LaunchResult<Option<Address>> {
        delegate!(self, chain => chain.get_pool(pair, fee))
    }

    async fn pool_sqrt_price(&self, pool: Address) -> LaunchResult<U256> {
        delegate!(self, chain => chain.pool_sqrt_price(pool))
    }

    async fn token_balance(&self, token: Address, owner: Address) -> LaunchResult<U256> {
        delegate!(self, chain => chain.token_balance(token, owner))
    }

    async fn native_balance(&self, owner: Address) -> LaunchResult<U256> {
        delegate!(self, chain => chain.native_balance(owner))
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> LaunchResult<U256> {
        delegate!(self, chain => chain.allowance(token, owner, spender))
    }

    async fn latest_timestamp(&self) -> LaunchResult<u64> {
        delegate!(self, chain => chain.latest_timestamp())
    }

    async fn submit(&self, call: ContractCall) -> LaunchResult<B256> {
        delegate!(self, chain => chain.submit(call))
    }

    async fn receipt(&self, tx_hash: B256) -> LaunchResult<Option<TxReceipt>> {
        delegate!(self, chain => chain.receipt(tx_hash))
    }

    async fn find_position(
        &self,
        owner: Address,
        pair: &TokenPair,
        fee: FeeTier,
        range: TickRange,
    ) -> LaunchResult<Option<MintedPosition>> {
        delegate!(self, chain => chain.find_position(owner, pair, fee, range))
    }

    async fn health_check(&self) -> LaunchResult<()> {
        delegate!(self, chain => chain.health_check())
    }
}
