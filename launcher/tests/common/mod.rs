//! Shared fixtures for launcher integration tests

#![allow(dead_code)]

use alloy_primitives::{address, Address, U256};
use coinfluence_core::Currency;
use coinfluence_launcher::abi::Deployment;
use coinfluence_launcher::adapters::{MemoryStore, SimulatedChain};
use coinfluence_launcher::core::{InfluencerLaunch, NewLaunch};
use coinfluence_launcher::domain::{
    AdminPolicy, KeyedLocks, LaunchService, LiquidityBootstrapCoordinator, LiquiditySettings, PledgeLedger,
    RetryPolicy, TokenSettings,
};
use coinfluence_launcher::metrics::LaunchMetrics;
use coinfluence_launcher::LauncherConfig;
use std::sync::Arc;

pub const ADMIN: Address = address!("0xadadadadadadadadadadadadadadadadadadadad");
pub const LAUNCHER: Address = address!("0x5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e");
pub const TOKEN_FACTORY: Address = address!("0xf0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0");
pub const PLEDGER: Address = address!("0x2121212121212121212121212121212121212121");

/// One ether in wei
pub const ETHER: u128 = 1_000_000_000_000_000_000;

/// Config with fast retries and confirmation polling
pub fn test_config() -> LauncherConfig {
    let mut config = LauncherConfig::default();
    config.chain.token_factory = Some(TOKEN_FACTORY);
    config.chain.launcher_account = LAUNCHER;
    config.chain.confirmation_poll_ms = 10;
    config.chain.confirmation_timeout_secs = 1;
    config.retry.max_retries = 2;
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 5;
    config.retry.call_timeout_secs = 5;
    config.api.admin_addresses = vec![ADMIN];
    config
}

pub struct Harness {
    pub config: LauncherConfig,
    pub store: Arc<MemoryStore>,
    pub chain: Arc<SimulatedChain>,
    pub metrics: Arc<LaunchMetrics>,
    pub locks: Arc<KeyedLocks>,
    pub ledger: Arc<PledgeLedger<MemoryStore>>,
    pub launches: Arc<LaunchService<MemoryStore, SimulatedChain>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: LauncherConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let chain = Arc::new(SimulatedChain::new(
            config.chain.launcher_account,
            Deployment::from(&config.chain),
        ));
        let metrics = Arc::new(LaunchMetrics::new().expect("metrics registry"));
        let locks = Arc::new(KeyedLocks::new());
        let retry = RetryPolicy::new(config.retry.clone());

        let ledger = Arc::new(PledgeLedger::new(store.clone(), locks.clone(), metrics.clone()));
        let coordinator = Arc::new(LiquidityBootstrapCoordinator::new(
            store.clone(),
            chain.clone(),
            locks.clone(),
            retry.clone(),
            LiquiditySettings::from_config(&config),
            metrics.clone(),
        ));
        let launches = Arc::new(LaunchService::new(
            store.clone(),
            chain.clone(),
            locks.clone(),
            coordinator,
            AdminPolicy::new(config.api.admin_addresses.iter().copied()),
            TokenSettings::from_config(&config),
            retry,
            metrics.clone(),
        ));

        Self {
            config,
            store,
            chain,
            metrics,
            locks,
            ledger,
            launches,
        }
    }

    /// Native balance covering the creation fee, the base amount and gas
    pub fn fund_launcher(&self) {
        self.chain.fund_native(LAUNCHER, U256::from(10 * ETHER));
    }

    /// Seed amount of the launched asset the bootstrap deposits
    pub fn token_seed(&self) -> u128 {
        self.config.token.total_supply / 10_000 * self.config.liquidity.token_bps as u128
    }

    /// Give the launcher an existing asset large enough for the seed
    pub fn existing_token(&self, byte: u8) -> Address {
        let token = Address::repeat_byte(byte);
        self.chain
            .mint_tokens(token, LAUNCHER, U256::from(self.config.token.total_supply));
        token
    }

    pub async fn register(&self, influencer: Address, threshold_eth: u128) -> InfluencerLaunch {
        self.ledger
            .register_launch(new_launch(influencer, threshold_eth))
            .await
            .expect("registration")
    }

    /// Register, pledge past the threshold, and approve
    pub async fn approved_launch(&self, influencer: Address) -> InfluencerLaunch {
        self.register(influencer, ETHER).await;
        self.ledger
            .submit_pledge(influencer, PLEDGER, ETHER, Currency::Eth, None)
            .await
            .expect("pledge");
        self.launches.approve(ADMIN, influencer).await.expect("approval")
    }
}

pub fn new_launch(influencer: Address, threshold_eth: u128) -> NewLaunch {
    NewLaunch {
        influencer,
        influencer_name: "Alice".to_string(),
        token_name: "Alice Coin".to_string(),
        token_symbol: "ALICE".to_string(),
        threshold_eth,
        threshold_usdc: 0,
    }
}
