//! Service container for dependency injection

use crate::adapters::{ChainAdapter, StorageAdapter};
use crate::api::{ApiState, Launches, Ledger};
use crate::config::LauncherConfig;
use crate::core::{ChainPort, LaunchError, LaunchResult, LaunchStore};
use crate::domain::{
    AdminPolicy, KeyedLocks, LaunchService, LiquidityBootstrapCoordinator, LiquiditySettings, PledgeLedger,
    RetryPolicy, TokenSettings,
};
use crate::metrics::LaunchMetrics;
use alloy_primitives::U256;
use std::sync::Arc;
use tracing::{info, warn};

/// Native balance granted to the launcher account on a simulated chain (1000 ETH)
const SIMULATED_FUNDING_WEI: u128 = 1_000_000_000_000_000_000_000;

/// Service container managing all dependencies
pub struct ServiceContainer {
    /// Configuration
    pub config: LauncherConfig,

    pub storage: Arc<StorageAdapter>,

    pub chain: Arc<ChainAdapter>,

    pub metrics: Arc<LaunchMetrics>,

    /// Pledge ledger and read queries
    pub ledger: Arc<Ledger>,

    /// Approval and launch orchestration
    pub launches: Arc<Launches>,
}

impl ServiceContainer {
    /// Initialize the service container with all dependencies
    pub async fn new(config: LauncherConfig, simulate: bool) -> LaunchResult<Self> {
        info!("Initializing service container");

        let metrics = Arc::new(
            LaunchMetrics::new().map_err(|e| LaunchError::Configuration(format!("metrics registry: {}", e)))?,
        );

        let storage = Arc::new(StorageAdapter::new(&config.storage).await?);
        let chain = Arc::new(ChainAdapter::new(&config, simulate)?);
        if let Some(simulated) = chain.as_simulated() {
            simulated.fund_native(config.chain.launcher_account, U256::from(SIMULATED_FUNDING_WEI));
            warn!(account = %config.chain.launcher_account, "Simulated chain in use; no transaction reaches a real network");
        }

        // One lock table shared by every writer of launch records
        let locks = Arc::new(KeyedLocks::new());
        let retry = RetryPolicy::new(config.retry.clone());

        let ledger = Arc::new(PledgeLedger::new(storage.clone(), locks.clone(), metrics.clone()));
        info!("Pledge ledger initialized");

        let coordinator = Arc::new(LiquidityBootstrapCoordinator::new(
            storage.clone(),
            chain.clone(),
            locks.clone(),
            retry.clone(),
            LiquiditySettings::from_config(&config),
            metrics.clone(),
        ));

        if config.api.admin_addresses.is_empty() {
            warn!("No admin addresses configured; registration, approval and launch are disabled");
        }
        let launches = Arc::new(LaunchService::new(
            storage.clone(),
            chain.clone(),
            locks,
            coordinator,
            AdminPolicy::new(config.api.admin_addresses.iter().copied()),
            TokenSettings::from_config(&config),
            retry,
            metrics.clone(),
        ));
        info!(
            fee_tier = config.liquidity.fee_tier,
            token_factory = ?config.chain.token_factory,
            "Launch service initialized"
        );

        Ok(Self {
            config,
            storage,
            chain,
            metrics,
            ledger,
            launches,
        })
    }

    /// State shared by the HTTP handlers
    pub fn api_state(&self) -> ApiState {
        ApiState::new(
            self.ledger.clone(),
            self.launches.clone(),
            self.storage.clone(),
            self.chain.clone(),
        )
    }

    /// Perform health check on all services
    pub async fn health_check(&self) -> LaunchResult<()> {
        info!("Performing health check");

        self.storage.health_check().await?;
        self.chain.health_check().await?;

        info!(
            storage = self.storage.backend_name(),
            chain = self.chain.backend_name(),
            "All services healthy"
        );
        Ok(())
    }

    /// Graceful shutdown
    pub async fn shutdown(&self) {
        info!("Shutting down service container");
        if let StorageAdapter::Postgres(store) = self.storage.as_ref() {
            store.pool().close().await;
        }
    }
}
