//! Storage adapters
//!
//! `StorageAdapter` selects the configured backend at startup and implements
//! `LaunchStore` by delegation, so domain services stay monomorphic.

pub mod memory;
pub mod postgres;

use crate::config::{StorageBackend, StorageConfig};
use crate::core::{
    InfluencerLaunch, LaunchEvent, LaunchResult, LaunchStore, Pledge, PledgeId, PoolBootstrapRecord,
};
use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use tracing::info;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Unified storage adapter over the supported backends
pub enum StorageAdapter {
    Memory(MemoryStore),
    Postgres(PostgresStore),
}

impl StorageAdapter {
    pub async fn new(config: &StorageConfig) -> LaunchResult<Self> {
        let adapter = match config.backend {
            StorageBackend::Memory => StorageAdapter::Memory(MemoryStore::new()),
            StorageBackend::Postgres => StorageAdapter::Postgres(PostgresStore::connect(config).await?),
        };
        info!(backend = adapter.backend_name(), "Storage backend initialized");
        Ok(adapter)
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            StorageAdapter::Memory(_) => "memory",
            StorageAdapter::Postgres(_) => "postgres",
        }
    }
}

macro_rules! delegate {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            StorageAdapter::Memory($store) => $call.await,
            StorageAdapter::Postgres($store) => $call.await,
        }
    };
}

#[async_trait]
impl LaunchStore for StorageAdapter {
    async fn insert_launch(&self, launch: &InfluencerLaunch) -> LaunchResult<()> {
        delegate!(self, store => store.insert_launch(launch))
    }

    async fn get_launch(&self, influencer: &Address) -> LaunchResult<Option<InfluencerLaunch>> {
        delegate!(self, store => store.get_launch(influencer))
    }

    async fn list_launches(&self) -> LaunchResult<Vec<InfluencerLaunch>> {
        delegate!(self, store => store.list_launches())
    }

    async fn update_launch(&self, launch: &InfluencerLaunch, expected_version: u64) -> LaunchResult<()> {
        delegate!(self, store => store.update_launch(launch, expected_version))
    }

    async fn commit_pledge(
        &self,
        launch: &InfluencerLaunch,
        expected_version: u64,
        pledge: &Pledge,
    ) -> LaunchResult<()> {
        delegate!(self, store => store.commit_pledge(launch, expected_version, pledge))
    }

    async fn get_pledge(&self, id: &PledgeId) -> LaunchResult<Option<Pledge>> {
        delegate!(self, store => store.get_pledge(id))
    }

    async fn pledge_by_tx(&self, tx_hash: &B256) -> LaunchResult<Option<Pledge>> {
        delegate!(self, store => store.pledge_by_tx(tx_hash))
    }

    async fn pledges_for(&self, influencer: &Address) -> LaunchResult<Vec<Pledge>> {
        delegate!(self, store => store.pledges_for(influencer))
    }

    async fn pledges_by(&self, pledger: &Address) -> LaunchResult<Vec<Pledge>> {
        delegate!(self, store => store.pledges_by(pledger))
    }

    async fn has_pledged(&self, influencer: &Address, pledger: &Address) -> LaunchResult<bool> {
        delegate!(self, store => store.has_pledged(influencer, pledger))
    }

    async fn get_bootstrap(&self, influencer: &Address) -> LaunchResult<Option<PoolBootstrapRecord>> {
        delegate!(self, store => store.get_bootstrap(influencer))
    }

    async fn save_bootstrap(&self, record: &PoolBootstrapRecord) -> LaunchResult<()> {
        delegate!(self, store => store.save_bootstrap(record))
    }

    async fn append_event(&self, event: &LaunchEvent) -> LaunchResult<()> {
        delegate!(self, store => store.append_event(event))
    }

    async fn events_for(&self, influencer: &Address) -> LaunchResult<Vec<LaunchEvent>> {
        delegate!(self, store => store.events_for(influencer))
    }

    async fn health_check(&self) -> LaunchResult<()> {
        delegate!(self, store => store.health_check())
    }
}
