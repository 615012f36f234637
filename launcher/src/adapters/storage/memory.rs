//! In-memory storage backend

use crate::core::{
    InfluencerLaunch, LaunchError, LaunchEvent, LaunchResult, LaunchStore, Pledge, PledgeId, PoolBootstrapRecord,
};
use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct MemoryState {
    launches: HashMap<Address, InfluencerLaunch>,
    pledges: HashMap<PledgeId, Pledge>,
    /// Insertion order of pledges
    pledge_order: Vec<PledgeId>,
    bootstraps: HashMap<Address, PoolBootstrapRecord>,
    events: Vec<LaunchEvent>,
}

impl MemoryState {
    fn check_version(&self, influencer: &Address, expected_version: u64) -> LaunchResult<()> {
        let stored = self
            .launches
            .get(influencer)
            .ok_or(LaunchError::UnknownInfluencer(*influencer))?;
        if stored.version != expected_version {
            return Err(LaunchError::VersionConflict(*influencer));
        }
        Ok(())
    }

    fn pledges_where(&self, keep: impl Fn(&Pledge) -> bool) -> Vec<Pledge> {
        self.pledge_order
            .iter()
            .filter_map(|id| self.pledges.get(id))
            .filter(|pledge| keep(pledge))
            .cloned()
            .collect()
    }
}

/// Process-local store; state is lost on restart
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LaunchStore for MemoryStore {
    async fn insert_launch(&self, launch: &InfluencerLaunch) -> LaunchResult<()> {
        let mut state = self.state.write().await;
        if state.launches.contains_key(&launch.influencer) {
            return Err(LaunchError::AlreadyRegistered(launch.influencer));
        }
        state.launches.insert(launch.influencer, launch.clone());
        Ok(())
    }

    async fn get_launch(&self, influencer: &Address) -> LaunchResult<Option<InfluencerLaunch>> {
        Ok(self.state.read().await.launches.get(influencer).cloned())
    }

    async fn list_launches(&self) -> LaunchResult<Vec<InfluencerLaunch>> {
        let state = self.state.read().await;
        let mut launches: Vec<_> = state.launches.values().cloned().collect();
        launches.sort_by_key(|launch| launch.created_at);
        Ok(launches)
    }

    async fn update_launch(&self, launch: &InfluencerLaunch, expected_version: u64) -> LaunchResult<()> {
        let mut state = self.state.write().await;
        state.check_version(&launch.influencer, expected_version)?;
        state.launches.insert(launch.influencer, launch.clone());
        Ok(())
    }

    async fn commit_pledge(
        &self,
        launch: &InfluencerLaunch,
        expected_version: u64,
        pledge: &Pledge,
    ) -> LaunchResult<()> {
        let mut state = self.state.write().await;
        state.check_version(&launch.influencer, expected_version)?;
        // Mirrors the unique tx_hash index of the Postgres schema
        if let Some(tx_hash) = pledge.tx_hash {
            if state
                .pledges
                .values()
                .any(|p| p.id != pledge.id && p.tx_hash == Some(tx_hash))
            {
                return Err(LaunchError::DuplicateTransaction(tx_hash));
            }
        }
        if state.pledges.insert(pledge.id, pledge.clone()).is_none() {
            state.pledge_order.push(pledge.id);
        }
        state.launches.insert(launch.influencer, launch.clone());
        Ok(())
    }

    async fn get_pledge(&self, id: &PledgeId) -> LaunchResult<Option<Pledge>> {
        Ok(self.state.read().await.pledges.get(id).cloned())
    }

    async fn pledge_by_tx(&self, tx_hash: &B256) -> LaunchResult<Option<Pledge>> {
        let state = self.state.read().await;
        Ok(state
            .pledges
            .values()
            .find(|p| p.tx_hash.as_ref() == Some(tx_hash))
            .cloned())
    }

    async fn pledges_for(&self, influencer: &Address) -> LaunchResult<Vec<Pledge>> {
        Ok(self.state.read().await.pledges_where(|p| &p.influencer == influencer))
    }

    async fn pledges_by(&self, pledger: &Address) -> LaunchResult<Vec<Pledge>> {
        Ok(self.state.read().await.pledges_where(|p| &p.pledger == pledger))
    }

    async fn has_pledged(&self, influencer: &Address, pledger: &Address) -> LaunchResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .pledges
            .values()
            .any(|p| &p.influencer == influencer && &p.pledger == pledger))
    }

    async fn get_bootstrap(&self, influencer: &Address) -> LaunchResult<Option<PoolBootstrapRecord>> {
        Ok(self.state.read().await.bootstraps.get(influencer).cloned())
    }

    async fn save_bootstrap(&self, record: &PoolBootstrapRecord) -> LaunchResult<()> {
        self.state
            .write()
            .await
            .bootstraps
            .insert(record.influencer, record.clone());
        Ok(())
    }

    async fn append_event(&self, event: &LaunchEvent) -> LaunchResult<()> {
        self.state.write().await.events.push(event.clone());
        Ok(())
    }

    async fn events_for(&self, influencer: &Address) -> LaunchResult<Vec<LaunchEvent>> {
        let state = self.state.read().await;
        Ok(state
            .events
            .iter()
            .filter(|event| &event.influencer == influencer)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> LaunchResult<()> {
        Ok(())
    }
}
