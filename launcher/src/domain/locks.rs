//! Per-influencer serialization

use alloy_primitives::Address;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per influencer. Every read-modify-write of a launch record
/// runs under its influencer's lock; different influencers never contend.
/// Entries exist only while a guard is held or awaited.
#[derive(Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<Address, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: Address) -> KeyGuard<'_> {
        let lock = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_default()
            .clone();
        KeyGuard {
            locks: self,
            key,
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Keys with a live entry
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Holds one key's lock; drops the map entry once nobody else holds or awaits it
pub struct KeyGuard<'a> {
    locks: &'a KeyedLocks,
    key: Address,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.locks.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // The map's own reference is the last one
        if locks.get(&self.key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&self.key);
        }
    }
}

/// Influencers with a liquidity bootstrap currently running
#[derive(Default)]
pub struct InFlightRegistry {
    active: Mutex<HashSet<Address>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `key`; `None` while another holder is active
    pub fn try_acquire(&self, key: Address) -> Option<InFlightGuard<'_>> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.insert(key).then_some(InFlightGuard { registry: self, key })
    }

    pub fn is_active(&self, key: &Address) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

/// Releases the in-flight slot on drop
pub struct InFlightGuard<'a> {
    registry: &'a InFlightRegistry,
    key: Address,
}

impl InFlightGuard<'_> {
    pub fn key(&self) -> Address {
        self.key
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.registry
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_in_flight_slot_is_exclusive() {
        let registry = InFlightRegistry::new();
        let key = Address::repeat_byte(1);

        let guard = registry.try_acquire(key).unwrap();
        assert!(registry.try_acquire(key).is_none());
        assert!(registry.try_acquire(Address::repeat_byte(2)).is_some());
        drop(guard);

        assert!(!registry.is_active(&key));
        assert!(registry.try_acquire(key).is_some());
    }

    #[tokio::test]
    async fn test_keyed_lock_serializes_same_key() {
        let locks = Arc::new(KeyedLocks::new());
        let key = Address::repeat_byte(7);
        let guard = locks.lock(key).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(key).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        // Other keys are independent
        let _other = locks.lock(Address::repeat_byte(8)).await;

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_released_keys_are_pruned() {
        let locks = Arc::new(KeyedLocks::new());
        let key = Address::repeat_byte(7);

        let guard = locks.lock(key).await;
        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(key).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // A queued waiter keeps the entry alive past the first release
        drop(guard);
        assert_eq!(locks.len(), 1);
        waiter.await.unwrap();
        assert!(locks.is_empty());

        for byte in 0..32 {
            drop(locks.lock(Address::repeat_byte(byte)).await);
        }
        assert!(locks.is_empty());
    }
}
