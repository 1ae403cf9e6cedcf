use crate::domain::{KeyPool, LeaseRecord};
use crate::foundation::{FlowTxError, KeyIndex, TransactionId};
use crate::infrastructure::storage::LeaseStore;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Exclusive, TTL-bounded leases over the proposer key pool.
///
/// A lease is provisional from `acquire` until `confirm`; only expiry recovers a provisional lease
/// whose owner crashed. Confirmed leases are released by transaction id once the outcome is known.
pub struct KeyLeaseManager {
    store: Arc<dyn LeaseStore>,
    pool: KeyPool,
    ttl: Duration,
}

impl KeyLeaseManager {
    pub fn new(store: Arc<dyn LeaseStore>, pool_size: u32, ttl: Duration) -> Self {
        Self { store, pool: KeyPool::new(pool_size), ttl }
    }

    pub fn pool(&self) -> KeyPool {
        self.pool
    }

    /// `Ok(None)` when every key is leased.
    pub async fn acquire(&self) -> Result<Option<KeyIndex>, FlowTxError> {
        let acquired = self.store.try_acquire_first_free(self.pool.size(), self.ttl).await?;
        match acquired {
            Some(index) => debug!("proposer key acquired key_index={} ttl_secs={}", index, self.ttl.as_secs()),
            None => warn!("no free proposer key pool_size={}", self.pool.size()),
        }
        Ok(acquired)
    }

    pub async fn confirm(&self, key_index: KeyIndex, holder: &TransactionId) -> Result<(), FlowTxError> {
        let held = self.store.bind_holder(holder, key_index, self.ttl).await?;
        if held {
            info!("proposer key locked key_index={} tx_id={}", key_index, holder);
        } else {
            warn!("proposer key lease expired before confirmation key_index={} tx_id={}", key_index, holder);
        }
        Ok(())
    }

    pub async fn release(&self, key_index: KeyIndex) -> Result<(), FlowTxError> {
        self.store.release(key_index).await?;
        info!("proposer key released key_index={}", key_index);
        Ok(())
    }

    /// No-op for an unknown or expired transaction id.
    pub async fn release_by_transaction(&self, holder: &TransactionId) -> Result<Option<KeyIndex>, FlowTxError> {
        let released = self.store.release_by_holder(holder).await?;
        match released {
            Some(index) => info!("proposer key released by transaction key_index={} tx_id={}", index, holder),
            None => debug!("no lease held by transaction tx_id={}", holder),
        }
        Ok(released)
    }

    /// Live lease record for every pool slot, in index order.
    pub async fn snapshot(&self) -> Result<Vec<(KeyIndex, Option<LeaseRecord>)>, FlowTxError> {
        let mut slots = Vec::with_capacity(self.pool.size() as usize);
        for index in self.pool.indices() {
            slots.push((index, self.store.get_lease(index).await?));
        }
        Ok(slots)
    }
}
