use crate::domain::{HolderBinding, LeaseRecord};
use crate::foundation::{duration_nanos, now_nanos, FlowTxError, KeyIndex, TransactionId};
use crate::infrastructure::storage::traits::{LeaseStore, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Default)]
struct MemoryInner {
    leases: HashMap<KeyIndex, LeaseRecord>,
    holders: HashMap<TransactionId, HolderBinding>,
}

impl MemoryInner {
    fn live_lease(&mut self, key_index: KeyIndex, now: u64) -> Option<&mut LeaseRecord> {
        if self.leases.get(&key_index).is_some_and(|lease| lease.is_expired(now)) {
            self.remove_lease(key_index);
        }
        self.leases.get_mut(&key_index)
    }

    fn remove_lease(&mut self, key_index: KeyIndex) -> Option<LeaseRecord> {
        let lease = self.leases.remove(&key_index)?;
        if let Some(holder) = lease.holder.as_ref() {
            self.holders.remove(holder);
        }
        Some(lease)
    }

    fn take_live_binding(&mut self, holder: &TransactionId, now: u64) -> Option<HolderBinding> {
        let binding = self.holders.remove(holder)?;
        (now < binding.expires_at_nanos).then_some(binding)
    }
}

/// In-process lease store with a movable clock.
pub struct MemoryLeaseStore {
    inner: Mutex<MemoryInner>,
    clock_offset_nanos: AtomicU64,
    unavailable: AtomicBool,
}

impl MemoryLeaseStore {
    pub fn new() -> Self {
        Self { inner: Mutex::new(MemoryInner::default()), clock_offset_nanos: AtomicU64::new(0), unavailable: AtomicBool::new(false) }
    }

    /// Moves this store's clock forward, expiring any lease whose TTL is covered.
    pub fn advance(&self, by: Duration) {
        self.clock_offset_nanos.fetch_add(duration_nanos(by), Ordering::SeqCst);
    }

    /// While set, every operation fails with `StoreUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn live_lease_count(&self) -> usize {
        let now = self.now();
        self.inner.lock().map(|inner| inner.leases.values().filter(|lease| !lease.is_expired(now)).count()).unwrap_or(0)
    }

    pub fn holder_count(&self) -> usize {
        self.inner.lock().map(|inner| inner.holders.len()).unwrap_or(0)
    }

    fn now(&self) -> u64 {
        now_nanos().saturating_add(self.clock_offset_nanos.load(Ordering::SeqCst))
    }

    fn lock_inner(&self, operation: &str) -> Result<MutexGuard<'_, MemoryInner>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(FlowTxError::store_unavailable(operation, "memory store marked unavailable"));
        }
        self.inner
            .lock()
            .map_err(|_| FlowTxError::StorageError { operation: format!("memory lease store lock ({operation})"), details: "poisoned".to_string() })
    }
}

impl Default for MemoryLeaseStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LeaseStore for MemoryLeaseStore {
    async fn try_acquire_first_free(&self, pool_size: u32, ttl: Duration) -> Result<Option<KeyIndex>> {
        let now = self.now();
        let mut inner = self.lock_inner("try_acquire_first_free")?;
        for index in (1..=pool_size).map(KeyIndex::new) {
            if inner.live_lease(index, now).is_none() {
                inner.leases.insert(index, LeaseRecord::provisional(index, now.saturating_add(duration_nanos(ttl))));
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    async fn bind_holder(&self, holder: &TransactionId, key_index: KeyIndex, ttl: Duration) -> Result<bool> {
        let now = self.now();
        let mut inner = self.lock_inner("bind_holder")?;
        let Some(lease) = inner.live_lease(key_index, now) else {
            return Ok(false);
        };
        let previous = lease.holder.take().filter(|previous| previous != holder);
        lease.confirm(holder.clone());
        if let Some(previous) = previous {
            inner.holders.remove(&previous);
        }
        let binding = HolderBinding { holder: holder.clone(), key_index, expires_at_nanos: now.saturating_add(duration_nanos(ttl)) };
        inner.holders.insert(holder.clone(), binding);
        Ok(true)
    }

    async fn release(&self, key_index: KeyIndex) -> Result<()> {
        self.lock_inner("release")?.remove_lease(key_index);
        Ok(())
    }

    async fn release_by_holder(&self, holder: &TransactionId) -> Result<Option<KeyIndex>> {
        let now = self.now();
        let mut inner = self.lock_inner("release_by_holder")?;
        let Some(binding) = inner.take_live_binding(holder, now) else {
            return Ok(None);
        };
        let held = inner.live_lease(binding.key_index, now).is_some_and(|lease| lease.is_held_by(holder));
        if !held {
            return Ok(None);
        }
        inner.remove_lease(binding.key_index);
        Ok(Some(binding.key_index))
    }

    async fn get_lease(&self, key_index: KeyIndex) -> Result<Option<LeaseRecord>> {
        let now = self.now();
        let mut inner = self.lock_inner("get_lease")?;
        Ok(inner.live_lease(key_index, now).cloned())
    }

    async fn health_check(&self) -> Result<()> {
        self.lock_inner("health_check").map(|_| ())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
