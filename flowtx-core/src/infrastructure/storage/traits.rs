use crate::domain::LeaseRecord;
use crate::foundation::{FlowTxError, KeyIndex, TransactionId};
use async_trait::async_trait;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, FlowTxError>;

/// Shared, TTL-expiring lease records for the proposer key pool.
///
/// Every implementation must make `try_acquire_first_free` atomic across all callers sharing the store,
/// including callers in other processes for shared backends.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Claims the lowest index in `1..=pool_size` without a live record, marking it provisional for `ttl`.
    async fn try_acquire_first_free(&self, pool_size: u32, ttl: Duration) -> Result<Option<KeyIndex>>;

    /// Records `holder -> key_index` for `ttl` and confirms the primary record, keeping its own expiry.
    ///
    /// Returns `false` (and records nothing) when the primary record is no longer held.
    async fn bind_holder(&self, holder: &TransactionId, key_index: KeyIndex, ttl: Duration) -> Result<bool>;

    async fn release(&self, key_index: KeyIndex) -> Result<()>;

    /// Removes the holder mapping and the primary record it points to.
    ///
    /// The primary record is only removed while it is still confirmed for `holder`; the released index is returned.
    async fn release_by_holder(&self, holder: &TransactionId) -> Result<Option<KeyIndex>>;

    async fn get_lease(&self, key_index: KeyIndex) -> Result<Option<LeaseRecord>>;

    async fn health_check(&self) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}
