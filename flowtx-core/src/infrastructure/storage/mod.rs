#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod redis_store;
pub mod rocks;
pub mod traits;

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryLeaseStore;
pub use redis_store::RedisLeaseStore;
pub use rocks::RocksLeaseStore;
pub use traits::*;

use crate::foundation::FlowTxError;
use crate::infrastructure::config::{LeaseBackend, LeaseConfig};
use std::path::Path;
use std::sync::Arc;

/// Opens the configured lease store backend.
pub async fn open_lease_store(config: &LeaseConfig, data_dir: &Path) -> std::result::Result<Arc<dyn LeaseStore>, FlowTxError> {
    match config.backend {
        LeaseBackend::Redis => Ok(Arc::new(RedisLeaseStore::connect(&config.store_url).await?)),
        LeaseBackend::Rocks => Ok(Arc::new(RocksLeaseStore::open_in_dir(data_dir)?)),
    }
}
