//! RocksDB-backed lease store.
//!
//! # Lock Semantics
//!
//! RocksDB is thread-safe, but acquire scans and holder bindings read several records before writing.
//! All mutating operations therefore run under one store-level `lease_lock`, acquired with a bounded
//! timeout. Reads outside the lock treat expired records as absent; expired records are deleted lazily
//! by the next mutating operation that touches them, together with their holder binding.
//!
//! The lock only serialises callers inside this process. Two processes cannot open the same database.

use crate::domain::{HolderBinding, LeaseRecord};
use crate::foundation::{duration_nanos, now_nanos, FlowTxError, KeyIndex, TransactionId, STORAGE_LOCK_TIMEOUT_SECS};
use crate::infrastructure::storage::rocks::schema::*;
use crate::infrastructure::storage::traits::{LeaseStore, Result};
use crate::store_err;
use async_trait::async_trait;
use bincode::Options;
use log::{debug, info, warn};
use parking_lot::{Mutex, MutexGuard};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options as RocksOptions, WriteBatch, DB};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub struct RocksLeaseStore {
    db: Arc<DB>,
    lease_lock: Mutex<()>,
}

impl RocksLeaseStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("opening RocksLeaseStore path={}", path.display());
        let db = open_db_with_cfs(path)?;
        let store = Self { db: Arc::new(db), lease_lock: Mutex::new(()) };
        store.ensure_schema()?;
        info!("RocksLeaseStore opened path={} holder_bindings={}", path.display(), store.holder_count()?);
        Ok(store)
    }

    pub fn open_in_dir(data_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = data_dir.as_ref();
        fs::create_dir_all(dir).map_err(|err| store_err!("fs::create_dir_all open_in_dir", err))?;
        Self::open(dir.join(DB_DIR_NAME))
    }

    fn ensure_schema(&self) -> Result<()> {
        let cf = self.cf_handle(CF_METADATA)?;
        match self.db.get_cf(cf, SCHEMA_VERSION_KEY).map_err(|err| store_err!("rocksdb get schema_version", err))? {
            None => {
                self.db
                    .put_cf(cf, SCHEMA_VERSION_KEY, SCHEMA_VERSION.to_be_bytes())
                    .map_err(|err| store_err!("rocksdb put schema_version", err))?;
                Ok(())
            }
            Some(bytes) => {
                let stored = <[u8; 4]>::try_from(bytes.as_slice()).map(u32::from_be_bytes).map_err(|_| FlowTxError::StorageError {
                    operation: "rocksdb schema_version".to_string(),
                    details: format!("corrupt schema version ({} bytes)", bytes.len()),
                })?;
                if stored != SCHEMA_VERSION {
                    return Err(FlowTxError::StorageError {
                        operation: "rocksdb schema_version".to_string(),
                        details: format!("stored schema {stored} does not match {SCHEMA_VERSION}"),
                    });
                }
                Ok(())
            }
        }
    }

    /// Holder bindings currently on disk, live or not.
    pub fn holder_count(&self) -> Result<usize> {
        let cf = self.cf_handle(CF_HOLDER)?;
        let mut count = 0;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item.map_err(|err| store_err!("rocksdb iterate holder", err))?;
            count += 1;
        }
        Ok(count)
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| FlowTxError::StorageError {
            operation: "rocksdb cf_handle".to_string(),
            details: format!("missing column family: {}", name),
        })
    }

    fn lock(&self, operation: &'static str) -> Result<MutexGuard<'_, ()>> {
        self.lease_lock
            .try_lock_for(Duration::from_secs(STORAGE_LOCK_TIMEOUT_SECS))
            .ok_or_else(|| FlowTxError::store_unavailable(operation, format!("lease lock timeout after {STORAGE_LOCK_TIMEOUT_SECS}s")))
    }

    fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        bincode::DefaultOptions::new().with_fixint_encoding().serialize(value).map_err(|err| err.into())
    }

    fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        bincode::DefaultOptions::new().with_fixint_encoding().deserialize(bytes).map_err(|err| err.into())
    }

    fn read_lease(&self, key_index: KeyIndex) -> Result<Option<LeaseRecord>> {
        let cf = self.cf_handle(CF_LEASE)?;
        let Some(bytes) = self.db.get_cf(cf, lease_key(key_index)).map_err(|err| store_err!("rocksdb get lease", err))? else {
            return Ok(None);
        };
        Self::decode(&bytes).map(Some)
    }

    fn read_live_lease(&self, key_index: KeyIndex, now: u64) -> Result<Option<LeaseRecord>> {
        Ok(self.read_lease(key_index)?.filter(|lease| !lease.is_expired(now)))
    }

    fn write_lease(&self, batch: &mut WriteBatch, lease: &LeaseRecord) -> Result<()> {
        let cf = self.cf_handle(CF_LEASE)?;
        batch.put_cf(cf, lease_key(lease.key_index), Self::encode(lease)?);
        Ok(())
    }

    /// Drops the holder binding of a lease record that is being replaced or removed.
    fn drop_holder_of(&self, batch: &mut WriteBatch, lease: &LeaseRecord) -> Result<()> {
        if let Some(holder) = lease.holder.as_ref() {
            batch.delete_cf(self.cf_handle(CF_HOLDER)?, holder_key(holder));
        }
        Ok(())
    }

    fn commit(&self, batch: WriteBatch, operation: &'static str) -> Result<()> {
        self.db.write(batch).map_err(|err| store_err!(operation, err))
    }
}

#[async_trait]
impl LeaseStore for RocksLeaseStore {
    async fn try_acquire_first_free(&self, pool_size: u32, ttl: Duration) -> Result<Option<KeyIndex>> {
        let _guard = self.lock("try_acquire_first_free")?;
        let now = now_nanos();
        for index in (1..=pool_size).map(KeyIndex::new) {
            let previous = self.read_lease(index)?;
            if previous.as_ref().is_some_and(|lease| !lease.is_expired(now)) {
                continue;
            }
            let mut batch = WriteBatch::default();
            if let Some(expired) = previous.as_ref() {
                self.drop_holder_of(&mut batch, expired)?;
            }
            self.write_lease(&mut batch, &LeaseRecord::provisional(index, now.saturating_add(duration_nanos(ttl))))?;
            self.commit(batch, "rocksdb write acquire")?;
            return Ok(Some(index));
        }
        Ok(None)
    }

    async fn bind_holder(&self, holder: &TransactionId, key_index: KeyIndex, ttl: Duration) -> Result<bool> {
        let _guard = self.lock("bind_holder")?;
        let now = now_nanos();
        let Some(mut lease) = self.read_live_lease(key_index, now)? else {
            return Ok(false);
        };
        let mut batch = WriteBatch::default();
        if lease.holder.as_ref().is_some_and(|previous| previous != holder) {
            self.drop_holder_of(&mut batch, &lease)?;
        }
        lease.confirm(holder.clone());
        let binding = HolderBinding { holder: holder.clone(), key_index, expires_at_nanos: now.saturating_add(duration_nanos(ttl)) };

        self.write_lease(&mut batch, &lease)?;
        batch.put_cf(self.cf_handle(CF_HOLDER)?, holder_key(holder), Self::encode(&binding)?);
        self.commit(batch, "rocksdb write bind_holder")?;
        Ok(true)
    }

    async fn release(&self, key_index: KeyIndex) -> Result<()> {
        let _guard = self.lock("release")?;
        let mut batch = WriteBatch::default();
        if let Some(lease) = self.read_lease(key_index)? {
            self.drop_holder_of(&mut batch, &lease)?;
        }
        batch.delete_cf(self.cf_handle(CF_LEASE)?, lease_key(key_index));
        self.commit(batch, "rocksdb write release")
    }

    async fn release_by_holder(&self, holder: &TransactionId) -> Result<Option<KeyIndex>> {
        let _guard = self.lock("release_by_holder")?;
        let now = now_nanos();
        let holder_cf = self.cf_handle(CF_HOLDER)?;
        let Some(bytes) = self.db.get_cf(holder_cf, holder_key(holder)).map_err(|err| store_err!("rocksdb get holder", err))? else {
            return Ok(None);
        };
        let binding: HolderBinding = Self::decode(&bytes)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(holder_cf, holder_key(holder));
        let released = if now >= binding.expires_at_nanos {
            None
        } else {
            match self.read_live_lease(binding.key_index, now)? {
                Some(lease) if lease.is_held_by(holder) => {
                    batch.delete_cf(self.cf_handle(CF_LEASE)?, lease_key(binding.key_index));
                    Some(binding.key_index)
                }
                Some(_) => {
                    warn!(
                        "holder mapping points at a lease held by someone else holder={} key_index={}",
                        holder, binding.key_index
                    );
                    None
                }
                None => None,
            }
        };
        self.commit(batch, "rocksdb write release_by_holder")?;
        Ok(released)
    }

    async fn get_lease(&self, key_index: KeyIndex) -> Result<Option<LeaseRecord>> {
        self.read_live_lease(key_index, now_nanos())
    }

    async fn health_check(&self) -> Result<()> {
        self.db
            .get_cf(self.cf_handle(CF_METADATA)?, SCHEMA_VERSION_KEY)
            .map(|_| ())
            .map_err(|err| FlowTxError::store_unavailable("health_check", err))
    }

    fn backend_name(&self) -> &'static str {
        "rocks"
    }
}

fn open_db_with_cfs(path: &Path) -> Result<DB> {
    let mut options = RocksOptions::default();
    options.create_if_missing(true);
    options.create_missing_column_families(true);
    options.set_use_fsync(true);
    options.set_paranoid_checks(true);

    let cfs = vec![
        ColumnFamilyDescriptor::new(CF_DEFAULT, RocksOptions::default()),
        ColumnFamilyDescriptor::new(CF_METADATA, RocksOptions::default()),
        ColumnFamilyDescriptor::new(CF_LEASE, RocksOptions::default()),
        ColumnFamilyDescriptor::new(CF_HOLDER, RocksOptions::default()),
    ];

    DB::open_cf_descriptors(&options, path, cfs).map_err(|err| store_err!("rocksdb open_cf_descriptors", err))
}
