#![allow(dead_code)]

use async_trait::async_trait;
use flowtx_core::application::{DispatchConfig, KeyLeaseManager, RecordingObserver, TransactionDispatcher};
use flowtx_core::domain::{import_map, Command, LeaseRecord, TemplateRegistry};
use flowtx_core::foundation::{CommandId, FlowTxError, KeyIndex, TransactionId};
use flowtx_core::infrastructure::chain::{KmsAuthorizer, MockSubmitter};
use flowtx_core::infrastructure::storage::{LeaseStore, MemoryLeaseStore};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const ADMIN_ADDRESS: &str = "0xf8d6e0586b0a20c7";
pub const FUNGIBLE_TOKEN_ADDRESS: &str = "0xee82856bf20e2aa6";
pub const FUSD_ADDRESS: &str = "0x0ae53cb6e3f42a79";
pub const KMS_RESOURCE: &str = "projects/flow/locations/global/keyRings/admin/cryptoKeys/proposer/cryptoKeyVersions/1";
pub const SETUP_ACCOUNT: &str = "FUSD_SETUP_ACCOUNT";
pub const LEASE_TTL: Duration = Duration::from_secs(120);

pub fn command(id: &str) -> Command {
    command_of_kind(id, SETUP_ACCOUNT)
}

pub fn command_of_kind(id: &str, kind: &str) -> Command {
    Command { id: CommandId::from(id), kind: kind.to_string(), callback_topic: "callbacks".to_string(), payload: vec![json!({"type": "Address", "value": ADMIN_ADDRESS})] }
}

pub fn dispatch_config(submit_timeout: Duration) -> DispatchConfig {
    DispatchConfig { admin_address: ADMIN_ADDRESS.to_string(), admin_key_index: KeyIndex::new(0), compute_limit: 9999, submit_timeout }
}

/// Memory store that counts `release` calls per key.
pub struct CountingLeaseStore {
    inner: Arc<MemoryLeaseStore>,
    releases: parking_lot::Mutex<Vec<KeyIndex>>,
    release_by_holder_calls: AtomicUsize,
}

impl CountingLeaseStore {
    pub fn new(inner: Arc<MemoryLeaseStore>) -> Self {
        Self { inner, releases: parking_lot::Mutex::new(Vec::new()), release_by_holder_calls: AtomicUsize::new(0) }
    }

    pub fn releases(&self) -> Vec<KeyIndex> {
        self.releases.lock().clone()
    }

    pub fn release_by_holder_calls(&self) -> usize {
        self.release_by_holder_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LeaseStore for CountingLeaseStore {
    async fn try_acquire_first_free(&self, pool_size: u32, ttl: Duration) -> Result<Option<KeyIndex>, FlowTxError> {
        self.inner.try_acquire_first_free(pool_size, ttl).await
    }

    async fn bind_holder(&self, holder: &TransactionId, key_index: KeyIndex, ttl: Duration) -> Result<bool, FlowTxError> {
        self.inner.bind_holder(holder, key_index, ttl).await
    }

    async fn release(&self, key_index: KeyIndex) -> Result<(), FlowTxError> {
        self.releases.lock().push(key_index);
        self.inner.release(key_index).await
    }

    async fn release_by_holder(&self, holder: &TransactionId) -> Result<Option<KeyIndex>, FlowTxError> {
        self.release_by_holder_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.release_by_holder(holder).await
    }

    async fn get_lease(&self, key_index: KeyIndex) -> Result<Option<LeaseRecord>, FlowTxError> {
        self.inner.get_lease(key_index).await
    }

    async fn health_check(&self) -> Result<(), FlowTxError> {
        self.inner.health_check().await
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }
}

pub struct DispatchHarness {
    pub store: Arc<MemoryLeaseStore>,
    pub counting: Arc<CountingLeaseStore>,
    pub leases: Arc<KeyLeaseManager>,
    pub submitter: Arc<MockSubmitter>,
    pub observer: Arc<RecordingObserver>,
    pub dispatcher: TransactionDispatcher,
}

pub fn dispatch_harness(pool_size: u32, submitter: MockSubmitter) -> DispatchHarness {
    dispatch_harness_with_timeout(pool_size, submitter, Duration::from_secs(5))
}

pub fn dispatch_harness_with_timeout(pool_size: u32, submitter: MockSubmitter, submit_timeout: Duration) -> DispatchHarness {
    let store = Arc::new(MemoryLeaseStore::new());
    let counting = Arc::new(CountingLeaseStore::new(store.clone()));
    let leases = Arc::new(KeyLeaseManager::new(counting.clone(), pool_size, LEASE_TTL));
    let submitter = Arc::new(submitter);
    let observer = Arc::new(RecordingObserver::new());
    let dispatcher = TransactionDispatcher::new(
        leases.clone(),
        TemplateRegistry::new(import_map(FUNGIBLE_TOKEN_ADDRESS, FUSD_ADDRESS)),
        Arc::new(KmsAuthorizer::new(KMS_RESOURCE)),
        submitter.clone(),
        dispatch_config(submit_timeout),
    )
    .with_observer(observer.clone());
    DispatchHarness { store, counting, leases, submitter, observer, dispatcher }
}
