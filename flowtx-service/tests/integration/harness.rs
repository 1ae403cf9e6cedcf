#![allow(dead_code)]

use flowtx_core::infrastructure::chain::{KmsAuthorizer, MockSubmitter};
use flowtx_core::infrastructure::config::AppConfig;
use flowtx_core::infrastructure::events::RecordingEventSink;
use flowtx_core::infrastructure::storage::MemoryLeaseStore;
use flowtx_core::infrastructure::transport::MockTransport;
use flowtx_service::service::flow::ServiceFlow;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const COMMAND_TOPIC: &str = "transaction-commands";
pub const EVENT_TOPIC: &str = "chain-events";
pub const CALLBACK_TOPIC: &str = "fusd-callbacks";

pub fn test_config(pool_size: u32, release_leases_on_event: bool) -> AppConfig {
    let mut config = AppConfig::default();
    config.lease.pool_size = pool_size;
    config.lease.key_ttl_secs = 120;
    config.transport.command_topic = COMMAND_TOPIC.to_string();
    config.transport.event_topic = EVENT_TOPIC.to_string();
    config.transport.max_in_flight = 8;
    config.chain.admin_address = "0xf8d6e0586b0a20c7".to_string();
    config.chain.gateway_url = "http://127.0.0.1:8700".to_string();
    config.chain.submit_timeout_secs = 2;
    config.kms.resource_name = "projects/flow/locations/global/keyRings/admin/cryptoKeys/proposer/cryptoKeyVersions/1".to_string();
    config.contracts.fungible_token_address = "0x9a0766d93b6608b7".to_string();
    config.contracts.fusd_address = "0xe223d8a629e49c68".to_string();
    config.events.release_leases_on_event = release_leases_on_event;
    config
}

pub struct ServiceHarness {
    pub store: Arc<MemoryLeaseStore>,
    pub transport: Arc<MockTransport>,
    pub submitter: Arc<MockSubmitter>,
    pub sink: Arc<RecordingEventSink>,
    pub flow: Arc<ServiceFlow>,
    shutdown: watch::Sender<bool>,
    loops: Option<JoinHandle<()>>,
}

impl ServiceHarness {
    pub fn new(config: AppConfig, submitter: MockSubmitter) -> Self {
        let store = Arc::new(MemoryLeaseStore::new());
        let transport = Arc::new(MockTransport::new());
        let submitter = Arc::new(submitter);
        let sink = Arc::new(RecordingEventSink::new());
        let flow = ServiceFlow::new(
            Arc::new(config),
            store.clone(),
            transport.clone(),
            Arc::new(KmsAuthorizer::new("test-kms")),
            submitter.clone(),
            sink.clone(),
        )
        .expect("service flow");
        let (shutdown, _) = watch::channel(false);
        Self { store, transport, submitter, sink, flow: Arc::new(flow), shutdown, loops: None }
    }

    pub fn start(&mut self) {
        let flow = self.flow.clone();
        let shutdown = self.shutdown.subscribe();
        self.loops = Some(tokio::spawn(async move {
            flow.run(shutdown).await.expect("intake loops");
        }));
    }

    /// Signals shutdown and waits for both loops to return.
    pub async fn stop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(loops) = self.loops.take() {
            tokio::time::timeout(Duration::from_secs(5), loops).await.expect("loops stop").expect("loops join");
        }
    }

    pub async fn send_command(&self, id: &str) {
        self.send_raw(COMMAND_TOPIC, command_json(id).to_string().as_bytes()).await;
    }

    pub async fn send_raw(&self, topic: &str, data: &[u8]) {
        use flowtx_core::infrastructure::transport::Transport;
        self.transport.publish(topic, data).await.expect("publish");
    }

    pub fn callbacks(&self) -> Vec<Value> {
        self.transport.published(CALLBACK_TOPIC).iter().map(|data| serde_json::from_slice(data).expect("callback json")).collect()
    }
}

pub fn command_json(id: &str) -> Value {
    json!({
        "id": id,
        "type": "FUSD_SETUP_ACCOUNT",
        "callbackTopic": CALLBACK_TOPIC,
        "payload": [],
    })
}

pub fn event_json(id: &str, flow_transaction_id: &str) -> Value {
    json!({
        "id": id,
        "graffleProjectId": "proj-1",
        "graffleCompanyId": "comp-1",
        "flowEventId": "A.e223d8a629e49c68.FUSD.TokensDeposited",
        "graffleEventToken": "token-1",
        "blockHeight": 48_213_007u64,
        "eventDate": "2021-10-04T12:00:00Z",
        "createdAt": "2021-10-04T12:00:01Z",
        "blockEventData": {"amount": "10.0", "to": "0x01cf0e2f2f715450"},
        "webHook": "https://hooks.example/flow",
        "flowBlockId": "b1",
        "flowTransactionId": flow_transaction_id,
        "transactionIndex": 0,
        "eventIndex": 1,
        "collectionId": "col-1",
        "graffleWebHookDataId": "wh-1",
    })
}

/// Polls `condition` every 10ms until it holds or `timeout` elapses.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub const WAIT: Duration = Duration::from_secs(3);
