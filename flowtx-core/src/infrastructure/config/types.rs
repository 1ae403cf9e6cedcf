use crate::foundation::{
    DEFAULT_ADMIN_KEY_INDEX, DEFAULT_COMPUTE_LIMIT, DEFAULT_KEY_TTL_SECS, DEFAULT_MAX_IN_FLIGHT, DEFAULT_PROPOSER_KEY_COUNT,
    DEFAULT_SUBMIT_TIMEOUT_SECS,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_API_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_CONSUMER_GROUP: &str = "flow-transaction-service";
pub const DEFAULT_BLOCK_MS: u64 = 5_000;
pub const DEFAULT_REDELIVERY_IDLE_MS: u64 = 60_000;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub lease: LeaseConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub kms: KmsConfig,
    #[serde(default)]
    pub contracts: ContractsConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Deployment label (`development`, `staging`, `production`); informational only.
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub data_dir: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseBackend {
    /// Shared across every service instance.
    #[default]
    Redis,
    /// Single-host RocksDB under `service.data_dir`.
    Rocks,
}

impl std::fmt::Display for LeaseBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redis => write!(f, "redis"),
            Self::Rocks => write!(f, "rocks"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LeaseConfig {
    #[serde(default)]
    pub backend: LeaseBackend,
    #[serde(default)]
    pub store_url: String,
    pub pool_size: u32,
    pub key_ttl_secs: u64,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            backend: LeaseBackend::default(),
            store_url: DEFAULT_REDIS_URL.to_string(),
            pool_size: DEFAULT_PROPOSER_KEY_COUNT,
            key_ttl_secs: DEFAULT_KEY_TTL_SECS,
        }
    }
}

impl LeaseConfig {
    pub fn key_ttl(&self) -> Duration {
        Duration::from_secs(self.key_ttl_secs)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default)]
    pub store_url: String,
    #[serde(default)]
    pub command_topic: String,
    #[serde(default)]
    pub event_topic: String,
    #[serde(default)]
    pub consumer_group: String,
    /// Defaults to `<hostname-or-pid>` when empty.
    #[serde(default)]
    pub consumer_name: String,
    pub block_ms: u64,
    /// Entries pending longer than this are claimed and redelivered.
    pub redelivery_idle_ms: u64,
    pub max_in_flight: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            store_url: DEFAULT_REDIS_URL.to_string(),
            command_topic: String::new(),
            event_topic: String::new(),
            consumer_group: DEFAULT_CONSUMER_GROUP.to_string(),
            consumer_name: String::new(),
            block_ms: DEFAULT_BLOCK_MS,
            redelivery_idle_ms: DEFAULT_REDELIVERY_IDLE_MS,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default)]
    pub access_api_url: String,
    /// Signing gateway base URL; the gateway owns the chain SDK and the KMS client.
    #[serde(default)]
    pub gateway_url: String,
    #[serde(default)]
    pub admin_address: String,
    pub admin_key_index: u32,
    pub compute_limit: u64,
    pub submit_timeout_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            access_api_url: String::new(),
            gateway_url: String::new(),
            admin_address: String::new(),
            admin_key_index: DEFAULT_ADMIN_KEY_INDEX,
            compute_limit: DEFAULT_COMPUTE_LIMIT,
            submit_timeout_secs: DEFAULT_SUBMIT_TIMEOUT_SECS,
        }
    }
}

impl ChainConfig {
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KmsConfig {
    #[serde(default)]
    pub resource_name: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContractsConfig {
    #[serde(default)]
    pub fungible_token_address: String,
    #[serde(default)]
    pub fusd_address: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Events are only logged when unset.
    #[serde(default)]
    pub sink_url: Option<String>,
    #[serde(default)]
    pub release_leases_on_event: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub addr: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { enabled: true, addr: DEFAULT_API_ADDR.to_string() }
    }
}
