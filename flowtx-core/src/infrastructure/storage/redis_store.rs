//! Redis-backed lease store shared by every service instance.
//!
//! Layout:
//! - `proposal-key:<i>` -> `provisional` | `confirmed:<tx_id>`, with the lease TTL.
//! - `transaction-key:<tx_id>` -> `<i>`, with its own TTL.
//!
//! Multi-key operations run as Lua scripts so each is a single atomic step on the server.
//! `bind_holder` relies on `SET ... KEEPTTL` (Redis 6.0+).

use crate::domain::{decode_lease_tag, encode_lease_tag, LeaseRecord, LeaseState};
use crate::foundation::{
    duration_millis_ceil, now_nanos, FlowTxError, KeyIndex, TransactionId, NANOS_PER_MILLI, PROPOSAL_KEY_PREFIX, TRANSACTION_KEY_PREFIX,
};
use crate::infrastructure::storage::traits::{LeaseStore, Result};
use async_trait::async_trait;
use log::{debug, info};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use std::time::Duration;

const ACQUIRE_FIRST_FREE_LUA: &str = r#"
local prefix = ARGV[1]
local pool_size = tonumber(ARGV[2])
local ttl_ms = tonumber(ARGV[3])
for i = 1, pool_size do
  local key = prefix .. i
  if redis.call("EXISTS", key) == 0 then
    redis.call("SET", key, "provisional", "PX", ttl_ms)
    return i
  end
end
return false
"#;

const BIND_HOLDER_LUA: &str = r#"
if redis.call("EXISTS", KEYS[2]) == 0 then
  return 0
end
redis.call("SET", KEYS[1], ARGV[1], "PX", tonumber(ARGV[3]))
redis.call("SET", KEYS[2], ARGV[2], "KEEPTTL")
return 1
"#;

const RELEASE_BY_HOLDER_LUA: &str = r#"
local index = redis.call("GET", KEYS[1])
if not index then
  return false
end
redis.call("DEL", KEYS[1])
local lease_key = ARGV[1] .. index
if redis.call("GET", lease_key) == ARGV[2] then
  redis.call("DEL", lease_key)
  return tonumber(index)
end
return false
"#;

pub fn proposal_key(key_index: KeyIndex) -> String {
    format!("{PROPOSAL_KEY_PREFIX}{key_index}")
}

pub fn transaction_key(holder: &TransactionId) -> String {
    format!("{TRANSACTION_KEY_PREFIX}{holder}")
}

#[derive(Clone)]
pub struct RedisLeaseStore {
    conn: ConnectionManager,
    acquire_script: Script,
    bind_script: Script,
    release_by_holder_script: Script,
}

impl RedisLeaseStore {
    pub async fn connect(url: &str) -> Result<Self> {
        debug!("connecting redis lease store url={}", crate::infrastructure::config::redact_url(url));
        let client = redis::Client::open(url).map_err(|err| FlowTxError::store_unavailable("redis client open", err))?;
        let conn = ConnectionManager::new(client).await.map_err(|err| FlowTxError::store_unavailable("redis connect", err))?;
        info!("redis lease store connected url={}", crate::infrastructure::config::redact_url(url));
        Ok(Self::with_connection(conn))
    }

    pub fn with_connection(conn: ConnectionManager) -> Self {
        Self {
            conn,
            acquire_script: Script::new(ACQUIRE_FIRST_FREE_LUA),
            bind_script: Script::new(BIND_HOLDER_LUA),
            release_by_holder_script: Script::new(RELEASE_BY_HOLDER_LUA),
        }
    }
}

fn unavailable(operation: &'static str) -> impl FnOnce(redis::RedisError) -> FlowTxError {
    move |err| FlowTxError::store_unavailable(operation, err)
}

#[async_trait]
impl LeaseStore for RedisLeaseStore {
    async fn try_acquire_first_free(&self, pool_size: u32, ttl: Duration) -> Result<Option<KeyIndex>> {
        let mut conn = self.conn.clone();
        let index: Option<u32> = self
            .acquire_script
            .arg(PROPOSAL_KEY_PREFIX)
            .arg(pool_size)
            .arg(duration_millis_ceil(ttl))
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable("try_acquire_first_free"))?;
        Ok(index.map(KeyIndex::new))
    }

    async fn bind_holder(&self, holder: &TransactionId, key_index: KeyIndex, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        let bound: i64 = self
            .bind_script
            .key(transaction_key(holder))
            .key(proposal_key(key_index))
            .arg(key_index.get())
            .arg(encode_lease_tag(LeaseState::Confirmed, Some(holder)))
            .arg(duration_millis_ceil(ttl))
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable("bind_holder"))?;
        Ok(bound == 1)
    }

    async fn release(&self, key_index: KeyIndex) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(proposal_key(key_index)).await.map_err(unavailable("release"))?;
        Ok(())
    }

    async fn release_by_holder(&self, holder: &TransactionId) -> Result<Option<KeyIndex>> {
        let mut conn = self.conn.clone();
        let index: Option<u32> = self
            .release_by_holder_script
            .key(transaction_key(holder))
            .arg(PROPOSAL_KEY_PREFIX)
            .arg(encode_lease_tag(LeaseState::Confirmed, Some(holder)))
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable("release_by_holder"))?;
        Ok(index.map(KeyIndex::new))
    }

    async fn get_lease(&self, key_index: KeyIndex) -> Result<Option<LeaseRecord>> {
        let mut conn = self.conn.clone();
        let key = proposal_key(key_index);
        let (tag, pttl_ms): (Option<String>, i64) =
            redis::pipe().get(&key).pttl(&key).query_async(&mut conn).await.map_err(unavailable("get_lease"))?;
        let Some(tag) = tag else {
            return Ok(None);
        };
        let expires_at_nanos = match u64::try_from(pttl_ms) {
            Ok(ms) => now_nanos().saturating_add(ms.saturating_mul(NANOS_PER_MILLI)),
            Err(_) => u64::MAX,
        };
        let (state, holder) = decode_lease_tag(&tag);
        Ok(Some(LeaseRecord { key_index, state, holder, expires_at_nanos }))
    }

    async fn health_check(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await.map_err(unavailable("health_check"))?;
        if pong != "PONG" {
            return Err(FlowTxError::store_unavailable("health_check", format!("unexpected PING reply: {pong}")));
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
