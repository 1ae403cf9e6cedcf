//! Redis Streams transport.
//!
//! Each topic is a stream read through one consumer group. New entries arrive via `XREADGROUP`;
//! entries left pending (unacknowledged) for longer than `redelivery_idle_ms` are taken over with
//! `XAUTOCLAIM` and delivered again. Payloads live in the `data` field of each entry.

use super::traits::{InboundMessage, Transport, TransportSubscription};
use crate::foundation::{FlowTxError, MessageId};
use crate::infrastructure::config::{redact_url, TransportConfig};
use async_trait::async_trait;
use log::{debug, info, warn};
use redis::aio::{ConnectionManager, MultiplexedConnection};
use redis::streams::{StreamAutoClaimOptions, StreamAutoClaimReply, StreamId, StreamPendingCountReply, StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use std::time::Duration;

const DATA_FIELD: &str = "data";
/// Entries pulled per round trip; read entries sit in the pending list until the intake loop has a permit for them.
const READ_BATCH: usize = 1;
const READ_ERROR_BACKOFF: Duration = Duration::from_secs(1);
const CURSOR_START: &str = "0-0";

#[derive(Clone, Debug)]
pub struct StreamSettings {
    pub group: String,
    pub consumer: String,
    pub block_ms: usize,
    pub redelivery_idle_ms: usize,
}

impl From<&TransportConfig> for StreamSettings {
    fn from(config: &TransportConfig) -> Self {
        Self {
            group: config.consumer_group.clone(),
            consumer: config.consumer_name.clone(),
            block_ms: usize::try_from(config.block_ms).unwrap_or(usize::MAX),
            redelivery_idle_ms: usize::try_from(config.redelivery_idle_ms).unwrap_or(usize::MAX),
        }
    }
}

pub struct RedisStreamsTransport {
    client: redis::Client,
    conn: ConnectionManager,
    settings: StreamSettings,
}

impl RedisStreamsTransport {
    pub async fn connect(url: &str, settings: StreamSettings) -> Result<Self, FlowTxError> {
        let client = redis::Client::open(url).map_err(|err| FlowTxError::transport("redis client open", err))?;
        let conn = ConnectionManager::new(client.clone()).await.map_err(|err| FlowTxError::transport("redis connect", err))?;
        info!(
            "redis streams transport connected url={} group={} consumer={}",
            redact_url(url),
            settings.group,
            settings.consumer
        );
        Ok(Self { client, conn, settings })
    }

    async fn ensure_group(&self, topic: &str) -> Result<(), FlowTxError> {
        let mut conn = self.conn.clone();
        let created: redis::RedisResult<()> = conn.xgroup_create_mkstream(topic, &self.settings.group, "$").await;
        match created {
            Ok(()) => {
                debug!("created consumer group topic={} group={}", topic, self.settings.group);
                Ok(())
            }
            Err(err) if err.code() == Some("BUSYGROUP") => Ok(()),
            Err(err) => Err(FlowTxError::transport("xgroup create", err)),
        }
    }
}

fn to_inbound(topic: &str, entry: &StreamId, delivery_attempt: u32) -> InboundMessage {
    let data = entry.get::<Vec<u8>>(DATA_FIELD).unwrap_or_else(|| {
        warn!("stream entry without data field topic={} id={}", topic, entry.id);
        Vec::new()
    });
    InboundMessage { topic: topic.to_string(), id: MessageId::new(entry.id.clone()), data, delivery_attempt }
}

async fn delivery_count(conn: &mut MultiplexedConnection, topic: &str, group: &str, id: &str) -> u32 {
    let reply: redis::RedisResult<StreamPendingCountReply> = conn.xpending_count(topic, group, id, id, 1).await;
    match reply {
        Ok(reply) => reply.ids.first().map(|pending| u32::try_from(pending.times_delivered).unwrap_or(u32::MAX)).unwrap_or(2),
        Err(_) => 2,
    }
}

#[async_trait]
impl Transport for RedisStreamsTransport {
    async fn subscribe(&self, topic: &str) -> Result<TransportSubscription, FlowTxError> {
        self.ensure_group(topic).await?;
        // Blocking reads would stall every other command sharing a multiplexed connection.
        let mut conn =
            self.client.get_multiplexed_async_connection().await.map_err(|err| FlowTxError::transport("subscribe connect", err))?;
        let topic = topic.to_string();
        let settings = self.settings.clone();
        info!("subscribed topic={} group={} consumer={}", topic, settings.group, settings.consumer);

        let stream = async_stream::stream! {
            let mut cursor = CURSOR_START.to_string();
            loop {
                let claim_opts = StreamAutoClaimOptions::default().count(READ_BATCH);
                let claimed: redis::RedisResult<StreamAutoClaimReply> = conn
                    .xautoclaim_options(&topic, &settings.group, &settings.consumer, settings.redelivery_idle_ms, &cursor, claim_opts)
                    .await;
                match claimed {
                    Ok(reply) => {
                        cursor = reply.next_stream_id.clone();
                        for entry in &reply.claimed {
                            let attempt = delivery_count(&mut conn, &topic, &settings.group, &entry.id).await;
                            debug!("reclaimed idle entry topic={} id={} delivery_attempt={}", topic, entry.id, attempt);
                            yield Ok(to_inbound(&topic, entry, attempt));
                        }
                    }
                    Err(err) => {
                        yield Err(FlowTxError::transport("xautoclaim", err));
                        tokio::time::sleep(READ_ERROR_BACKOFF).await;
                        continue;
                    }
                }

                let read_opts = StreamReadOptions::default()
                    .group(&settings.group, &settings.consumer)
                    .block(settings.block_ms)
                    .count(READ_BATCH);
                let read: redis::RedisResult<StreamReadReply> = conn.xread_options(&[topic.as_str()], &[">"], &read_opts).await;
                match read {
                    Ok(reply) => {
                        for key in &reply.keys {
                            for entry in &key.ids {
                                yield Ok(to_inbound(&topic, entry, 1));
                            }
                        }
                    }
                    Err(err) => {
                        yield Err(FlowTxError::transport("xreadgroup", err));
                        tokio::time::sleep(READ_ERROR_BACKOFF).await;
                    }
                }
            }
        };
        Ok(TransportSubscription::new(Box::pin(stream)))
    }

    async fn ack(&self, topic: &str, message_id: &MessageId) -> Result<(), FlowTxError> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.xack(topic, &self.settings.group, &[message_id.as_str()]).await.map_err(|err| FlowTxError::transport("xack", err))?;
        Ok(())
    }

    async fn publish(&self, topic: &str, data: &[u8]) -> Result<MessageId, FlowTxError> {
        let mut conn = self.conn.clone();
        let id: String = conn.xadd(topic, "*", &[(DATA_FIELD, data)]).await.map_err(|err| FlowTxError::transport("xadd", err))?;
        Ok(MessageId::new(id))
    }
}
