use crate::foundation::{FlowTxError, MessageId};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;

pub type Result<T> = std::result::Result<T, FlowTxError>;

/// One delivery of a message; the same `id` may arrive again until acknowledged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub id: MessageId,
    pub data: Vec<u8>,
    /// 1 on first delivery.
    pub delivery_attempt: u32,
}

pub struct TransportSubscription {
    inner: BoxStream<'static, Result<InboundMessage>>,
}

impl TransportSubscription {
    pub fn new(inner: BoxStream<'static, Result<InboundMessage>>) -> Self {
        Self { inner }
    }

    pub async fn next(&mut self) -> Option<Result<InboundMessage>> {
        self.inner.next().await
    }
}

/// At-least-once message transport: unacknowledged messages are delivered again.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn subscribe(&self, topic: &str) -> Result<TransportSubscription>;
    async fn ack(&self, topic: &str, message_id: &MessageId) -> Result<()>;
    async fn publish(&self, topic: &str, data: &[u8]) -> Result<MessageId>;
}
