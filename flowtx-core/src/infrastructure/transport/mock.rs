use super::traits::{InboundMessage, Transport, TransportSubscription};
use crate::foundation::{FlowTxError, MessageId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Default)]
struct TopicState {
    next_seq: u64,
    published: Vec<Vec<u8>>,
    pending: BTreeMap<u64, InboundMessage>,
    acked: Vec<MessageId>,
    subscribers: Vec<mpsc::UnboundedSender<InboundMessage>>,
}

impl TopicState {
    fn deliver(&mut self, message: InboundMessage) {
        self.subscribers.retain(|tx| tx.send(message.clone()).is_ok());
    }
}

#[derive(Default)]
struct MockInner {
    topics: HashMap<String, TopicState>,
    failing_topics: HashSet<String>,
}

/// In-memory transport: messages stay pending until acknowledged and can be redelivered on demand.
#[derive(Default)]
pub struct MockTransport {
    inner: Mutex<MockInner>,
    taken: Arc<Mutex<HashMap<String, usize>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later `publish` to `topic` fail.
    pub fn fail_publishes_to(&self, topic: &str) {
        self.inner.lock().failing_topics.insert(topic.to_string());
    }

    /// Delivers every unacknowledged message on `topic` again, bumping its attempt counter.
    pub fn redeliver_unacked(&self, topic: &str) -> usize {
        let mut inner = self.inner.lock();
        let Some(state) = inner.topics.get_mut(topic) else {
            return 0;
        };
        let redelivered: Vec<InboundMessage> = state
            .pending
            .values_mut()
            .map(|message| {
                message.delivery_attempt += 1;
                message.clone()
            })
            .collect();
        for message in &redelivered {
            state.deliver(message.clone());
        }
        redelivered.len()
    }

    pub fn published(&self, topic: &str) -> Vec<Vec<u8>> {
        self.inner.lock().topics.get(topic).map(|state| state.published.clone()).unwrap_or_default()
    }

    pub fn acked(&self, topic: &str) -> Vec<MessageId> {
        self.inner.lock().topics.get(topic).map(|state| state.acked.clone()).unwrap_or_default()
    }

    /// Deliveries consumers have pulled from their subscriptions on `topic`.
    pub fn taken(&self, topic: &str) -> usize {
        self.taken.lock().get(topic).copied().unwrap_or(0)
    }

    pub fn unacked(&self, topic: &str) -> Vec<InboundMessage> {
        self.inner.lock().topics.get(topic).map(|state| state.pending.values().cloned().collect()).unwrap_or_default()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn subscribe(&self, topic: &str) -> Result<TransportSubscription, FlowTxError> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        {
            let mut inner = self.inner.lock();
            let state = inner.topics.entry(topic.to_string()).or_default();
            for message in state.pending.values() {
                let _ = tx.send(message.clone());
            }
            state.subscribers.push(tx);
        }
        let taken = self.taken.clone();
        let topic = topic.to_string();
        let stream = async_stream::stream! {
            while let Some(message) = rx.recv().await {
                *taken.lock().entry(topic.clone()).or_default() += 1;
                yield Ok(message);
            }
        };
        Ok(TransportSubscription::new(Box::pin(stream)))
    }

    async fn ack(&self, topic: &str, message_id: &MessageId) -> Result<(), FlowTxError> {
        let mut inner = self.inner.lock();
        let state = inner.topics.entry(topic.to_string()).or_default();
        let seq = state.pending.iter().find(|(_, message)| &message.id == message_id).map(|(seq, _)| *seq);
        if let Some(seq) = seq {
            state.pending.remove(&seq);
            state.acked.push(message_id.clone());
        }
        Ok(())
    }

    async fn publish(&self, topic: &str, data: &[u8]) -> Result<MessageId, FlowTxError> {
        let mut inner = self.inner.lock();
        if inner.failing_topics.contains(topic) {
            return Err(FlowTxError::transport("publish", format!("mock publish to {topic} rejected")));
        }
        let state = inner.topics.entry(topic.to_string()).or_default();
        state.next_seq += 1;
        let seq = state.next_seq;
        let message = InboundMessage {
            topic: topic.to_string(),
            id: MessageId::new(format!("{topic}-{seq}")),
            data: data.to_vec(),
            delivery_attempt: 1,
        };
        state.published.push(data.to_vec());
        state.pending.insert(seq, message.clone());
        state.deliver(message.clone());
        Ok(message.id)
    }
}
