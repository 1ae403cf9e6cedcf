use crate::service::intake::{MessageDisposition, MessageHandler};
use crate::service::metrics::Metrics;
use async_trait::async_trait;
use flowtx_core::application::KeyLeaseManager;
use flowtx_core::domain::ChainEvent;
use flowtx_core::infrastructure::events::EventSink;
use flowtx_core::infrastructure::transport::InboundMessage;
use log::{debug, warn};
use std::sync::Arc;

/// Forwards chain events to the sink, optionally freeing the proposer key of the event's transaction.
pub struct EventHandler {
    sink: Arc<dyn EventSink>,
    leases: Option<Arc<KeyLeaseManager>>,
    metrics: Arc<Metrics>,
}

impl EventHandler {
    pub fn new(sink: Arc<dyn EventSink>, metrics: Arc<Metrics>) -> Self {
        Self { sink, leases: None, metrics }
    }

    pub fn with_lease_release(mut self, leases: Arc<KeyLeaseManager>) -> Self {
        self.leases = Some(leases);
        self
    }
}

#[async_trait]
impl MessageHandler for EventHandler {
    fn kind(&self) -> &'static str {
        "event"
    }

    async fn handle(&self, message: &InboundMessage) -> MessageDisposition {
        let event = match ChainEvent::from_json(&message.data) {
            Ok(event) => event,
            Err(err) => {
                warn!("malformed event message_id={} error={}", message.id, err);
                self.metrics.inc_malformed(self.kind());
                return MessageDisposition::Retry;
            }
        };

        if let Err(err) = self.sink.forward(&event).await {
            self.metrics.inc_event(false);
            warn!("event sink rejected event id={} message_id={} error={}", event.id, message.id, err);
            return MessageDisposition::Retry;
        }
        self.metrics.inc_event(true);
        debug!("event forwarded id={} message_id={}", event.id, message.id);

        if let (Some(leases), Some(tx_id)) = (self.leases.as_ref(), event.transaction_id()) {
            if let Err(err) = leases.release_by_transaction(&tx_id).await {
                warn!("lease release on event failed tx_id={} error={}", tx_id, err);
            }
        }
        MessageDisposition::Ack
    }
}
