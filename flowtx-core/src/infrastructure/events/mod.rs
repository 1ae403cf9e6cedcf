pub mod http;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use http::HttpEventSink;
#[cfg(any(test, feature = "test-utils"))]
pub use mock::RecordingEventSink;

use crate::domain::ChainEvent;
use crate::foundation::FlowTxError;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

/// Downstream consumer of blockchain events. `Ok` means the event was accepted.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn forward(&self, event: &ChainEvent) -> Result<(), FlowTxError>;
}

/// Accepts every event after logging it.
pub struct LogEventSink;

#[async_trait]
impl EventSink for LogEventSink {
    async fn forward(&self, event: &ChainEvent) -> Result<(), FlowTxError> {
        info!(
            "event received id={} flow_event_id={} flow_transaction_id={} block_height={}",
            event.id, event.flow_event_id, event.flow_transaction_id, event.block_height
        );
        Ok(())
    }
}

pub fn event_sink_from_url(sink_url: Option<&str>) -> Result<Arc<dyn EventSink>, FlowTxError> {
    match sink_url.map(str::trim).filter(|url| !url.is_empty()) {
        Some(url) => Ok(Arc::new(HttpEventSink::new(url)?)),
        None => Ok(Arc::new(LogEventSink)),
    }
}
