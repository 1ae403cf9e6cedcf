use super::EventSink;
use crate::domain::ChainEvent;
use crate::foundation::FlowTxError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
pub struct RecordingEventSink {
    accepted: Mutex<Vec<ChainEvent>>,
    rejecting: AtomicBool,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    pub fn accepted(&self) -> Vec<ChainEvent> {
        self.accepted.lock().clone()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn forward(&self, event: &ChainEvent) -> Result<(), FlowTxError> {
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(FlowTxError::EventSinkFailed { event_id: event.id.clone(), details: "sink rejecting".to_string() });
        }
        self.accepted.lock().push(event.clone());
        Ok(())
    }
}
