use flowtx_core::application::DispatchObserver;
use flowtx_core::domain::{DispatchReceipt, DispatchStage};
use flowtx_core::foundation::{CommandId, ErrorCode, FlowTxError};
use log::debug;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub uptime: Duration,
    pub dispatch_confirmed: u64,
    pub dispatch_no_key: u64,
    pub dispatch_failed: u64,
    pub callbacks_published: u64,
    pub callbacks_failed: u64,
    pub events_forwarded: u64,
    pub events_rejected: u64,
    pub messages_malformed: u64,
}

pub struct Metrics {
    registry: Registry,
    dispatch_total: IntCounterVec,
    callbacks_total: IntCounterVec,
    events_total: IntCounterVec,
    malformed_total: IntCounterVec,
    started_at: Instant,
    dispatch_confirmed: AtomicU64,
    dispatch_no_key: AtomicU64,
    dispatch_failed: AtomicU64,
    callbacks_published: AtomicU64,
    callbacks_failed: AtomicU64,
    events_forwarded: AtomicU64,
    events_rejected: AtomicU64,
    messages_malformed: AtomicU64,
}

fn metrics_err(err: impl std::fmt::Display) -> FlowTxError {
    FlowTxError::Message(format!("metrics: {err}"))
}

impl Metrics {
    pub fn new() -> Result<Self, FlowTxError> {
        debug!("initializing prometheus metrics");
        let registry = Registry::new();
        let dispatch_total =
            IntCounterVec::new(Opts::new("flowtx_dispatch_total", "Command dispatch outcomes by result"), &["result"]).map_err(metrics_err)?;
        let callbacks_total =
            IntCounterVec::new(Opts::new("flowtx_callbacks_total", "Callback publications by status"), &["status"]).map_err(metrics_err)?;
        let events_total =
            IntCounterVec::new(Opts::new("flowtx_events_total", "Chain events by forwarding status"), &["status"]).map_err(metrics_err)?;
        let malformed_total =
            IntCounterVec::new(Opts::new("flowtx_malformed_messages_total", "Unparseable inbound messages by topic kind"), &["kind"])
                .map_err(metrics_err)?;

        registry.register(Box::new(dispatch_total.clone())).map_err(metrics_err)?;
        registry.register(Box::new(callbacks_total.clone())).map_err(metrics_err)?;
        registry.register(Box::new(events_total.clone())).map_err(metrics_err)?;
        registry.register(Box::new(malformed_total.clone())).map_err(metrics_err)?;

        debug!("prometheus metrics registered metric_count=4");
        Ok(Self {
            registry,
            dispatch_total,
            callbacks_total,
            events_total,
            malformed_total,
            started_at: Instant::now(),
            dispatch_confirmed: AtomicU64::new(0),
            dispatch_no_key: AtomicU64::new(0),
            dispatch_failed: AtomicU64::new(0),
            callbacks_published: AtomicU64::new(0),
            callbacks_failed: AtomicU64::new(0),
            events_forwarded: AtomicU64::new(0),
            events_rejected: AtomicU64::new(0),
            messages_malformed: AtomicU64::new(0),
        })
    }

    pub fn inc_dispatch(&self, result: DispatchStage) {
        self.dispatch_total.with_label_values(&[result.as_str()]).inc();
        let counter = match result {
            DispatchStage::Confirmed => &self.dispatch_confirmed,
            DispatchStage::NoKeyAvailable => &self.dispatch_no_key,
            _ => &self.dispatch_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_callback(&self, published: bool) {
        let (label, counter) = if published { ("published", &self.callbacks_published) } else { ("failed", &self.callbacks_failed) };
        self.callbacks_total.with_label_values(&[label]).inc();
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_event(&self, forwarded: bool) {
        let (label, counter) = if forwarded { ("forwarded", &self.events_forwarded) } else { ("rejected", &self.events_rejected) };
        self.events_total.with_label_values(&[label]).inc();
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_malformed(&self, kind: &str) {
        self.malformed_total.with_label_values(&[kind]).inc();
        self.messages_malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime: self.started_at.elapsed(),
            dispatch_confirmed: self.dispatch_confirmed.load(Ordering::Relaxed),
            dispatch_no_key: self.dispatch_no_key.load(Ordering::Relaxed),
            dispatch_failed: self.dispatch_failed.load(Ordering::Relaxed),
            callbacks_published: self.callbacks_published.load(Ordering::Relaxed),
            callbacks_failed: self.callbacks_failed.load(Ordering::Relaxed),
            events_forwarded: self.events_forwarded.load(Ordering::Relaxed),
            events_rejected: self.events_rejected.load(Ordering::Relaxed),
            messages_malformed: self.messages_malformed.load(Ordering::Relaxed),
        }
    }

    pub fn encode(&self) -> Result<String, FlowTxError> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&metric_families, &mut buffer).map_err(metrics_err)?;
        String::from_utf8(buffer).map_err(metrics_err)
    }
}

/// Counts dispatch outcomes.
pub struct MetricsObserver {
    metrics: Arc<Metrics>,
}

impl MetricsObserver {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }
}

impl DispatchObserver for MetricsObserver {
    fn on_confirmed(&self, _receipt: &DispatchReceipt) {
        self.metrics.inc_dispatch(DispatchStage::Confirmed);
    }

    fn on_failed(&self, _command_id: &CommandId, stage: DispatchStage, _code: ErrorCode) {
        self.metrics.inc_dispatch(stage);
    }
}
