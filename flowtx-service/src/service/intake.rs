//! Generic at-least-once intake: one task per message, bounded concurrency, ack only on success.

use async_trait::async_trait;
use flowtx_core::foundation::FlowTxError;
use flowtx_core::infrastructure::transport::{InboundMessage, Transport};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageDisposition {
    Ack,
    /// Leave unacknowledged so the transport redelivers it.
    Retry,
}

#[async_trait]
pub trait MessageHandler: Send + Sync {
    fn kind(&self) -> &'static str;
    async fn handle(&self, message: &InboundMessage) -> MessageDisposition;
}

/// Consumes `topic` until the subscription ends, `shutdown` flips to `true`, or its sender is dropped.
///
/// In-flight handler tasks are not awaited on shutdown.
pub async fn run_intake_loop(
    transport: Arc<dyn Transport>,
    topic: String,
    handler: Arc<dyn MessageHandler>,
    max_in_flight: usize,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), FlowTxError> {
    let mut subscription = transport.subscribe(&topic).await?;
    let permits = Arc::new(Semaphore::new(max_in_flight.max(1)));
    info!("intake loop started kind={} topic={} max_in_flight={}", handler.kind(), topic, max_in_flight);

    loop {
        if *shutdown.borrow() {
            break;
        }
        // Reading an entry starts its pending-idle clock, so the permit is held before the read.
        let permit = tokio::select! {
            changed = shutdown.changed() => match changed {
                Ok(()) => continue,
                Err(_) => break,
            },
            permit = permits.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };
        let item = tokio::select! {
            changed = shutdown.changed() => match changed {
                Ok(()) => continue,
                Err(_) => break,
            },
            item = subscription.next() => item,
        };
        let Some(item) = item else {
            info!("subscription closed kind={} topic={}", handler.kind(), topic);
            break;
        };
        let message = match item {
            Ok(message) => message,
            Err(err) => {
                warn!("subscription error kind={} topic={} error={}", handler.kind(), topic, err);
                continue;
            }
        };

        debug!(
            "message received kind={} topic={} message_id={} delivery_attempt={}",
            handler.kind(),
            topic,
            message.id,
            message.delivery_attempt
        );
        let transport = transport.clone();
        let handler = handler.clone();
        let topic = topic.clone();
        tokio::spawn(async move {
            let _permit = permit;
            match handler.handle(&message).await {
                MessageDisposition::Ack => {
                    if let Err(err) = transport.ack(&topic, &message.id).await {
                        warn!("ack failed kind={} topic={} message_id={} error={}", handler.kind(), topic, message.id, err);
                    }
                }
                MessageDisposition::Retry => {
                    debug!("message left for redelivery kind={} topic={} message_id={}", handler.kind(), topic, message.id);
                }
            }
        });
    }

    info!("intake loop stopped kind={} topic={}", handler.kind(), topic);
    Ok(())
}
