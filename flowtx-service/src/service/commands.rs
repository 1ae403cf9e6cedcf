use crate::service::intake::{MessageDisposition, MessageHandler};
use crate::service::metrics::Metrics;
use async_trait::async_trait;
use flowtx_core::application::TransactionDispatcher;
use flowtx_core::domain::{Command, CommandCallback, DispatchReceipt};
use flowtx_core::foundation::FlowTxError;
use flowtx_core::infrastructure::transport::{InboundMessage, Transport};
use log::{info, warn};
use std::sync::Arc;

/// Dispatches commands and reports accepted transactions on each command's callback topic.
pub struct CommandHandler {
    dispatcher: Arc<TransactionDispatcher>,
    transport: Arc<dyn Transport>,
    metrics: Arc<Metrics>,
}

impl CommandHandler {
    pub fn new(dispatcher: Arc<TransactionDispatcher>, transport: Arc<dyn Transport>, metrics: Arc<Metrics>) -> Self {
        Self { dispatcher, transport, metrics }
    }

    async fn publish_callback(&self, command: &Command, receipt: &DispatchReceipt) -> Result<(), FlowTxError> {
        let callback = CommandCallback::new(receipt.command_id.clone(), receipt.transaction_id.clone());
        let payload = callback.to_json()?;
        self.transport.publish(&command.callback_topic, &payload).await.map(|_| ()).map_err(|err| FlowTxError::CallbackPublishFailed {
            topic: command.callback_topic.clone(),
            details: err.to_string(),
        })
    }
}

#[async_trait]
impl MessageHandler for CommandHandler {
    fn kind(&self) -> &'static str {
        "command"
    }

    async fn handle(&self, message: &InboundMessage) -> MessageDisposition {
        let command = match Command::from_json(&message.data) {
            Ok(command) => command,
            Err(err) => {
                warn!("malformed command message_id={} error={}", message.id, err);
                self.metrics.inc_malformed(self.kind());
                return MessageDisposition::Retry;
            }
        };

        let receipt = match self.dispatcher.dispatch(&command).await {
            Ok(receipt) => receipt,
            Err(err) => {
                warn!(
                    "command dispatch failed command_id={} message_id={} delivery_attempt={} code={:?} retryable={} error={}",
                    command.id,
                    message.id,
                    message.delivery_attempt,
                    err.code(),
                    err.is_retryable(),
                    err
                );
                return MessageDisposition::Retry;
            }
        };

        // The transaction is already on the network; redelivery would submit it twice.
        match self.publish_callback(&command, &receipt).await {
            Ok(()) => {
                self.metrics.inc_callback(true);
                info!("callback published command_id={} topic={} tx_id={}", command.id, command.callback_topic, receipt.transaction_id);
            }
            Err(err) => {
                self.metrics.inc_callback(false);
                warn!("callback not delivered command_id={} tx_id={} error={}", command.id, receipt.transaction_id, err);
            }
        }
        MessageDisposition::Ack
    }
}
