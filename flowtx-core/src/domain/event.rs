use crate::foundation::{FlowTxError, TransactionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Blockchain event notification, forwarded as-is to the event sink.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainEvent {
    pub id: String,
    pub graffle_project_id: String,
    pub graffle_company_id: String,
    pub flow_event_id: String,
    pub graffle_event_token: String,
    pub block_height: u64,
    pub event_date: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<Value>,
    pub block_event_data: Value,
    pub web_hook: String,
    pub flow_block_id: String,
    pub flow_transaction_id: String,
    pub transaction_index: u32,
    pub event_index: u32,
    pub collection_id: String,
    pub graffle_web_hook_data_id: String,
}

impl ChainEvent {
    pub fn from_json(data: &[u8]) -> Result<Self, FlowTxError> {
        serde_json::from_slice(data).map_err(|err| FlowTxError::MalformedMessage(format!("event json: {err}")))
    }

    pub fn transaction_id(&self) -> Option<TransactionId> {
        let trimmed = self.flow_transaction_id.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(TransactionId::from(trimmed))
        }
    }
}
