use crate::foundation::{CommandId, FlowTxError, TransactionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transaction command as delivered by the command topic.
///
/// `kind` stays a raw string here: an unrecognised kind is a dispatch failure, not a parse failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub id: CommandId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "callbackTopic")]
    pub callback_topic: String,
    #[serde(default)]
    pub payload: Vec<Value>,
}

impl Command {
    pub fn from_json(data: &[u8]) -> Result<Self, FlowTxError> {
        let command: Command =
            serde_json::from_slice(data).map_err(|err| FlowTxError::MalformedMessage(format!("command json: {err}")))?;
        if command.id.trim().is_empty() {
            return Err(FlowTxError::MalformedMessage("command id is empty".to_string()));
        }
        if command.callback_topic.trim().is_empty() {
            return Err(FlowTxError::MalformedMessage(format!("command {} has empty callbackTopic", command.id)));
        }
        Ok(command)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandCallback {
    pub command_id: CommandId,
    pub blockchain_tx_id: TransactionId,
}

impl CommandCallback {
    pub fn new(command_id: CommandId, blockchain_tx_id: TransactionId) -> Self {
        Self { command_id, blockchain_tx_id }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, FlowTxError> {
        Ok(serde_json::to_vec(self)?)
    }
}
