use crate::domain::ImportMap;
use crate::foundation::{FlowTxError, KeyIndex, TransactionId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A key slot on an account, signable through the KMS. Carries no key material.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningIdentity {
    pub address: String,
    pub key_index: KeyIndex,
    pub kms_resource: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub code: String,
    pub payer: SigningIdentity,
    pub signers: Vec<SigningIdentity>,
    pub proposer: SigningIdentity,
    pub arguments: Vec<Value>,
    pub address_map: ImportMap,
    pub compute_limit: u64,
}

pub trait Authorizer: Send + Sync {
    fn authorize(&self, address: &str, key_index: KeyIndex) -> SigningIdentity;
}

/// Builds, signs and broadcasts a transaction, returning once the network has accepted it.
///
/// Implementations never wait for finality.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    async fn submit(&self, request: TransactionRequest) -> Result<TransactionId, FlowTxError>;
}
