//! JSON-over-HTTP client for the signing gateway.
//!
//! The gateway holds the chain SDK session (access node) and the KMS client. It receives the
//! fully-resolved request, signs with the named KMS key slots and broadcasts without waiting
//! for the transaction to seal.

use super::traits::{TransactionRequest, TransactionSubmitter};
use crate::foundation::{FlowTxError, TransactionId};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

const SUBMIT_PATH: &str = "/v1/transactions";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBody<'a> {
    #[serde(flatten)]
    request: &'a TransactionRequest,
    access_node: &'a str,
    wait: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    transaction_id: String,
}

#[derive(Deserialize)]
struct GatewayErrorBody {
    error: String,
}

pub struct GatewaySubmitter {
    client: Client,
    submit_url: String,
    access_node: String,
}

impl GatewaySubmitter {
    pub fn new(gateway_url: &str, access_node: &str) -> Result<Self, FlowTxError> {
        let client = Client::builder().build().map_err(|err| FlowTxError::ConfigError(format!("gateway http client: {err}")))?;
        Ok(Self::with_client(client, gateway_url, access_node))
    }

    pub fn with_client(client: Client, gateway_url: &str, access_node: &str) -> Self {
        Self {
            client,
            submit_url: format!("{}{SUBMIT_PATH}", gateway_url.trim_end_matches('/')),
            access_node: access_node.to_string(),
        }
    }

    fn failure(request: &TransactionRequest, details: impl Into<String>) -> FlowTxError {
        FlowTxError::SubmissionFailed { key_index: request.proposer.key_index.get(), details: details.into() }
    }
}

#[async_trait]
impl TransactionSubmitter for GatewaySubmitter {
    async fn submit(&self, request: TransactionRequest) -> Result<TransactionId, FlowTxError> {
        debug!(
            "submitting transaction proposer_key={} payer={} compute_limit={} args={}",
            request.proposer.key_index,
            request.payer.address,
            request.compute_limit,
            request.arguments.len()
        );
        let body = SubmitBody { request: &request, access_node: &self.access_node, wait: false };
        let response = self
            .client
            .post(&self.submit_url)
            .json(&body)
            .send()
            .await
            .map_err(|err| Self::failure(&request, format!("gateway request: {err}")))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED && status != StatusCode::ACCEPTED {
            let text = response.text().await.unwrap_or_default();
            let details = serde_json::from_str::<GatewayErrorBody>(&text).map(|body| body.error).unwrap_or(text);
            warn!("gateway rejected transaction status={} proposer_key={} details={}", status, request.proposer.key_index, details);
            return Err(Self::failure(&request, format!("gateway status {status}: {details}")));
        }

        let parsed: SubmitResponse =
            response.json().await.map_err(|err| Self::failure(&request, format!("gateway response body: {err}")))?;
        if parsed.transaction_id.trim().is_empty() {
            return Err(Self::failure(&request, "gateway returned an empty transaction id"));
        }
        Ok(TransactionId::new(parsed.transaction_id))
    }
}
