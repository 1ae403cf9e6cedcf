use super::EventSink;
use crate::domain::ChainEvent;
use crate::foundation::FlowTxError;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;

/// POSTs each event as JSON; any 2xx accepts it.
pub struct HttpEventSink {
    client: Client,
    url: String,
}

impl HttpEventSink {
    pub fn new(url: &str) -> Result<Self, FlowTxError> {
        let client = Client::builder().build().map_err(|err| FlowTxError::ConfigError(format!("event sink http client: {err}")))?;
        Ok(Self { client, url: url.to_string() })
    }
}

#[async_trait]
impl EventSink for HttpEventSink {
    async fn forward(&self, event: &ChainEvent) -> Result<(), FlowTxError> {
        let failed = |details: String| FlowTxError::EventSinkFailed { event_id: event.id.clone(), details };
        let response = self.client.post(&self.url).json(event).send().await.map_err(|err| failed(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(failed(format!("status {status}: {body}")));
        }
        debug!("event forwarded id={} status={}", event.id, status);
        Ok(())
    }
}
