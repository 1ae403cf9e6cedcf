use crate::service::commands::CommandHandler;
use crate::service::events::EventHandler;
use crate::service::intake::run_intake_loop;
use crate::service::metrics::{Metrics, MetricsObserver};
use flowtx_core::application::{DispatchConfig, KeyLeaseManager, TransactionDispatcher};
use flowtx_core::domain::{import_map, TemplateRegistry};
use flowtx_core::foundation::FlowTxError;
use flowtx_core::infrastructure::chain::{Authorizer, GatewaySubmitter, KmsAuthorizer, TransactionSubmitter};
use flowtx_core::infrastructure::config::AppConfig;
use flowtx_core::infrastructure::events::{event_sink_from_url, EventSink};
use flowtx_core::infrastructure::storage::LeaseStore;
use flowtx_core::infrastructure::transport::{RedisStreamsTransport, StreamSettings, Transport};
use log::info;
use std::sync::Arc;
use tokio::sync::watch;

/// Wires the lease store, transport and chain client into the two intake loops.
pub struct ServiceFlow {
    config: Arc<AppConfig>,
    transport: Arc<dyn Transport>,
    leases: Arc<KeyLeaseManager>,
    dispatcher: Arc<TransactionDispatcher>,
    event_sink: Arc<dyn EventSink>,
    metrics: Arc<Metrics>,
}

impl ServiceFlow {
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn LeaseStore>,
        transport: Arc<dyn Transport>,
        authorizer: Arc<dyn Authorizer>,
        submitter: Arc<dyn TransactionSubmitter>,
        event_sink: Arc<dyn EventSink>,
    ) -> Result<Self, FlowTxError> {
        let metrics = Arc::new(Metrics::new()?);
        let leases = Arc::new(KeyLeaseManager::new(store, config.lease.pool_size, config.lease.key_ttl()));
        let templates = TemplateRegistry::new(import_map(&config.contracts.fungible_token_address, &config.contracts.fusd_address));
        let dispatcher = TransactionDispatcher::new(leases.clone(), templates, authorizer, submitter, DispatchConfig::from_app_config(&config))
            .with_observer(Arc::new(MetricsObserver::new(metrics.clone())));
        Ok(Self { config, transport, leases, dispatcher: Arc::new(dispatcher), event_sink, metrics })
    }

    /// Production wiring: Redis Streams transport, signing gateway, KMS-bound identities.
    pub async fn from_config(config: Arc<AppConfig>, store: Arc<dyn LeaseStore>) -> Result<Self, FlowTxError> {
        let transport =
            RedisStreamsTransport::connect(&config.transport.store_url, StreamSettings::from(&config.transport)).await?;
        let authorizer = KmsAuthorizer::new(config.kms.resource_name.clone());
        let submitter = GatewaySubmitter::new(&config.chain.gateway_url, &config.chain.access_api_url)?;
        let event_sink = event_sink_from_url(config.events.sink_url.as_deref())?;
        Self::new(config, store, Arc::new(transport), Arc::new(authorizer), Arc::new(submitter), event_sink)
    }

    pub fn command_handler(&self) -> CommandHandler {
        CommandHandler::new(self.dispatcher.clone(), self.transport.clone(), self.metrics.clone())
    }

    pub fn event_handler(&self) -> EventHandler {
        let handler = EventHandler::new(self.event_sink.clone(), self.metrics.clone());
        if self.config.events.release_leases_on_event {
            handler.with_lease_release(self.leases.clone())
        } else {
            handler
        }
    }

    /// Runs the command and event loops side by side until `shutdown` fires.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<(), FlowTxError> {
        let transport_config = &self.config.transport;
        info!(
            "service flow starting command_topic={} event_topic={} pool_size={} release_leases_on_event={}",
            transport_config.command_topic,
            transport_config.event_topic,
            self.leases.pool().size(),
            self.config.events.release_leases_on_event
        );
        let commands = run_intake_loop(
            self.transport.clone(),
            transport_config.command_topic.clone(),
            Arc::new(self.command_handler()),
            transport_config.max_in_flight,
            shutdown.clone(),
        );
        let events = run_intake_loop(
            self.transport.clone(),
            transport_config.event_topic.clone(),
            Arc::new(self.event_handler()),
            transport_config.max_in_flight,
            shutdown,
        );
        tokio::try_join!(commands, events)?;
        Ok(())
    }

    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    pub fn leases(&self) -> Arc<KeyLeaseManager> {
        self.leases.clone()
    }

    pub fn dispatcher(&self) -> Arc<TransactionDispatcher> {
        self.dispatcher.clone()
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }
}
