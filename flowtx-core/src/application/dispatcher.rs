use crate::application::lease_manager::KeyLeaseManager;
use crate::application::observer::{DispatchObserver, NoopObserver};
use crate::domain::{ensure_valid_transition, Command, DispatchReceipt, DispatchStage, ResolvedTemplate, TemplateRegistry};
use crate::foundation::{CommandId, FlowTxError, KeyIndex, TransactionId};
use crate::infrastructure::chain::{Authorizer, TransactionRequest, TransactionSubmitter};
use crate::infrastructure::config::AppConfig;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct DispatchConfig {
    pub admin_address: String,
    pub admin_key_index: KeyIndex,
    pub compute_limit: u64,
    pub submit_timeout: Duration,
}

impl DispatchConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            admin_address: config.chain.admin_address.clone(),
            admin_key_index: KeyIndex::new(config.chain.admin_key_index),
            compute_limit: config.chain.compute_limit,
            submit_timeout: config.chain.submit_timeout(),
        }
    }
}

/// Drives one command from template lookup to an accepted transaction.
///
/// The leased key is the proposer, the admin key pays and authorizes. The dispatcher never retries;
/// every error goes back to the caller, which owns the ack decision.
pub struct TransactionDispatcher {
    leases: Arc<KeyLeaseManager>,
    templates: TemplateRegistry,
    authorizer: Arc<dyn Authorizer>,
    submitter: Arc<dyn TransactionSubmitter>,
    config: DispatchConfig,
    observer: Arc<dyn DispatchObserver>,
}

struct StageTracker<'a> {
    command_id: &'a CommandId,
    stage: DispatchStage,
    observer: &'a dyn DispatchObserver,
}

impl<'a> StageTracker<'a> {
    fn advance(&mut self, to: DispatchStage) -> Result<(), FlowTxError> {
        ensure_valid_transition(self.stage, to)?;
        debug!("dispatch stage command_id={} from={} to={}", self.command_id, self.stage, to);
        self.observer.on_stage_changed(self.command_id, self.stage, to);
        self.stage = to;
        Ok(())
    }

    fn fail(&mut self, to: DispatchStage, err: FlowTxError) -> FlowTxError {
        if let Err(transition_err) = self.advance(to) {
            error!("dispatch stage bookkeeping failed command_id={} error={}", self.command_id, transition_err);
        }
        self.observer.on_failed(self.command_id, self.stage, err.code());
        err
    }
}

impl TransactionDispatcher {
    pub fn new(
        leases: Arc<KeyLeaseManager>,
        templates: TemplateRegistry,
        authorizer: Arc<dyn Authorizer>,
        submitter: Arc<dyn TransactionSubmitter>,
        config: DispatchConfig,
    ) -> Self {
        Self { leases, templates, authorizer, submitter, config, observer: Arc::new(NoopObserver) }
    }

    pub fn with_observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn leases(&self) -> &Arc<KeyLeaseManager> {
        &self.leases
    }

    pub async fn dispatch(&self, command: &Command) -> Result<DispatchReceipt, FlowTxError> {
        let mut stages = StageTracker { command_id: &command.id, stage: DispatchStage::Start, observer: self.observer.as_ref() };

        let template = match self.templates.resolve(&command.kind) {
            Ok(template) => template,
            Err(err) => {
                warn!("unknown transaction kind command_id={} kind={}", command.id, command.kind);
                return Err(stages.fail(DispatchStage::Failed, err));
            }
        };

        let key_index = match self.leases.acquire().await {
            Ok(Some(index)) => index,
            Ok(None) => {
                let err = FlowTxError::PoolExhausted { pool_size: self.leases.pool().size() };
                return Err(stages.fail(DispatchStage::NoKeyAvailable, err));
            }
            Err(err) => {
                error!("lease acquisition failed command_id={} error={}", command.id, err);
                return Err(stages.fail(DispatchStage::Failed, err));
            }
        };
        stages.advance(DispatchStage::KeyAcquired)?;

        let request = self.build_request(&template, key_index, command);
        let transaction_id = match self.submit_bounded(request, key_index).await {
            Ok(transaction_id) => transaction_id,
            Err(err) => {
                warn!("submission failed command_id={} key_index={} error={}", command.id, key_index, err);
                if let Err(release_err) = self.leases.release(key_index).await {
                    error!("lease release after failed submission failed key_index={} error={}", key_index, release_err);
                }
                return Err(stages.fail(DispatchStage::Failed, err));
            }
        };
        stages.advance(DispatchStage::Submitted)?;

        if let Err(err) = self.leases.confirm(key_index, &transaction_id).await {
            error!("lease confirmation failed key_index={} tx_id={} error={}", key_index, transaction_id, err);
        }
        stages.advance(DispatchStage::Confirmed)?;

        let receipt = DispatchReceipt { command_id: command.id.clone(), transaction_id, key_index };
        info!(
            "transaction submitted command_id={} kind={} key_index={} tx_id={}",
            receipt.command_id, template.kind, receipt.key_index, receipt.transaction_id
        );
        self.observer.on_confirmed(&receipt);
        Ok(receipt)
    }

    fn build_request(&self, template: &ResolvedTemplate, key_index: KeyIndex, command: &Command) -> TransactionRequest {
        let admin = self.authorizer.authorize(&self.config.admin_address, self.config.admin_key_index);
        let proposer = self.authorizer.authorize(&self.config.admin_address, key_index);
        TransactionRequest {
            code: template.code.to_string(),
            payer: admin.clone(),
            signers: vec![admin],
            proposer,
            arguments: command.payload.clone(),
            address_map: template.imports.clone(),
            compute_limit: self.config.compute_limit,
        }
    }

    async fn submit_bounded(&self, request: TransactionRequest, key_index: KeyIndex) -> Result<TransactionId, FlowTxError> {
        let timeout = self.config.submit_timeout;
        match tokio::time::timeout(timeout, self.submitter.submit(request)).await {
            Ok(result) => result,
            Err(_) => Err(FlowTxError::SubmissionFailed {
                key_index: key_index.get(),
                details: format!("no acceptance within {}ms", timeout.as_millis()),
            }),
        }
    }
}
