use crate::service::metrics::Metrics;
use flowtx_core::infrastructure::storage::LeaseStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct ApiState {
    pub lease_store: Arc<dyn LeaseStore>,
    pub metrics: Arc<Metrics>,
}
