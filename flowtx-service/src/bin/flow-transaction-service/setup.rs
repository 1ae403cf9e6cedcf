use flowtx_core::foundation::FlowTxError;
use flowtx_core::infrastructure::config::AppConfig;
use flowtx_core::infrastructure::logging::init_logger;
use flowtx_core::infrastructure::storage::{open_lease_store, LeaseStore};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub fn init_logging(log_dir: Option<&Path>, filters: &str) -> Result<(), FlowTxError> {
    let log_dir = log_dir.map(|dir| dir.to_string_lossy().to_string());
    init_logger(log_dir.as_deref(), filters)
}

pub fn load_app_config() -> Result<Arc<AppConfig>, FlowTxError> {
    match flowtx_core::infrastructure::config::load_app_config() {
        Ok(config) => Ok(Arc::new(config)),
        Err(err) => {
            warn!("config rejected error={}", err);
            Err(err)
        }
    }
}

pub async fn init_lease_store(app_config: &AppConfig) -> Result<Arc<dyn LeaseStore>, FlowTxError> {
    let data_dir = PathBuf::from(&app_config.service.data_dir);
    let store = open_lease_store(&app_config.lease, &data_dir).await?;
    store.health_check().await?;
    info!("lease store ready backend={} pool_size={} key_ttl_secs={}", store.backend_name(), app_config.lease.pool_size, app_config.lease.key_ttl_secs);
    Ok(store)
}

pub fn log_startup_banner(app_config: &AppConfig) {
    info!(
        "flow-transaction-service configured environment={} lease_backend={} admin_address={} admin_key_index={} gateway_url={} api_enabled={} api_addr={}",
        app_config.service.environment,
        app_config.lease.backend,
        app_config.chain.admin_address,
        app_config.chain.admin_key_index,
        app_config.chain.gateway_url,
        app_config.api.enabled,
        app_config.api.addr
    );
}
