use flowtx_core::application::KeyLeaseManager;
use flowtx_core::foundation::FlowTxError;
use flowtx_core::infrastructure::config::AppConfig;
use flowtx_core::infrastructure::storage::LeaseStore;
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct LeaseReport {
    backend: &'static str,
    pool_size: u32,
    leased: usize,
    slots: Vec<LeaseSlot>,
}

#[derive(Serialize)]
struct LeaseSlot {
    key_index: u32,
    state: Option<String>,
    holder: Option<String>,
    expires_at_nanos: Option<u64>,
}

pub async fn dump_leases(store: Arc<dyn LeaseStore>, app_config: &AppConfig) -> Result<(), FlowTxError> {
    let backend = store.backend_name();
    let leases = KeyLeaseManager::new(store, app_config.lease.pool_size, app_config.lease.key_ttl());
    let slots: Vec<LeaseSlot> = leases
        .snapshot()
        .await?
        .into_iter()
        .map(|(index, lease)| LeaseSlot {
            key_index: index.get(),
            state: lease.as_ref().map(|lease| lease.state.to_string()),
            holder: lease.as_ref().and_then(|lease| lease.holder.as_ref().map(|holder| holder.to_string())),
            expires_at_nanos: lease.as_ref().map(|lease| lease.expires_at_nanos),
        })
        .collect();
    let report = LeaseReport { backend, pool_size: leases.pool().size(), leased: slots.iter().filter(|slot| slot.state.is_some()).count(), slots };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
