use flowtx_core::application::KeyLeaseManager;
use flowtx_core::domain::LeaseState;
use flowtx_core::foundation::{FlowTxError, TransactionId};
use flowtx_core::infrastructure::storage::MemoryLeaseStore;
use std::sync::Arc;
use std::time::Duration;

const TTL: Duration = Duration::from_secs(120);

fn manager(pool_size: u32) -> (Arc<MemoryLeaseStore>, KeyLeaseManager) {
    let store = Arc::new(MemoryLeaseStore::new());
    (store.clone(), KeyLeaseManager::new(store, pool_size, TTL))
}

#[tokio::test]
async fn test_lease_manager_when_pool_full_then_acquire_returns_none() {
    let (_, leases) = manager(2);
    assert!(leases.acquire().await.unwrap().is_some());
    assert!(leases.acquire().await.unwrap().is_some());
    assert_eq!(leases.acquire().await.unwrap(), None);
}

#[tokio::test]
async fn test_lease_manager_when_confirmed_then_release_by_transaction_frees_key() {
    let (_, leases) = manager(1);
    let index = leases.acquire().await.unwrap().unwrap();
    let tx = TransactionId::from("b7c3a1");
    leases.confirm(index, &tx).await.unwrap();

    let snapshot = leases.snapshot().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    let lease = snapshot[0].1.clone().expect("lease");
    assert_eq!(lease.state, LeaseState::Confirmed);
    assert_eq!(lease.holder, Some(tx.clone()));

    assert_eq!(leases.release_by_transaction(&tx).await.unwrap(), Some(index));
    assert_eq!(leases.acquire().await.unwrap(), Some(index));
}

#[tokio::test]
async fn test_lease_manager_when_unknown_transaction_then_release_is_noop() {
    let (store, leases) = manager(1);
    leases.acquire().await.unwrap().unwrap();
    assert_eq!(leases.release_by_transaction(&TransactionId::from("unknown")).await.unwrap(), None);
    assert_eq!(store.live_lease_count(), 1);
}

#[tokio::test]
async fn test_lease_manager_when_provisional_lease_expires_then_key_returns() {
    let (store, leases) = manager(1);
    let index = leases.acquire().await.unwrap().unwrap();
    assert_eq!(leases.acquire().await.unwrap(), None);

    store.advance(TTL + Duration::from_secs(1));
    assert_eq!(leases.acquire().await.unwrap(), Some(index));
}

#[tokio::test]
async fn test_lease_manager_when_lease_expired_before_confirm_then_confirm_is_not_an_error() {
    let (store, leases) = manager(1);
    let index = leases.acquire().await.unwrap().unwrap();
    store.advance(TTL);

    leases.confirm(index, &TransactionId::from("late")).await.unwrap();
    assert_eq!(store.live_lease_count(), 0);
}

#[tokio::test]
async fn test_lease_manager_when_store_down_then_error_propagates() {
    let (store, leases) = manager(1);
    store.set_unavailable(true);
    let err = leases.acquire().await.unwrap_err();
    assert!(matches!(err, FlowTxError::StoreUnavailable { .. }));
    assert!(err.is_retryable());
}
