use flowtx_core::domain::LeaseState;
use flowtx_core::foundation::{KeyIndex, TransactionId};
use flowtx_core::infrastructure::storage::{LeaseStore, MemoryLeaseStore, RedisLeaseStore, RocksLeaseStore};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const TTL: Duration = Duration::from_secs(60);

async fn assert_distinct_until_exhausted(store: Arc<dyn LeaseStore>, pool_size: u32) {
    let mut handles = Vec::new();
    for _ in 0..pool_size {
        let store = store.clone();
        handles.push(tokio::spawn(async move { store.try_acquire_first_free(pool_size, TTL).await }));
    }
    let mut seen = HashSet::new();
    for handle in handles {
        let index = handle.await.expect("join").expect("acquire").expect("free key");
        assert!((1..=pool_size).contains(&index.get()));
        assert!(seen.insert(index), "key {index} leased twice");
    }
    assert_eq!(store.try_acquire_first_free(pool_size, TTL).await.expect("acquire"), None);
}

async fn assert_release_frees_key(store: Arc<dyn LeaseStore>) {
    let first = store.try_acquire_first_free(2, TTL).await.unwrap().unwrap();
    let second = store.try_acquire_first_free(2, TTL).await.unwrap().unwrap();
    assert_eq!((first.get(), second.get()), (1, 2));

    store.release(first).await.unwrap();
    assert_eq!(store.try_acquire_first_free(2, TTL).await.unwrap(), Some(first));
}

async fn assert_two_stage_lease(store: Arc<dyn LeaseStore>) {
    let index = store.try_acquire_first_free(1, TTL).await.unwrap().unwrap();
    let lease = store.get_lease(index).await.unwrap().expect("lease");
    assert_eq!(lease.state, LeaseState::Provisional);
    assert_eq!(lease.holder, None);

    let tx = TransactionId::from("4f1c0e");
    assert!(store.bind_holder(&tx, index, TTL).await.unwrap());
    let lease = store.get_lease(index).await.unwrap().expect("lease");
    assert_eq!(lease.state, LeaseState::Confirmed);
    assert_eq!(lease.holder, Some(tx.clone()));

    assert_eq!(store.release_by_holder(&tx).await.unwrap(), Some(index));
    assert_eq!(store.get_lease(index).await.unwrap(), None);
    assert_eq!(store.release_by_holder(&tx).await.unwrap(), None);
    assert_eq!(store.release_by_holder(&TransactionId::from("never-seen")).await.unwrap(), None);
}

async fn assert_bind_requires_live_lease(store: Arc<dyn LeaseStore>) {
    let tx = TransactionId::from("orphan");
    assert!(!store.bind_holder(&tx, KeyIndex::new(1), TTL).await.unwrap());
    assert_eq!(store.release_by_holder(&tx).await.unwrap(), None);
}

#[tokio::test]
async fn memory_store_leases_are_distinct_until_exhausted() {
    assert_distinct_until_exhausted(Arc::new(MemoryLeaseStore::new()), 8).await;
}

#[tokio::test]
async fn memory_store_release_and_holder_contract() {
    assert_release_frees_key(Arc::new(MemoryLeaseStore::new())).await;
    assert_two_stage_lease(Arc::new(MemoryLeaseStore::new())).await;
    assert_bind_requires_live_lease(Arc::new(MemoryLeaseStore::new())).await;
}

#[tokio::test]
async fn memory_store_expired_key_is_reacquirable() {
    let store = MemoryLeaseStore::new();
    let index = store.try_acquire_first_free(1, TTL).await.unwrap().unwrap();
    assert_eq!(store.try_acquire_first_free(1, TTL).await.unwrap(), None);

    store.advance(TTL);
    assert_eq!(store.get_lease(index).await.unwrap(), None);
    assert_eq!(store.try_acquire_first_free(1, TTL).await.unwrap(), Some(index));
    assert_eq!(store.live_lease_count(), 1);
}

#[tokio::test]
async fn rocks_store_honours_lease_contract() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store: Arc<dyn LeaseStore> = Arc::new(RocksLeaseStore::open_in_dir(dir.path()).expect("open rocks"));
    assert_eq!(store.backend_name(), "rocks");
    store.health_check().await.expect("health");

    assert_distinct_until_exhausted(store.clone(), 4).await;
    for index in 1..=4 {
        store.release(KeyIndex::new(index)).await.unwrap();
    }
    assert_release_frees_key(store.clone()).await;
    for index in 1..=2 {
        store.release(KeyIndex::new(index)).await.unwrap();
    }
    assert_two_stage_lease(store.clone()).await;
    assert_bind_requires_live_lease(store).await;
}

#[tokio::test]
async fn rocks_store_expired_key_is_reacquirable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = RocksLeaseStore::open_in_dir(dir.path()).expect("open rocks");
    let ttl = Duration::from_millis(50);

    let index = store.try_acquire_first_free(1, ttl).await.unwrap().unwrap();
    assert_eq!(store.try_acquire_first_free(1, ttl).await.unwrap(), None);

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(store.try_acquire_first_free(1, ttl).await.unwrap(), Some(index));
}

#[tokio::test]
async fn rocks_store_prunes_holder_bindings_of_expired_leases() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = RocksLeaseStore::open_in_dir(dir.path()).expect("open rocks");
    let ttl = Duration::from_millis(200);

    for round in 0..5 {
        let index = store.try_acquire_first_free(1, ttl).await.unwrap().expect("expired key is free again");
        let tx = TransactionId::from(format!("tx-{round}"));
        assert!(store.bind_holder(&tx, index, ttl).await.unwrap());
        assert_eq!(store.holder_count().unwrap(), 1);
        tokio::time::sleep(ttl + Duration::from_millis(50)).await;
    }

    store.release(KeyIndex::new(1)).await.unwrap();
    assert_eq!(store.holder_count().unwrap(), 0);
}

#[tokio::test]
async fn rocks_store_keeps_leases_across_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let index = {
        let store = RocksLeaseStore::open_in_dir(dir.path()).expect("open rocks");
        store.try_acquire_first_free(3, TTL).await.unwrap().unwrap()
    };
    let store = RocksLeaseStore::open_in_dir(dir.path()).expect("reopen rocks");
    assert_eq!(store.get_lease(index).await.unwrap().map(|lease| lease.state), Some(LeaseState::Provisional));
    assert_eq!(store.try_acquire_first_free(3, TTL).await.unwrap().map(|index| index.get()), Some(2));
}

#[tokio::test]
#[ignore = "requires FLOWTX_TEST_REDIS_URL pointing at a disposable Redis"]
async fn redis_store_honours_lease_contract() {
    let Ok(url) = std::env::var("FLOWTX_TEST_REDIS_URL") else {
        return;
    };
    let store: Arc<dyn LeaseStore> = Arc::new(RedisLeaseStore::connect(&url).await.expect("connect redis"));
    store.health_check().await.expect("ping");
    for index in 1..=4 {
        store.release(KeyIndex::new(index)).await.unwrap();
    }

    assert_distinct_until_exhausted(store.clone(), 4).await;
    for index in 1..=4 {
        store.release(KeyIndex::new(index)).await.unwrap();
    }
    assert_release_frees_key(store.clone()).await;
    for index in 1..=2 {
        store.release(KeyIndex::new(index)).await.unwrap();
    }
    assert_two_stage_lease(store.clone()).await;
    assert_bind_requires_live_lease(store).await;
}
