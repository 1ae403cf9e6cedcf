use flowtx_core::infrastructure::config::{load_config_isolated, LeaseBackend};
use std::collections::HashMap;
use std::path::PathBuf;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/flowtx-config.toml")
}

#[test]
fn test_config_when_fixture_loaded_then_validates() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = load_config_isolated(&fixture_path(), dir.path(), |_| None).expect("load");

    config.validate().expect("fixture config is valid");
    assert_eq!(config.lease.backend, LeaseBackend::Rocks);
    assert_eq!(config.lease.pool_size, 4);
    assert_eq!(config.chain.admin_key_index, 0);
    assert_eq!(config.chain.compute_limit, 9999);
    assert_eq!(config.transport.consumer_group, "flow-transaction-service");
    assert!(config.events.release_leases_on_event);
    assert!(config.api.enabled);
}

#[test]
fn test_config_when_legacy_vars_set_then_they_override_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let vars: HashMap<&str, &str> =
        [("PROPOSER_KEY_COUNT", "6"), ("KEY_TTL", "240"), ("REDIS_URL", "redis://cache:6380"), ("PORT", "9090")].into_iter().collect();
    let config = load_config_isolated(&fixture_path(), dir.path(), |name| vars.get(name).map(|v| v.to_string())).expect("load");

    assert_eq!(config.lease.pool_size, 6);
    assert_eq!(config.lease.key_ttl_secs, 240);
    assert_eq!(config.lease.store_url, "redis://cache:6380");
    assert_eq!(config.transport.store_url, "redis://cache:6380");
    assert_eq!(config.api.addr, "0.0.0.0:9090");
    config.validate().expect("still valid");
}

#[test]
fn test_config_when_pool_size_zero_then_validation_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = load_config_isolated(&fixture_path(), dir.path(), |_| None).expect("load");
    config.lease.pool_size = 0;

    let errors = config.validate().unwrap_err();
    assert!(errors.iter().any(|e| e.contains("lease.pool_size")), "{errors:?}");
}

#[test]
fn test_config_when_legacy_number_unparseable_then_config_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load_config_isolated(&fixture_path(), dir.path(), |name| (name == "KEY_TTL").then(|| "soon".to_string())).unwrap_err();
    assert_eq!(err.code(), flowtx_core::foundation::ErrorCode::ConfigError);
}

#[test]
fn test_config_when_redelivery_idle_shorter_than_submit_timeout_then_validation_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = load_config_isolated(&fixture_path(), dir.path(), |_| None).expect("load");
    config.chain.submit_timeout_secs = 30;
    config.lease.key_ttl_secs = 180;
    config.transport.redelivery_idle_ms = 1_000;

    let errors = config.validate().unwrap_err();
    assert!(errors.iter().any(|e| e.contains("transport.redelivery_idle_ms")), "{errors:?}");
}
