use crate::foundation::FlowTxError;
use crate::infrastructure::config::types::AppConfig;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "FLOWTX_CONFIG_PATH";
pub const DATA_DIR_ENV: &str = "FLOWTX_DATA_DIR";
pub const CONFIG_FILE_NAME: &str = "flowtx-config.toml";

// Flat variables read by existing deployments.
pub const LEGACY_ENVIRONMENT_ENV: &str = "ENVIRONMENT";
pub const LEGACY_PORT_ENV: &str = "PORT";
pub const LEGACY_REDIS_URL_ENV: &str = "REDIS_URL";
pub const LEGACY_KEY_TTL_ENV: &str = "KEY_TTL";
pub const LEGACY_COMMAND_TOPIC_ENV: &str = "COMMAND_TOPIC";
pub const LEGACY_EVENT_TOPIC_ENV: &str = "EVENT_TOPIC";
pub const LEGACY_ACCESS_API_ENV: &str = "FLOW_ACCESS_API_URL";
pub const LEGACY_KMS_RESOURCE_ENV: &str = "GCP_KMS_RESOURCE_NAME";
pub const LEGACY_KEY_COUNT_ENV: &str = "PROPOSER_KEY_COUNT";
pub const LEGACY_ADMIN_ADDRESS_ENV: &str = "ADMIN_ADDRESS";
pub const LEGACY_FUNGIBLE_TOKEN_ENV: &str = "FUNGIBLE_TOKEN_ADDRESS";
pub const LEGACY_FUSD_ENV: &str = "FUSD_TOKEN_ADDRESS";

pub fn resolve_config_path(data_dir: &Path) -> Result<PathBuf, FlowTxError> {
    if let Some(value) = non_empty_env(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(value));
    }
    Ok(data_dir.join(CONFIG_FILE_NAME))
}

pub fn resolve_data_dir() -> Result<PathBuf, FlowTxError> {
    if let Some(data_dir) = non_empty_env(DATA_DIR_ENV) {
        return Ok(PathBuf::from(data_dir));
    }
    let cwd = std::env::current_dir()
        .map_err(|err| FlowTxError::StorageError { operation: "env::current_dir".to_string(), details: err.to_string() })?;
    Ok(cwd.join(".flowtx"))
}

pub fn apply_legacy_env(config: &mut AppConfig) -> Result<(), FlowTxError> {
    apply_legacy_env_with(config, non_empty_env)
}

/// Applies the flat legacy variables on top of `config`, reading them through `lookup`.
pub fn apply_legacy_env_with<F>(config: &mut AppConfig, lookup: F) -> Result<(), FlowTxError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |name: &str| lookup(name).map(|value| value.trim().to_string()).filter(|value| !value.is_empty());

    if let Some(value) = lookup(LEGACY_ENVIRONMENT_ENV) {
        config.service.environment = value;
    }
    if let Some(value) = lookup(LEGACY_PORT_ENV) {
        let port = parse_env::<u16>(LEGACY_PORT_ENV, &value)?;
        config.api.addr = format!("0.0.0.0:{port}");
    }
    if let Some(value) = lookup(LEGACY_REDIS_URL_ENV) {
        config.lease.store_url = value.clone();
        config.transport.store_url = value;
    }
    if let Some(value) = lookup(LEGACY_KEY_TTL_ENV) {
        config.lease.key_ttl_secs = parse_env(LEGACY_KEY_TTL_ENV, &value)?;
    }
    if let Some(value) = lookup(LEGACY_KEY_COUNT_ENV) {
        config.lease.pool_size = parse_env(LEGACY_KEY_COUNT_ENV, &value)?;
    }
    if let Some(value) = lookup(LEGACY_COMMAND_TOPIC_ENV) {
        config.transport.command_topic = value;
    }
    if let Some(value) = lookup(LEGACY_EVENT_TOPIC_ENV) {
        config.transport.event_topic = value;
    }
    if let Some(value) = lookup(LEGACY_ACCESS_API_ENV) {
        config.chain.access_api_url = value;
    }
    if let Some(value) = lookup(LEGACY_ADMIN_ADDRESS_ENV) {
        config.chain.admin_address = value;
    }
    if let Some(value) = lookup(LEGACY_KMS_RESOURCE_ENV) {
        config.kms.resource_name = value;
    }
    if let Some(value) = lookup(LEGACY_FUNGIBLE_TOKEN_ENV) {
        config.contracts.fungible_token_address = value;
    }
    if let Some(value) = lookup(LEGACY_FUSD_ENV) {
        config.contracts.fusd_address = value;
    }
    Ok(())
}

fn parse_env<T>(name: &str, value: &str) -> Result<T, FlowTxError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|err| FlowTxError::ConfigError(format!("{name}='{value}': {err}")))
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
