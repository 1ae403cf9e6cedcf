//! Configuration loader using Figment for layered config management.
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. TOML config file
//! 3. Environment variables (`FLOWTX_*` prefix, `__` for nesting)
//! 4. Flat legacy variables (`REDIS_URL`, `KEY_TTL`, ...)

use crate::foundation::FlowTxError;
use crate::infrastructure::config::env::{apply_legacy_env, apply_legacy_env_with};
use crate::infrastructure::config::types::{AppConfig, DEFAULT_API_ADDR, DEFAULT_CONSUMER_GROUP};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use log::{debug, info};
use std::path::Path;

/// Environment variable prefix for config overrides.
///
/// Example: `FLOWTX_LEASE__POOL_SIZE` -> `lease.pool_size`
const ENV_PREFIX: &str = "FLOWTX_";

/// Load configuration from a specific file path, then apply environment overrides.
pub fn load_config_from_file(path: &Path, data_dir: &Path) -> Result<AppConfig, FlowTxError> {
    info!("loading configuration path={} data_dir={}", path.display(), data_dir.display());
    let figment = figment_base(path).merge(Env::prefixed(ENV_PREFIX).split("__"));
    let mut config: AppConfig =
        figment.extract().map_err(|e| FlowTxError::ConfigError(format!("config extraction failed: {e}")))?;
    apply_legacy_env(&mut config)?;
    postprocess(&mut config, data_dir);
    debug!(
        "configuration loaded lease_backend={} lease_store={} pool_size={} key_ttl_secs={} command_topic={} event_topic={} api_enabled={}",
        config.lease.backend,
        redact_url(&config.lease.store_url),
        config.lease.pool_size,
        config.lease.key_ttl_secs,
        config.transport.command_topic,
        config.transport.event_topic,
        config.api.enabled
    );
    Ok(config)
}

/// File-only loading with an explicit legacy-variable source; process environment is not read.
pub fn load_config_isolated<F>(path: &Path, data_dir: &Path, legacy_lookup: F) -> Result<AppConfig, FlowTxError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: AppConfig =
        figment_base(path).extract().map_err(|e| FlowTxError::ConfigError(format!("config extraction failed: {e}")))?;
    apply_legacy_env_with(&mut config, legacy_lookup)?;
    postprocess(&mut config, data_dir);
    Ok(config)
}

fn figment_base(path: &Path) -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));
    if path.exists() {
        figment = figment.merge(Toml::file(path));
    } else {
        debug!("configuration file missing; using defaults and env only path={}", path.display());
    }
    figment
}

fn postprocess(config: &mut AppConfig, data_dir: &Path) {
    if config.service.data_dir.trim().is_empty() {
        config.service.data_dir = data_dir.to_string_lossy().to_string();
    }
    if config.transport.store_url.trim().is_empty() {
        config.transport.store_url = config.lease.store_url.clone();
    }
    if config.transport.consumer_group.trim().is_empty() {
        config.transport.consumer_group = DEFAULT_CONSUMER_GROUP.to_string();
    }
    if config.transport.consumer_name.trim().is_empty() {
        config.transport.consumer_name = default_consumer_name();
    }
    if config.api.addr.trim().is_empty() {
        config.api.addr = DEFAULT_API_ADDR.to_string();
    }
}

fn default_consumer_name() -> String {
    match std::env::var("HOSTNAME") {
        Ok(host) if !host.trim().is_empty() => host.trim().to_string(),
        _ => format!("flowtx-{}", std::process::id()),
    }
}

pub(crate) fn redact_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let (scheme, rest) = url.split_at(scheme_end + 3);
    let Some(at) = rest.find('@') else {
        return url.to_string();
    };
    format!("{scheme}<redacted>@{}", &rest[at + 1..])
}
