mod env;
mod loader;
mod types;
pub mod validation;

pub use env::{
    apply_legacy_env, apply_legacy_env_with, resolve_config_path, resolve_data_dir, CONFIG_FILE_NAME, CONFIG_PATH_ENV, DATA_DIR_ENV,
};
pub use loader::{load_config_from_file, load_config_isolated};
pub use types::*;

use crate::foundation::FlowTxError;

pub fn load_app_config() -> Result<AppConfig, FlowTxError> {
    let data_dir = resolve_data_dir()?;
    let config_path = resolve_config_path(&data_dir)?;
    let config = load_config_from_file(&config_path, &data_dir)?;
    config.validate().map_err(|errors| FlowTxError::ConfigError(format!("validation failed: {:?}", errors)))?;
    Ok(config)
}

pub(crate) use loader::redact_url;
