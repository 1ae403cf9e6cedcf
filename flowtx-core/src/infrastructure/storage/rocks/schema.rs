use crate::foundation::{KeyIndex, TransactionId, PROPOSAL_KEY_PREFIX, TRANSACTION_KEY_PREFIX};

pub const CF_DEFAULT: &str = "default";
pub const CF_METADATA: &str = "metadata";
pub const CF_LEASE: &str = "lease";
pub const CF_HOLDER: &str = "holder";

pub const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";
pub const SCHEMA_VERSION: u32 = 1;

/// Sub-directory of the data dir holding the database.
pub const DB_DIR_NAME: &str = "lease-store";

pub fn lease_key(key_index: KeyIndex) -> Vec<u8> {
    format!("{PROPOSAL_KEY_PREFIX}{key_index}").into_bytes()
}

pub fn holder_key(holder: &TransactionId) -> Vec<u8> {
    format!("{TRANSACTION_KEY_PREFIX}{holder}").into_bytes()
}
