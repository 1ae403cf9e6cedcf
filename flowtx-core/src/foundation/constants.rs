//! Service-wide constants.

/// Nanoseconds per millisecond (10^6).
pub const NANOS_PER_MILLI: u64 = 1_000_000;

/// Lease store key prefix for primary proposer-key records (`proposal-key:<index>`).
pub const PROPOSAL_KEY_PREFIX: &str = "proposal-key:";

/// Lease store key prefix for holder mappings (`transaction-key:<tx_id>`).
pub const TRANSACTION_KEY_PREFIX: &str = "transaction-key:";

/// Key index of the administrative key that pays for and authorizes every transaction.
pub const DEFAULT_ADMIN_KEY_INDEX: u32 = 0;

/// Default number of proposer keys in the pool.
pub const DEFAULT_PROPOSER_KEY_COUNT: u32 = 10;

/// Default lease TTL in seconds.
///
/// Must exceed the time between acquisition and observed finality.
pub const DEFAULT_KEY_TTL_SECS: u64 = 120;

/// Default compute limit attached to every submitted transaction.
pub const DEFAULT_COMPUTE_LIMIT: u64 = 9999;

/// Default bound on a single submission round-trip.
pub const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 30;

/// Default cap on concurrently dispatched commands per intake loop.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 32;

/// Upper bound on waiting for the single-host lease store lock.
pub const STORAGE_LOCK_TIMEOUT_SECS: u64 = 5;

/// Wall-clock override honoured only by `test-utils` builds.
#[cfg(any(test, feature = "test-utils"))]
pub const TEST_NOW_NANOS_ENV_VAR: &str = "FLOWTX_TEST_NOW_NANOS";
