/// Main log file, all levels.
pub const LOG_FILE_NAME: &str = "flowtx.log";
/// Warn and error only.
pub const ERR_LOG_FILE_NAME: &str = "flowtx_err.log";

/// `timestamp [LEVEL] message [module] [thread-id]`
pub const LOG_LINE_PATTERN_COLORED: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{h({l:5})}] {m} [{M}] [{I}]{n}";
pub const LOG_LINE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l:5}] {m} [{M}] [{I}]{n}";

/// Rotation threshold per file (50 MB).
pub const LOG_FILE_MAX_SIZE: u64 = 50_000_000;
pub const LOG_FILE_MAX_ROLLS: u32 = 5;

/// Crates logging at the requested level without an explicit `<crate>=<level>` filter.
pub const WHITELISTED_CRATES: &[&str] = &["flowtx_core", "flowtx_service", "flow_transaction_service"];
