use crate::foundation::FlowTxError;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub fn current_timestamp_nanos_env(env_var: Option<&str>) -> Result<u64, FlowTxError> {
    if let Some(var) = env_var {
        if let Ok(value) = std::env::var(var) {
            return value.parse::<u64>().map_err(|err| FlowTxError::Message(err.to_string()));
        }
    }
    let now = SystemTime::now().duration_since(UNIX_EPOCH).map_err(|err| FlowTxError::Message(err.to_string()))?;
    Ok(now.as_secs().saturating_mul(1_000_000_000).saturating_add(u64::from(now.subsec_nanos())))
}

/// Returns the current wall-clock timestamp in nanoseconds.
///
/// Builds with `test-utils` honour `TEST_NOW_NANOS_ENV_VAR` when set; release builds never read it.
pub fn now_nanos() -> u64 {
    #[cfg(any(test, feature = "test-utils"))]
    if let Ok(now) = current_timestamp_nanos_env(Some(crate::foundation::constants::TEST_NOW_NANOS_ENV_VAR)) {
        return now;
    }
    current_timestamp_nanos_env(None).unwrap_or(0)
}

pub fn duration_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// Milliseconds, rounded up so a sub-millisecond TTL never becomes zero.
pub fn duration_millis_ceil(duration: Duration) -> u64 {
    let nanos = duration_nanos(duration);
    nanos.div_ceil(crate::foundation::constants::NANOS_PER_MILLI).max(1)
}
