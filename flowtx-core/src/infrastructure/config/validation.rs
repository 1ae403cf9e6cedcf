use crate::infrastructure::config::types::{AppConfig, LeaseBackend};

/// Headroom between the submission bound and the redelivery idle time for the wait on an intake permit.
pub const REDELIVERY_MARGIN_MS: u64 = 5_000;

impl AppConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.lease.pool_size == 0 {
            errors.push("lease.pool_size must be > 0".to_string());
        }
        if self.lease.key_ttl_secs == 0 {
            errors.push("lease.key_ttl_secs must be > 0".to_string());
        }
        if self.lease.backend == LeaseBackend::Redis && self.lease.store_url.trim().is_empty() {
            errors.push("lease.store_url is required when lease.backend=redis".to_string());
        }
        if self.lease.backend == LeaseBackend::Rocks && self.service.data_dir.trim().is_empty() {
            errors.push("service.data_dir is required when lease.backend=rocks".to_string());
        }

        if self.chain.submit_timeout_secs == 0 {
            errors.push("chain.submit_timeout_secs must be > 0".to_string());
        }
        // A lease that can expire while its submission is still pending would let a second command reuse the key.
        if self.lease.key_ttl_secs > 0 && self.lease.key_ttl_secs <= self.chain.submit_timeout_secs {
            errors.push(format!(
                "lease.key_ttl_secs ({}) must exceed chain.submit_timeout_secs ({})",
                self.lease.key_ttl_secs, self.chain.submit_timeout_secs
            ));
        }
        if self.chain.admin_address.trim().is_empty() {
            errors.push("chain.admin_address is required".to_string());
        }
        if self.chain.gateway_url.trim().is_empty() {
            errors.push("chain.gateway_url is required".to_string());
        }
        if self.chain.compute_limit == 0 {
            errors.push("chain.compute_limit must be > 0".to_string());
        }
        if self.chain.admin_key_index >= 1 && self.chain.admin_key_index <= self.lease.pool_size {
            errors.push(format!(
                "chain.admin_key_index ({}) must not overlap the proposer pool 1..={}",
                self.chain.admin_key_index, self.lease.pool_size
            ));
        }

        if self.kms.resource_name.trim().is_empty() {
            errors.push("kms.resource_name is required".to_string());
        }

        if self.transport.command_topic.trim().is_empty() {
            errors.push("transport.command_topic is required".to_string());
        }
        if self.transport.event_topic.trim().is_empty() {
            errors.push("transport.event_topic is required".to_string());
        }
        if self.transport.store_url.trim().is_empty() {
            errors.push("transport.store_url is required".to_string());
        }
        if self.transport.max_in_flight == 0 {
            errors.push("transport.max_in_flight must be > 0".to_string());
        }
        if self.transport.redelivery_idle_ms == 0 {
            errors.push("transport.redelivery_idle_ms must be > 0".to_string());
        }
        let min_idle_ms = self.chain.submit_timeout_secs.saturating_mul(1_000).saturating_add(REDELIVERY_MARGIN_MS);
        if self.transport.redelivery_idle_ms > 0 && self.transport.redelivery_idle_ms <= min_idle_ms {
            errors.push(format!(
                "transport.redelivery_idle_ms ({}) must exceed chain.submit_timeout_secs * 1000 + {} ({})",
                self.transport.redelivery_idle_ms, REDELIVERY_MARGIN_MS, min_idle_ms
            ));
        }

        if self.contracts.fungible_token_address.trim().is_empty() {
            errors.push("contracts.fungible_token_address is required".to_string());
        }
        if self.contracts.fusd_address.trim().is_empty() {
            errors.push("contracts.fusd_address is required".to_string());
        }

        if let Some(url) = self.events.sink_url.as_deref() {
            let url = url.trim();
            if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
                errors.push(format!("events.sink_url must be an http(s) URL: {url}"));
            }
        }

        if self.api.enabled && self.api.addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!("api.addr is not a socket address: {}", self.api.addr));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
