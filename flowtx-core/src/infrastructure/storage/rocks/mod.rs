//! Single-host persistent lease store. See `engine.rs` for lock semantics.

pub mod engine;
pub mod schema;

pub use engine::RocksLeaseStore;
