//! Application layer: lease bookkeeping and command dispatch over the infrastructure traits.

pub mod dispatcher;
pub mod lease_manager;
pub mod observer;

pub use dispatcher::{DispatchConfig, TransactionDispatcher};
pub use lease_manager::KeyLeaseManager;
pub use observer::{DispatchObserver, NoopObserver};
#[cfg(any(test, feature = "test-utils"))]
pub use observer::{ObservedDispatch, RecordingObserver};
