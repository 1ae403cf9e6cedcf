#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod redis_streams;
pub mod traits;

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockTransport;
pub use redis_streams::{RedisStreamsTransport, StreamSettings};
pub use traits::{InboundMessage, Transport, TransportSubscription};
