use std::io;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    StoreUnavailable,
    PoolExhausted,
    UnknownTransactionKind,
    SubmissionFailed,
    CallbackPublishFailed,
    MalformedMessage,
    EventSinkFailed,
    ConfigError,
    StorageError,
    SerializationError,
    TransportError,
    InvalidStageTransition,
    Message,
}

#[derive(Debug, Error)]
pub enum FlowTxError {
    #[error("lease store unavailable during {operation}: {details}")]
    StoreUnavailable { operation: String, details: String },

    #[error("no free proposer key (pool_size={pool_size})")]
    PoolExhausted { pool_size: u32 },

    #[error("unknown transaction kind: {0}")]
    UnknownTransactionKind(String),

    #[error("transaction submission failed for key_index={key_index}: {details}")]
    SubmissionFailed { key_index: u32, details: String },

    #[error("callback publish to {topic} failed: {details}")]
    CallbackPublishFailed { topic: String, details: String },

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("event sink rejected event {event_id}: {details}")]
    EventSinkFailed { event_id: String, details: String },

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("storage error during {operation}: {details}")]
    StorageError { operation: String, details: String },

    #[error("{format} serialization error: {details}")]
    SerializationError { format: String, details: String },

    #[error("transport error during {operation}: {details}")]
    TransportError { operation: String, details: String },

    #[error("invalid dispatch stage transition: {from} -> {to}")]
    InvalidStageTransition { from: String, to: String },

    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, FlowTxError>;

impl FlowTxError {
    pub fn code(&self) -> ErrorCode {
        match self {
            FlowTxError::StoreUnavailable { .. } => ErrorCode::StoreUnavailable,
            FlowTxError::PoolExhausted { .. } => ErrorCode::PoolExhausted,
            FlowTxError::UnknownTransactionKind(_) => ErrorCode::UnknownTransactionKind,
            FlowTxError::SubmissionFailed { .. } => ErrorCode::SubmissionFailed,
            FlowTxError::CallbackPublishFailed { .. } => ErrorCode::CallbackPublishFailed,
            FlowTxError::MalformedMessage(_) => ErrorCode::MalformedMessage,
            FlowTxError::EventSinkFailed { .. } => ErrorCode::EventSinkFailed,
            FlowTxError::ConfigError(_) => ErrorCode::ConfigError,
            FlowTxError::StorageError { .. } => ErrorCode::StorageError,
            FlowTxError::SerializationError { .. } => ErrorCode::SerializationError,
            FlowTxError::TransportError { .. } => ErrorCode::TransportError,
            FlowTxError::InvalidStageTransition { .. } => ErrorCode::InvalidStageTransition,
            FlowTxError::Message(_) => ErrorCode::Message,
        }
    }

    /// Whether redelivering the originating message may succeed.
    ///
    /// Permanent failures still stay unacknowledged; the transport's dead-letter policy handles them.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FlowTxError::StoreUnavailable { .. }
                | FlowTxError::PoolExhausted { .. }
                | FlowTxError::SubmissionFailed { .. }
                | FlowTxError::EventSinkFailed { .. }
                | FlowTxError::StorageError { .. }
                | FlowTxError::TransportError { .. }
        )
    }

    pub fn store_unavailable(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        FlowTxError::StoreUnavailable { operation: operation.into(), details: err.to_string() }
    }

    pub fn transport(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        FlowTxError::TransportError { operation: operation.into(), details: err.to_string() }
    }
}

impl From<io::Error> for FlowTxError {
    fn from(err: io::Error) -> Self {
        FlowTxError::StorageError { operation: "io".to_string(), details: err.to_string() }
    }
}

impl From<serde_json::Error> for FlowTxError {
    fn from(err: serde_json::Error) -> Self {
        FlowTxError::SerializationError { format: "json".to_string(), details: err.to_string() }
    }
}

impl From<bincode::Error> for FlowTxError {
    fn from(err: bincode::Error) -> Self {
        FlowTxError::SerializationError { format: "bincode".to_string(), details: err.to_string() }
    }
}

impl From<redis::RedisError> for FlowTxError {
    fn from(err: redis::RedisError) -> Self {
        FlowTxError::StoreUnavailable { operation: "redis".to_string(), details: err.to_string() }
    }
}

#[macro_export]
macro_rules! store_err {
    ($op:expr, $err:expr) => {
        $crate::foundation::FlowTxError::StorageError { operation: $op.into(), details: $err.to_string() }
    };
}

#[macro_export]
macro_rules! serde_err {
    ($fmt:expr, $err:expr) => {
        $crate::foundation::FlowTxError::SerializationError { format: $fmt.into(), details: $err.to_string() }
    };
}
