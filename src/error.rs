use thiserror::Error;

use crate::domain::{OrderId, OrderStatus};

/// Errors raised by a [`KeyValueStore`](crate::storage::KeyValueStore) backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Corrupt value under key {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(OrderId),
    #[error("Order {id} cannot move from {from} via {requested}")]
    InvalidTransition {
        id: OrderId,
        from: OrderStatus,
        requested: String,
    },
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
    #[error("Order validation error: {0}")]
    ValidationError(String),
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<StorageError> for OrderError {
    fn from(err: StorageError) -> Self {
        OrderError::StorageUnavailable(err.to_string())
    }
}

/// Errors raised while reading [`AdminConfig`](crate::app_system::AdminConfig).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}
