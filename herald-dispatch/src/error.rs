use herald_broker::BrokerError;
use herald_common::{EmailError, PaginationError};
use herald_store::StoreError;
use thiserror::Error;
use uuid::Uuid;

use crate::MailError;

/// Per-message failures. Each one rejects the delivery without requeue.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Malformed payload: {0}")]
    Deserialization(#[source] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] EmailError),

    #[error("Delivery failed: {0}")]
    Delivery(#[from] MailError),

    /// The email was sent but could not be recorded.
    #[error("Failed to record sent email: {0}")]
    Persistence(#[source] StoreError),

    #[error("Failed to encode email: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("Failed to enqueue email: {0}")]
    Broker(#[from] BrokerError),
}

impl ProcessingError {
    /// Caused by the content of the message rather than by a dependency.
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Deserialization(_) | Self::Validation(_))
    }

    pub const fn is_sent(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Email {0} not found")]
    NotFound(Uuid),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Store(StoreError),
}

impl QueryError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

impl From<PaginationError> for QueryError {
    fn from(err: PaginationError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}
