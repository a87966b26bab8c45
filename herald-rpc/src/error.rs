use herald_dispatch::{ProcessingError, QueryError};
use thiserror::Error;
use tonic::Status;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Failed to bind RPC server to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to configure RPC listener: {0}")]
    Listener(String),

    #[error("RPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

impl RpcError {
    pub const fn is_setup(&self) -> bool {
        matches!(self, Self::Bind { .. } | Self::Listener(_))
    }
}

pub fn processing_error_to_status(error: &ProcessingError) -> Status {
    match error {
        ProcessingError::Deserialization(_) | ProcessingError::Validation(_) => {
            Status::invalid_argument(error.to_string())
        }
        ProcessingError::Broker(_) | ProcessingError::Delivery(_) => {
            Status::unavailable(error.to_string())
        }
        ProcessingError::Persistence(_) | ProcessingError::Serialization(_) => {
            Status::internal(error.to_string())
        }
    }
}

pub fn query_error_to_status(error: &QueryError) -> Status {
    match error {
        QueryError::NotFound(_) => Status::not_found(error.to_string()),
        QueryError::InvalidArgument(_) => Status::invalid_argument(error.to_string()),
        QueryError::Store(_) => Status::internal("storage failure"),
    }
}
