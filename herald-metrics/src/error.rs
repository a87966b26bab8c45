//! Error types for metrics operations

use thiserror::Error;

/// Errors that can occur during metrics operations
#[derive(Debug, Error)]
pub enum MetricsError {
    /// An instrument could not be created or registered
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// Failed to bind the scrape endpoint
    #[error("Failed to bind metrics server to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The scrape endpoint failed while serving
    #[error("Metrics server error: {0}")]
    Server(#[source] std::io::Error),

    /// The configured scrape path is not a valid route
    #[error("Invalid metrics path `{0}`: must start with '/'")]
    InvalidPath(String),
}

impl MetricsError {
    /// Returns `true` if the error happened before serving started.
    pub const fn is_setup(&self) -> bool {
        matches!(
            self,
            Self::Prometheus(_) | Self::Bind { .. } | Self::InvalidPath(_)
        )
    }
}
