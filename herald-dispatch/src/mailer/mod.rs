//! Outbound mail transports.

mod config;
mod memory;
mod smtp;

pub use config::{MailerConfig, SmtpConfig, TlsMode, TransportConfig};
pub use memory::MemoryMailer;
pub use smtp::SmtpMailer;

use std::sync::Arc;

use async_trait::async_trait;
use herald_common::Email;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid email address `{address}`: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Smtp(String),
}

impl MailError {
    /// The message itself is unusable; resending it cannot succeed.
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::InvalidAddress { .. } | Self::Build(_))
    }
}

/// Delivers a validated email.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}

/// Builds the transport selected by `config`.
pub fn from_config(config: &MailerConfig) -> Result<Arc<dyn MailTransport>, MailError> {
    match &config.transport {
        TransportConfig::Smtp(smtp) => Ok(Arc::new(SmtpMailer::new(smtp)?)),
        TransportConfig::Memory => Ok(Arc::new(MemoryMailer::new())),
    }
}
