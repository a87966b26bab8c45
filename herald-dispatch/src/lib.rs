//! The email use case: the processing pipeline driven by the consumer pool,
//! the enqueue path, and the read-only queries served over RPC.

mod error;
pub mod mailer;
pub mod sanitize;
mod usecase;

pub use error::{ProcessingError, QueryError};
pub use mailer::{MailError, MailTransport, MailerConfig, MemoryMailer, SmtpMailer};
pub use sanitize::sanitize;
pub use usecase::{EmailUseCase, EmailsUseCase};
