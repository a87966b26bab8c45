use std::sync::Arc;

use async_trait::async_trait;
use garde::Validate;
use herald_broker::{DeliveryHandler, HandlerError, MessagePublisher};
use herald_common::{
    Email, EmailError, EmailsList, PaginationQuery, internal, mime, outgoing,
};
use herald_store::EmailRepository;
use uuid::Uuid;

use crate::{MailTransport, ProcessingError, QueryError, sanitize};

/// Every entry point of the email service.
#[async_trait]
pub trait EmailsUseCase: Send + Sync {
    /// Runs one queued payload through the pipeline: decode, sanitize, stamp
    /// the sender, validate, send, record. Returns the recorded identifier.
    async fn process(&self, payload: &[u8]) -> Result<Uuid, ProcessingError>;

    /// Sanitizes the body, overwrites the sender and validates in place.
    fn prepare_email(&self, email: &mut Email) -> Result<(), ProcessingError>;

    /// Serializes `email` and hands it to the publisher.
    async fn publish_to_queue(&self, email: &Email) -> Result<(), ProcessingError>;

    async fn find_email_by_id(&self, id: Uuid) -> Result<Email, QueryError>;

    /// One page of emails sent to `to`. Skips the row fetch when nothing
    /// matches.
    async fn find_emails_by_receiver(
        &self,
        to: &str,
        query: PaginationQuery,
    ) -> Result<EmailsList, QueryError>;
}

pub struct EmailUseCase {
    sender: String,
    mailer: Arc<dyn MailTransport>,
    repository: Arc<dyn EmailRepository>,
    publisher: Arc<dyn MessagePublisher>,
}

impl EmailUseCase {
    pub fn new(
        sender: impl Into<String>,
        mailer: Arc<dyn MailTransport>,
        repository: Arc<dyn EmailRepository>,
        publisher: Arc<dyn MessagePublisher>,
    ) -> Self {
        Self {
            sender: sender.into(),
            mailer,
            repository,
            publisher,
        }
    }
}

#[async_trait]
impl EmailsUseCase for EmailUseCase {
    async fn process(&self, payload: &[u8]) -> Result<Uuid, ProcessingError> {
        let mut email: Email =
            serde_json::from_slice(payload).map_err(ProcessingError::Deserialization)?;

        self.prepare_email(&mut email)?;

        self.mailer.send(&email).await?;
        outgoing!(
            level = DEBUG,
            recipients = email.to.len(),
            subject = %email.subject,
            "Email sent"
        );

        let id = self
            .repository
            .create_email(&email)
            .await
            .map_err(ProcessingError::Persistence)?;
        email.id = Some(id);

        internal!(level = INFO, email_id = %id, "Successfully sent email");
        Ok(id)
    }

    fn prepare_email(&self, email: &mut Email) -> Result<(), ProcessingError> {
        email.body = sanitize(&email.body);
        email.prepare(&self.sender);
        email.validate().map_err(EmailError::from)?;

        Ok(())
    }

    async fn publish_to_queue(&self, email: &Email) -> Result<(), ProcessingError> {
        let payload = serde_json::to_vec(email).map_err(ProcessingError::Serialization)?;
        self.publisher
            .publish(&payload, mime::APPLICATION_JSON)
            .await?;

        Ok(())
    }

    async fn find_email_by_id(&self, id: Uuid) -> Result<Email, QueryError> {
        Ok(self.repository.find_email_by_id(id).await?)
    }

    async fn find_emails_by_receiver(
        &self,
        to: &str,
        query: PaginationQuery,
    ) -> Result<EmailsList, QueryError> {
        let to = to.trim();
        if to.is_empty() {
            return Err(QueryError::InvalidArgument(
                "receiver email must not be empty".to_string(),
            ));
        }

        let total_count = self.repository.count_by_receiver(to).await?;
        if total_count == 0 {
            return Ok(EmailsList::empty(query));
        }

        let emails = self
            .repository
            .find_by_receiver(to, query.offset(), query.limit())
            .await?;

        Ok(EmailsList::from_page(query, total_count, emails))
    }
}

#[async_trait]
impl DeliveryHandler for EmailUseCase {
    async fn handle(&self, payload: &[u8]) -> Result<(), HandlerError> {
        match self.process(payload).await {
            Ok(_) => Ok(()),
            Err(err) => {
                match &err {
                    err if err.is_client_error() => {
                        tracing::warn!(error = %err, "Dropping invalid email");
                    }
                    err if err.is_sent() => {
                        tracing::error!(error = %err, "Email was sent but not recorded");
                    }
                    ProcessingError::Delivery(mail) if mail.is_permanent() => {
                        tracing::warn!(error = %mail, "Email refused by relay");
                    }
                    err => tracing::error!(error = %err, "Email processing failed"),
                }

                Err(err.into())
            }
        }
    }
}
