use std::sync::Arc;

use herald_common::{Email, PaginationQuery, incoming, mime};
use herald_dispatch::EmailsUseCase;
use tonic::{Request, Response, Status};
use uuid::Uuid;

use crate::{
    processing_error_to_status,
    proto::{
        self, EmailService, FindEmailByIdRequest, FindEmailByIdResponse,
        FindEmailsByReceiverRequest, FindEmailsByReceiverResponse, SendEmailsRequest,
        SendEmailsResponse,
    },
    query_error_to_status,
};

pub struct EmailServiceHandler {
    usecase: Arc<dyn EmailsUseCase>,
    enqueue: bool,
}

impl EmailServiceHandler {
    /// With `enqueue` unset, `SendEmails` only validates its input.
    pub fn new(usecase: Arc<dyn EmailsUseCase>, enqueue: bool) -> Self {
        Self { usecase, enqueue }
    }
}

#[tonic::async_trait]
impl EmailService for EmailServiceHandler {
    async fn send_emails(
        &self,
        request: Request<SendEmailsRequest>,
    ) -> Result<Response<SendEmailsResponse>, Status> {
        let request = request.into_inner();
        incoming!(recipients = request.to.len(), "SendEmails");

        let content_type = if request.content_type.trim().is_empty() {
            mime::TEXT_PLAIN.to_string()
        } else {
            request.content_type
        };
        let mut email =
            Email::new(request.to, request.subject, request.body).with_content_type(content_type);

        self.usecase.prepare_email(&mut email).map_err(|err| {
            tracing::warn!(error = %err, "SendEmails rejected");
            processing_error_to_status(&err)
        })?;

        if self.enqueue {
            self.usecase.publish_to_queue(&email).await.map_err(|err| {
                tracing::error!(error = %err, "SendEmails failed to enqueue");
                processing_error_to_status(&err)
            })?;
        }

        Ok(Response::new(SendEmailsResponse {
            status: "Ok".to_string(),
        }))
    }

    async fn find_email_by_id(
        &self,
        request: Request<FindEmailByIdRequest>,
    ) -> Result<Response<FindEmailByIdResponse>, Status> {
        let request = request.into_inner();

        let id = Uuid::parse_str(request.email_uuid.trim()).map_err(|err| {
            Status::invalid_argument(format!("invalid email uuid `{}`: {err}", request.email_uuid))
        })?;

        let email = self
            .usecase
            .find_email_by_id(id)
            .await
            .map_err(|err| query_error_to_status(&err))?;

        Ok(Response::new(FindEmailByIdResponse {
            email: Some(proto::Email::from(email)),
        }))
    }

    async fn find_emails_by_receiver(
        &self,
        request: Request<FindEmailsByReceiverRequest>,
    ) -> Result<Response<FindEmailsByReceiverResponse>, Status> {
        let request = request.into_inner();

        let query = PaginationQuery::from_signed(request.page, request.size)
            .map_err(|err| Status::invalid_argument(err.to_string()))?;

        let list = self
            .usecase
            .find_emails_by_receiver(&request.receiver_email, query)
            .await
            .map_err(|err| {
                if !err.is_not_found() {
                    tracing::error!(error = %err, "FindEmailsByReceiver failed");
                }
                query_error_to_status(&err)
            })?;

        Ok(Response::new(list.into()))
    }
}
