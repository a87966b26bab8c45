//! Wire messages and the generated `EmailService` server and client.
//!
//! Messages use the standard protobuf encoding, declared directly with prost.

use chrono::{DateTime, Utc};

#[derive(Clone, PartialEq, prost::Message)]
pub struct Email {
    #[prost(string, tag = "1")]
    pub email_id: String,
    #[prost(string, repeated, tag = "2")]
    pub to: Vec<String>,
    #[prost(string, tag = "3")]
    pub from: String,
    #[prost(string, tag = "4")]
    pub body: String,
    #[prost(string, tag = "5")]
    pub subject: String,
    #[prost(string, tag = "6")]
    pub content_type: String,
    #[prost(message, optional, tag = "7")]
    pub created_at: Option<prost_types::Timestamp>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SendEmailsRequest {
    #[prost(string, repeated, tag = "1")]
    pub to: Vec<String>,
    #[prost(string, tag = "2")]
    pub body: String,
    #[prost(string, tag = "3")]
    pub subject: String,
    /// Empty means `text/plain`.
    #[prost(string, tag = "4")]
    pub content_type: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SendEmailsResponse {
    #[prost(string, tag = "1")]
    pub status: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct FindEmailByIdRequest {
    #[prost(string, tag = "1")]
    pub email_uuid: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct FindEmailByIdResponse {
    #[prost(message, optional, tag = "1")]
    pub email: Option<Email>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct FindEmailsByReceiverRequest {
    #[prost(string, tag = "1")]
    pub receiver_email: String,
    #[prost(int64, tag = "2")]
    pub page: i64,
    #[prost(int64, tag = "3")]
    pub size: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct FindEmailsByReceiverResponse {
    #[prost(message, repeated, tag = "1")]
    pub emails: Vec<Email>,
    #[prost(uint64, tag = "2")]
    pub total_pages: u64,
    #[prost(uint64, tag = "3")]
    pub total_count: u64,
    #[prost(bool, tag = "4")]
    pub has_more: bool,
    #[prost(int64, tag = "5")]
    pub page: i64,
    #[prost(int64, tag = "6")]
    pub size: i64,
}

include!(concat!(env!("OUT_DIR"), "/email_service.EmailService.rs"));

pub use email_service_client::EmailServiceClient;
pub use email_service_server::{EmailService, EmailServiceServer};

pub fn timestamp(at: DateTime<Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: at.timestamp(),
        nanos: i32::try_from(at.timestamp_subsec_nanos()).unwrap_or_default(),
    }
}

/// `None` if the timestamp is out of range.
pub fn datetime(timestamp: &prost_types::Timestamp) -> Option<DateTime<Utc>> {
    let nanos = u32::try_from(timestamp.nanos).ok()?;
    DateTime::from_timestamp(timestamp.seconds, nanos)
}

impl From<herald_common::Email> for Email {
    fn from(email: herald_common::Email) -> Self {
        Self {
            email_id: email.id.map(|id| id.to_string()).unwrap_or_default(),
            to: email.to,
            from: email.from,
            body: email.body,
            subject: email.subject,
            content_type: email.content_type,
            created_at: Some(timestamp(email.created_at)),
        }
    }
}

impl From<herald_common::EmailsList> for FindEmailsByReceiverResponse {
    fn from(list: herald_common::EmailsList) -> Self {
        Self {
            emails: list.emails.into_iter().map(Email::from).collect(),
            total_pages: list.total_pages,
            total_count: list.total_count,
            has_more: list.has_more,
            page: i64::from(list.page),
            size: i64::from(list.size),
        }
    }
}
