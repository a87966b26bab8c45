//! The email record carried on the queue, persisted in the store and
//! returned by the query surface.

use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{mime, pagination::PaginationQuery};

pub const MAX_SUBJECT_LEN: usize = 250;
pub const MAX_BODY_LEN: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    /// Assigned by the store. Absent until the email has been persisted.
    #[serde(rename = "emailId", default, skip_serializing_if = "Option::is_none")]
    #[garde(skip)]
    pub id: Option<Uuid>,

    /// Always overwritten from configuration before validation.
    #[serde(default)]
    #[garde(email)]
    pub from: String,

    #[serde(default)]
    #[garde(length(min = 1), inner(email))]
    pub to: Vec<String>,

    #[serde(default)]
    #[garde(length(min = 1, max = 250))]
    pub subject: String,

    #[serde(default)]
    #[garde(length(min = 1, max = 1_048_576))]
    pub body: String,

    #[serde(default)]
    #[garde(custom(supported_content_type))]
    pub content_type: String,

    #[serde(default = "Utc::now")]
    #[garde(skip)]
    pub created_at: DateTime<Utc>,
}

#[allow(clippy::ptr_arg, clippy::trivially_copy_pass_by_ref)]
fn supported_content_type(value: &String, _ctx: &()) -> garde::Result {
    if mime::is_supported_body_type(value) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "unsupported content type `{value}`"
        )))
    }
}

impl Email {
    /// A new, unsent plain-text email with no sender.
    pub fn new(to: Vec<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: None,
            from: String::new(),
            to,
            subject: subject.into(),
            body: body.into(),
            content_type: mime::TEXT_PLAIN.to_owned(),
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Normalises the caller-supplied fields and stamps the trusted sender.
    ///
    /// Whatever `from` arrived on the wire is discarded.
    pub fn prepare(&mut self, sender: &str) {
        sender.clone_into(&mut self.from);

        for recipient in &mut self.to {
            let trimmed = recipient.trim();
            if trimmed.len() != recipient.len() {
                *recipient = trimmed.to_owned();
            }
        }

        let subject = self.subject.trim();
        if subject.len() != self.subject.len() {
            self.subject = subject.to_owned();
        }

        if self.content_type.trim().is_empty() {
            mime::TEXT_PLAIN.clone_into(&mut self.content_type);
        }
    }
}

/// One page of emails for a receiver, with the totals needed to page through
/// the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailsList {
    pub total_count: u64,
    pub total_pages: u64,
    pub page: u32,
    pub size: u32,
    pub has_more: bool,
    pub emails: Vec<Email>,
}

impl EmailsList {
    pub const fn empty(query: PaginationQuery) -> Self {
        Self {
            total_count: 0,
            total_pages: 0,
            page: query.page(),
            size: query.size(),
            has_more: false,
            emails: Vec::new(),
        }
    }

    pub const fn from_page(query: PaginationQuery, total_count: u64, emails: Vec<Email>) -> Self {
        Self {
            total_count,
            total_pages: query.total_pages(total_count),
            page: query.page(),
            size: query.size(),
            has_more: query.has_more(total_count),
            emails,
        }
    }
}
