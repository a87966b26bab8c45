use async_trait::async_trait;
use herald_common::Email;
use uuid::Uuid;

use crate::StoreError;

/// The four operations the dispatch pipeline and query surface need.
#[async_trait]
pub trait EmailRepository: Send + Sync {
    /// Records a sent email and returns its newly generated identifier.
    async fn create_email(&self, email: &Email) -> Result<Uuid, StoreError>;

    async fn find_email_by_id(&self, id: Uuid) -> Result<Email, StoreError>;

    /// Number of stored emails addressed to `to`.
    async fn count_by_receiver(&self, to: &str) -> Result<u64, StoreError>;

    /// Emails addressed to `to`, newest first.
    async fn find_by_receiver(
        &self,
        to: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Email>, StoreError>;
}
