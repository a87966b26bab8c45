use std::sync::{
    Arc, RwLock,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use herald_common::Email;
use uuid::Uuid;

use crate::{EmailRepository, StoreError};

/// In-memory repository
///
/// Stores emails in insertion order behind an `RwLock`. Intended for tests and
/// local development. Tracks how many times each operation ran so callers can
/// assert on round trips. Writes can be switched to fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryEmailRepository {
    emails: Arc<RwLock<Vec<Email>>>,
    creates: Arc<AtomicUsize>,
    counts: Arc<AtomicUsize>,
    row_fetches: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryEmailRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository whose every `create_email` fails.
    pub fn failing() -> Self {
        let repository = Self::default();
        repository.set_failing(true);
        repository
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Everything stored so far, oldest first.
    pub fn emails(&self) -> Vec<Email> {
        self.emails.read().map(|emails| emails.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.emails.read().map(|emails| emails.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::Relaxed)
    }

    pub fn counts(&self) -> usize {
        self.counts.load(Ordering::Relaxed)
    }

    /// Row-returning queries issued: lookups by id and by receiver.
    pub fn row_fetches(&self) -> usize {
        self.row_fetches.load(Ordering::Relaxed)
    }

    fn poisoned() -> StoreError {
        StoreError::Internal("memory store lock poisoned".to_string())
    }
}

#[async_trait]
impl EmailRepository for MemoryEmailRepository {
    async fn create_email(&self, email: &Email) -> Result<Uuid, StoreError> {
        self.creates.fetch_add(1, Ordering::Relaxed);

        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Internal("store unavailable".to_string()));
        }

        let id = Uuid::new_v4();
        let mut stored = email.clone();
        stored.id = Some(id);
        stored.created_at = Utc::now();

        self.emails.write().map_err(|_| Self::poisoned())?.push(stored);
        Ok(id)
    }

    async fn find_email_by_id(&self, id: Uuid) -> Result<Email, StoreError> {
        self.row_fetches.fetch_add(1, Ordering::Relaxed);

        self.emails
            .read()
            .map_err(|_| Self::poisoned())?
            .iter()
            .find(|email| email.id == Some(id))
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn count_by_receiver(&self, to: &str) -> Result<u64, StoreError> {
        self.counts.fetch_add(1, Ordering::Relaxed);

        let emails = self.emails.read().map_err(|_| Self::poisoned())?;
        let count = emails
            .iter()
            .filter(|email| email.to.iter().any(|receiver| receiver == to))
            .count();

        Ok(count as u64)
    }

    async fn find_by_receiver(
        &self,
        to: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Email>, StoreError> {
        self.row_fetches.fetch_add(1, Ordering::Relaxed);

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        let emails = self.emails.read().map_err(|_| Self::poisoned())?;
        Ok(emails
            .iter()
            .rev()
            .filter(|email| email.to.iter().any(|receiver| receiver == to))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn email(to: &[&str], subject: &str) -> Email {
        Email::new(to.iter().map(ToString::to_string).collect(), subject, "body")
    }

    #[tokio::test]
    async fn create_assigns_identifier() {
        let repository = MemoryEmailRepository::new();
        let id = repository
            .create_email(&email(&["a@x.com"], "hello"))
            .await
            .expect("create");

        let found = repository.find_email_by_id(id).await.expect("find");
        assert_eq!(found.id, Some(id));
        assert_eq!(found.subject, "hello");
        assert_eq!(repository.creates(), 1);
    }

    #[tokio::test]
    async fn record_time_is_stamped_on_create() {
        let repository = MemoryEmailRepository::new();
        let mut stale = email(&["a@x.com"], "old");
        stale.created_at = chrono::DateTime::<Utc>::UNIX_EPOCH;

        let before = Utc::now();
        let id = repository.create_email(&stale).await.expect("create");

        let found = repository.find_email_by_id(id).await.expect("find");
        assert!(found.created_at >= before);
    }

    #[tokio::test]
    async fn failing_writes_store_nothing() {
        let repository = MemoryEmailRepository::failing();

        let err = repository
            .create_email(&email(&["a@x.com"], "lost"))
            .await
            .expect_err("writes fail");

        assert!(!err.is_not_found());
        assert_eq!(repository.creates(), 1);
        assert!(repository.is_empty());

        repository.set_failing(false);
        repository
            .create_email(&email(&["a@x.com"], "kept"))
            .await
            .expect("create");
        assert_eq!(repository.len(), 1);
    }

    #[tokio::test]
    async fn missing_identifier_is_not_found() {
        let repository = MemoryEmailRepository::new();
        let err = repository
            .find_email_by_id(Uuid::nil())
            .await
            .expect_err("nothing stored");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn receiver_queries_page_newest_first() {
        let repository = MemoryEmailRepository::new();
        for n in 0..5 {
            repository
                .create_email(&email(&["a@x.com", "b@x.com"], &format!("m{n}")))
                .await
                .expect("create");
        }
        repository
            .create_email(&email(&["c@x.com"], "other"))
            .await
            .expect("create");

        assert_eq!(repository.count_by_receiver("a@x.com").await.expect("count"), 5);
        assert_eq!(repository.count_by_receiver("nobody@x.com").await.expect("count"), 0);

        let page: Vec<String> = repository
            .find_by_receiver("b@x.com", 1, 2)
            .await
            .expect("page")
            .into_iter()
            .map(|email| email.subject)
            .collect();
        assert_eq!(page, vec!["m3".to_string(), "m2".to_string()]);
        assert_eq!(repository.row_fetches(), 1);
        assert_eq!(repository.counts(), 2);
    }
}
