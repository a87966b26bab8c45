use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use herald_common::Email;

use super::{MailError, MailTransport};

/// Records mail instead of sending it.
///
/// Can be switched to fail every send, for exercising the delivery error path.
#[derive(Debug, Clone, Default)]
pub struct MemoryMailer {
    sent: Arc<Mutex<Vec<Email>>>,
    attempts: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails.
    pub fn failing() -> Self {
        let mailer = Self::default();
        mailer.set_failing(true);
        mailer
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    /// Calls to [`MailTransport::send`], successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MailTransport for MemoryMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);

        if self.fail.load(Ordering::Relaxed) {
            return Err(MailError::Smtp("relay unavailable".to_string()));
        }

        self.sent
            .lock()
            .map_err(|_| MailError::Smtp("memory mailer lock poisoned".to_string()))?
            .push(email.clone());
        Ok(())
    }
}
