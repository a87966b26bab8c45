use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use herald_common::{Email, internal};
use sqlx::{PgPool, postgres::PgPoolOptions};
use uuid::Uuid;

use crate::{EmailRepository, PostgresConfig, StoreError};

const SCHEMA: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS emails (\
         email_id UUID PRIMARY KEY, \
         receivers TEXT[] NOT NULL, \
         sender VARCHAR(250) NOT NULL, \
         subject VARCHAR(250) NOT NULL, \
         body TEXT NOT NULL, \
         content_type VARCHAR(100) NOT NULL, \
         created_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE INDEX IF NOT EXISTS emails_receivers_idx ON emails USING GIN (receivers)",
];

/// `created_at` is left to the column default so the record time is always the
/// database clock.
const CREATE_EMAIL: &str = "INSERT INTO emails \
     (email_id, receivers, sender, subject, body, content_type) \
     VALUES ($1, $2, $3, $4, $5, $6)";

const FIND_BY_ID: &str = "SELECT email_id, receivers, sender, subject, body, content_type, \
     created_at FROM emails WHERE email_id = $1";

const COUNT_BY_RECEIVER: &str = "SELECT COUNT(*) FROM emails WHERE $1 = ANY(receivers)";

const FIND_BY_RECEIVER: &str = "SELECT email_id, receivers, sender, subject, body, content_type, \
     created_at FROM emails WHERE $1 = ANY(receivers) \
     ORDER BY created_at DESC, email_id \
     OFFSET $2 LIMIT $3";

#[derive(sqlx::FromRow)]
struct EmailRow {
    email_id: Uuid,
    receivers: Vec<String>,
    sender: String,
    subject: String,
    body: String,
    content_type: String,
    created_at: DateTime<Utc>,
}

impl From<EmailRow> for Email {
    fn from(row: EmailRow) -> Self {
        Self {
            id: Some(row.email_id),
            from: row.sender,
            to: row.receivers,
            subject: row.subject,
            body: row.body,
            content_type: row.content_type,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL-backed repository. The pool is shared safely across workers.
#[derive(Debug, Clone)]
pub struct PgEmailRepository {
    pool: PgPool,
}

impl PgEmailRepository {
    pub async fn connect(config: &PostgresConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await?;

        internal!(
            level = INFO,
            max_connections = config.max_connections,
            "Connected to PostgreSQL"
        );

        Ok(Self::new(pool))
    }

    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl EmailRepository for PgEmailRepository {
    async fn create_email(&self, email: &Email) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();

        sqlx::query(CREATE_EMAIL)
            .bind(id)
            .bind(&email.to)
            .bind(&email.from)
            .bind(&email.subject)
            .bind(&email.body)
            .bind(&email.content_type)
            .execute(&self.pool)
            .await?;

        tracing::trace!(%id, "Email recorded");
        Ok(id)
    }

    async fn find_email_by_id(&self, id: Uuid) -> Result<Email, StoreError> {
        sqlx::query_as::<_, EmailRow>(FIND_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Email::from)
            .ok_or(StoreError::NotFound(id))
    }

    async fn count_by_receiver(&self, to: &str) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(COUNT_BY_RECEIVER)
            .bind(to)
            .fetch_one(&self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn find_by_receiver(
        &self,
        to: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Email>, StoreError> {
        let rows = sqlx::query_as::<_, EmailRow>(FIND_BY_RECEIVER)
            .bind(to)
            .bind(to_i64(offset))
            .bind(to_i64(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Email::from).collect())
    }
}
