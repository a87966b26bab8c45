//! Audit storage for sent emails.

mod config;
mod error;
mod memory;
mod postgres;
mod repository;

pub use config::{PostgresConfig, StoreConfig};
pub use error::StoreError;
pub use memory::MemoryEmailRepository;
pub use postgres::PgEmailRepository;
pub use repository::EmailRepository;

use std::sync::Arc;

/// Builds the repository selected by `config`, creating the schema if needed.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn EmailRepository>, StoreError> {
    match config {
        StoreConfig::Postgres(postgres) => {
            let repository = PgEmailRepository::connect(postgres).await?;
            repository.ensure_schema().await?;
            Ok(Arc::new(repository))
        }
        StoreConfig::Memory => Ok(Arc::new(MemoryEmailRepository::new())),
    }
}
