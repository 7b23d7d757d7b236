use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewTaxRecord, TaxRecord};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Storage for computed tax records.
///
/// Implementations must be safe to share across request handlers; writes
/// are serialized by the implementation.
#[async_trait]
pub trait TaxRecordRepository: Send + Sync {
    /// Stores a new record under a freshly generated id and returns it.
    async fn create_record(
        &self,
        record: NewTaxRecord,
    ) -> Result<TaxRecord, RepositoryError>;

    async fn get_record(&self, id: Uuid) -> Result<TaxRecord, RepositoryError>;

    /// All records, oldest first.
    async fn list_records(&self) -> Result<Vec<TaxRecord>, RepositoryError>;

    async fn delete_record(&self, id: Uuid) -> Result<(), RepositoryError>;
}
