use std::collections::HashMap;

use async_trait::async_trait;
use tax_core::{NewTaxRecord, RepositoryError, TaxRecord, TaxRecordRepository};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    records: Mutex<HashMap<Uuid, TaxRecord>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl TaxRecordRepository for InMemoryRepository {
    async fn create_record(
        &self,
        record: NewTaxRecord,
    ) -> Result<TaxRecord, RepositoryError> {
        let mut records = self.records.lock().await;

        // v4 collisions are not expected, but never overwrite a stored record
        let mut record = record.into_record();
        while records.contains_key(&record.id) {
            record.id = Uuid::new_v4();
        }

        records.insert(record.id, record.clone());
        debug!(id = %record.id, total = records.len(), "stored tax record");
        Ok(record)
    }

    async fn get_record(&self, id: Uuid) -> Result<TaxRecord, RepositoryError> {
        self.records
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_records(&self) -> Result<Vec<TaxRecord>, RepositoryError> {
        let mut records: Vec<TaxRecord> = self.records.lock().await.values().cloned().collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn delete_record(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.records
            .lock()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}
