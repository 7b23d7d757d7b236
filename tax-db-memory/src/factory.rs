use std::sync::Arc;

use async_trait::async_trait;

use tax_core::db::repository::{RepositoryError, TaxRecordRepository};
use tax_core::db::{DbConfig, RepositoryFactory};

use crate::repository::InMemoryRepository;

/// [`RepositoryFactory`] for the in-memory store.
///
/// Register this with a [`tax_core::db::RepositoryRegistry`] to make the
/// `"memory"` backend available:
///
/// ```rust
/// use tax_core::db::RepositoryRegistry;
/// use tax_db_memory::MemoryRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(MemoryRepositoryFactory));
/// assert_eq!(registry.available_backends(), vec!["memory"]);
/// ```
pub struct MemoryRepositoryFactory;

#[async_trait]
impl RepositoryFactory for MemoryRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    /// Every call yields a fresh, empty store; the connection string is ignored.
    async fn create(
        &self,
        _config: &DbConfig,
    ) -> Result<Arc<dyn TaxRecordRepository>, RepositoryError> {
        Ok(Arc::new(InMemoryRepository::new()))
    }
}
