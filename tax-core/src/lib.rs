pub mod calculations;
pub mod db;
pub mod models;

pub use calculations::{TaxCalculationError, compute_tax};
pub use db::repository::{RepositoryError, TaxRecordRepository};
pub use models::*;
