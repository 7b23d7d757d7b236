use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MonetaryAmount;

/// A stored calculation: the raw form inputs and the computed tax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRecord {
    pub id: Uuid,

    // Inputs exactly as submitted
    pub annual_income: String,
    pub rent: String,
    pub investments: String,

    pub tax_amount: MonetaryAmount,

    pub created_at: DateTime<Utc>,
}

/// For creating new records (no id or timestamp)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTaxRecord {
    pub annual_income: String,
    pub rent: String,
    pub investments: String,
    pub tax_amount: MonetaryAmount,
}

impl NewTaxRecord {
    /// Stamps the record with a fresh v4 id and the current time.
    pub fn into_record(self) -> TaxRecord {
        TaxRecord {
            id: Uuid::new_v4(),
            annual_income: self.annual_income,
            rent: self.rent,
            investments: self.investments,
            tax_amount: self.tax_amount,
            created_at: Utc::now(),
        }
    }
}
