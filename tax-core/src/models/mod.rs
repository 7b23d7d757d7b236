mod monetary_amount;
mod tax_bracket;
mod tax_record;

pub use monetary_amount::{AmountParseError, MonetaryAmount};
pub use tax_bracket::{STANDARD_BRACKETS, TaxBracket};
pub use tax_record::{NewTaxRecord, TaxRecord};
