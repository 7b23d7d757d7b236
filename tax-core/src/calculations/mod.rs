//! Tax calculation modules.
//!
//! The income tax calculator walks a bracket table of flat payments and
//! then applies the rent refund and investment deduction.

pub mod income_tax;

pub use income_tax::{
    IncomeTaxCalculator, NO_TAX_FLOOR, RENT_REFUND_CAP, RENT_REFUND_PERCENT, TaxAssessment,
    TaxCalculationError, TaxField, compute_tax,
};
