use serde::{Deserialize, Serialize};

use super::MonetaryAmount;

/// A tax band: once income exceeds `threshold`, `flat_payment` is charged
/// for the slice and the threshold is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub threshold: MonetaryAmount,
    /// Marginal rate in whole percent.
    pub rate: u8,
    /// `rate`% of `threshold`, rounded down.
    pub flat_payment: MonetaryAmount,
}

impl TaxBracket {
    pub const fn new(
        threshold: u64,
        rate: u8,
    ) -> Self {
        let threshold = MonetaryAmount::new(threshold);
        Self {
            threshold,
            rate,
            flat_payment: threshold.percent(rate),
        }
    }
}

/// The fixed bracket table, ascending by threshold.
pub const STANDARD_BRACKETS: [TaxBracket; 5] = [
    TaxBracket::new(2_200_000, 15),
    TaxBracket::new(9_000_000, 18),
    TaxBracket::new(13_000_000, 21),
    TaxBracket::new(25_000_000, 23),
    TaxBracket::new(50_000_000, 25),
];
