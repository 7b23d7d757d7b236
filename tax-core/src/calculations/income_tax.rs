//! Progressive income tax with rent refund and investment deduction.
//!
//! # Calculation Steps
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Parse annual earnings (a failure here stops the calculation) |
//! | 2    | Earnings below 800,000 owe nothing |
//! | 3    | Walk the brackets: each threshold below the remaining income adds its flat payment and is consumed |
//! | 4    | Any remainder is charged the flat payment of the next bracket (the first bracket if none was consumed) |
//! | 5    | Parse rent and investments |
//! | 6    | Subtract 20% of rent, at most 500,000 |
//! | 7    | Subtract investments in full |
//!
//! Steps 6 and 7 never take the result below zero; [`TaxAssessment`]
//! records whether the deductions exceeded the liability.
//!
//! # Example
//!
//! ```
//! use tax_core::MonetaryAmount;
//! use tax_core::calculations::compute_tax;
//!
//! let tax = compute_tax("3200000", "1000000", "0").unwrap();
//!
//! assert_eq!(tax, MonetaryAmount::new(1_750_000));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::{AmountParseError, MonetaryAmount, STANDARD_BRACKETS, TaxBracket};

/// Earnings strictly below this amount owe no tax.
pub const NO_TAX_FLOOR: MonetaryAmount = MonetaryAmount::new(800_000);

/// Share of declared rent refunded against the tax.
pub const RENT_REFUND_PERCENT: u8 = 20;

/// Ceiling on the rent refund.
pub const RENT_REFUND_CAP: MonetaryAmount = MonetaryAmount::new(500_000);

/// The three amount fields accepted by the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaxField {
    AnnualEarnings,
    RentAmount,
    BusinessExpenses,
}

impl TaxField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnnualEarnings => "annualEarnings",
            Self::RentAmount => "rentAmount",
            Self::BusinessExpenses => "businessExpenses",
        }
    }

    /// Human-readable label for messages shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AnnualEarnings => "Annual income",
            Self::RentAmount => "Rent paid",
            Self::BusinessExpenses => "Investments / business expenses",
        }
    }
}

impl fmt::Display for TaxField {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during an income tax calculation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaxCalculationError {
    /// An input field is not a valid whole non-negative amount.
    #[error("invalid {field} value '{raw}': {source}")]
    Parse {
        field: TaxField,
        raw: String,
        #[source]
        source: AmountParseError,
    },
}

impl TaxCalculationError {
    /// The field that failed to parse.
    pub fn field(&self) -> TaxField {
        match self {
            Self::Parse { field, .. } => *field,
        }
    }
}

/// Breakdown of a completed calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxAssessment {
    /// Tax from the bracket walk, before any refund or deduction.
    pub gross_tax: MonetaryAmount,

    /// Rent refund after the cap.
    pub rent_refund: MonetaryAmount,

    /// Investment deduction as declared.
    pub investment_deduction: MonetaryAmount,

    /// Final tax owed.
    pub tax_amount: MonetaryAmount,

    /// True when refund plus deduction exceeded `gross_tax` and the
    /// result was clamped to zero.
    pub deductions_exceed_liability: bool,
}

impl TaxAssessment {
    fn below_floor() -> Self {
        Self {
            gross_tax: MonetaryAmount::ZERO,
            rent_refund: MonetaryAmount::ZERO,
            investment_deduction: MonetaryAmount::ZERO,
            tax_amount: MonetaryAmount::ZERO,
            deductions_exceed_liability: false,
        }
    }
}

/// Calculator over a bracket table.
///
/// Brackets must be sorted by `threshold` in ascending order.
#[derive(Debug, Clone)]
pub struct IncomeTaxCalculator<'a> {
    brackets: &'a [TaxBracket],
}

impl Default for IncomeTaxCalculator<'static> {
    fn default() -> Self {
        Self::new(&STANDARD_BRACKETS)
    }
}

impl<'a> IncomeTaxCalculator<'a> {
    pub fn new(brackets: &'a [TaxBracket]) -> Self {
        Self { brackets }
    }

    /// Computes the tax owed for the three raw inputs.
    ///
    /// # Errors
    ///
    /// Returns [`TaxCalculationError::Parse`] naming the first field, in
    /// evaluation order, that is not a valid amount. Rent and investments
    /// are only examined when earnings reach the no-tax floor.
    pub fn compute(
        &self,
        annual_earnings: &str,
        rent_amount: &str,
        business_expenses: &str,
    ) -> Result<MonetaryAmount, TaxCalculationError> {
        self.assess(annual_earnings, rent_amount, business_expenses)
            .map(|assessment| assessment.tax_amount)
    }

    /// Like [`compute`](Self::compute) but returns the full breakdown.
    pub fn assess(
        &self,
        annual_earnings: &str,
        rent_amount: &str,
        business_expenses: &str,
    ) -> Result<TaxAssessment, TaxCalculationError> {
        debug!(
            annual_earnings,
            rent_amount, business_expenses, "assessing income tax"
        );

        let income = parse_field(TaxField::AnnualEarnings, annual_earnings)?;
        if income < NO_TAX_FLOOR {
            return Ok(TaxAssessment::below_floor());
        }

        let gross_tax = self.bracket_tax(income);

        let rent = parse_field(TaxField::RentAmount, rent_amount)?;
        let investments = parse_field(TaxField::BusinessExpenses, business_expenses)?;

        let rent_refund = self.rent_refund(rent);
        let deductions = rent_refund.saturating_add(investments);
        let tax_amount = gross_tax.saturating_sub(deductions);

        Ok(TaxAssessment {
            gross_tax,
            rent_refund,
            investment_deduction: investments,
            tax_amount,
            deductions_exceed_liability: deductions > gross_tax,
        })
    }

    /// Walks the bracket table and charges the remainder.
    fn bracket_tax(
        &self,
        income: MonetaryAmount,
    ) -> MonetaryAmount {
        let mut remaining = income;
        let mut tax = MonetaryAmount::ZERO;
        let mut last_rate: Option<MonetaryAmount> = None;

        for (i, bracket) in self.brackets.iter().enumerate() {
            if bracket.threshold < remaining {
                tax = tax.saturating_add(bracket.flat_payment);
                remaining = remaining.saturating_sub(bracket.threshold);
                if let Some(next) = self.brackets.get(i + 1) {
                    last_rate = Some(next.flat_payment);
                }
            }
        }

        if !remaining.is_zero() {
            let marginal = last_rate
                .or_else(|| self.brackets.first().map(|b| b.flat_payment))
                .unwrap_or(MonetaryAmount::ZERO);
            tax = tax.saturating_add(marginal);
            debug!(%marginal, %remaining, %tax, "applied marginal charge to remainder");
        }

        tax
    }

    /// Rent refund, capped at [`RENT_REFUND_CAP`].
    fn rent_refund(
        &self,
        rent: MonetaryAmount,
    ) -> MonetaryAmount {
        if rent.is_zero() {
            return MonetaryAmount::ZERO;
        }
        let refund = rent.percent(RENT_REFUND_PERCENT);
        debug!(%rent, %refund, "rent refund");
        refund.min(RENT_REFUND_CAP)
    }
}

fn parse_field(
    field: TaxField,
    raw: &str,
) -> Result<MonetaryAmount, TaxCalculationError> {
    raw.parse().map_err(|source| TaxCalculationError::Parse {
        field,
        raw: raw.to_string(),
        source,
    })
}

/// Computes tax with the standard bracket table.
pub fn compute_tax(
    annual_earnings: &str,
    rent_amount: &str,
    business_expenses: &str,
) -> Result<MonetaryAmount, TaxCalculationError> {
    IncomeTaxCalculator::default().compute(annual_earnings, rent_amount, business_expenses)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn amount(units: u64) -> MonetaryAmount {
        MonetaryAmount::new(units)
    }

    fn tax(
        earnings: &str,
        rent: &str,
        investments: &str,
    ) -> u64 {
        compute_tax(earnings, rent, investments)
            .expect("valid inputs")
            .units()
    }

    // =========================================================================
    // floor tests
    // =========================================================================

    #[test]
    fn all_zero_inputs_owe_nothing() {
        assert_eq!(compute_tax("0", "0", "0"), Ok(MonetaryAmount::ZERO));
    }

    #[test]
    fn zero_cents_suffix_below_floor_owes_nothing() {
        assert_eq!(
            compute_tax("700000.00", "0.00", "0.00"),
            Ok(MonetaryAmount::ZERO)
        );
    }

    #[test]
    fn just_below_floor_owes_nothing() {
        assert_eq!(tax("799999", "0", "0"), 0);
    }

    #[test]
    fn below_floor_ignores_rent_and_investments() {
        assert_eq!(tax("500000", "abc", "-1"), 0);
        assert_eq!(tax("", "9999999", "9999999"), 0);
    }

    // =========================================================================
    // bracket_tax tests
    // =========================================================================

    #[test]
    fn bracket_tax_at_floor_falls_back_to_first_bracket() {
        let calculator = IncomeTaxCalculator::default();

        assert_eq!(calculator.bracket_tax(amount(800_000)), amount(330_000));
    }

    #[test]
    fn bracket_tax_below_first_threshold_falls_back_to_first_bracket() {
        let calculator = IncomeTaxCalculator::default();

        assert_eq!(calculator.bracket_tax(amount(1_000_000)), amount(330_000));
        assert_eq!(calculator.bracket_tax(amount(2_200_000)), amount(330_000));
    }

    #[test]
    fn bracket_tax_charges_next_flat_payment_on_remainder() {
        let calculator = IncomeTaxCalculator::default();

        // 330,000 for the first slice, 1,620,000 on the 1,000,000 remainder
        assert_eq!(calculator.bracket_tax(amount(3_200_000)), amount(1_950_000));
    }

    #[test]
    fn bracket_tax_walks_thresholds_against_remaining_income() {
        let calculator = IncomeTaxCalculator::default();

        // 12,000,000 - 2,200,000 = 9,800,000 exceeds 9,000,000, leaving 800,000
        // 330,000 + 1,620,000 + 2,730,000
        assert_eq!(calculator.bracket_tax(amount(12_000_000)), amount(4_680_000));
    }

    #[test]
    fn bracket_tax_equal_remainder_is_not_consumed() {
        let calculator = IncomeTaxCalculator::default();

        // Remaining 9,000,000 is not strictly above the 9,000,000 threshold
        assert_eq!(calculator.bracket_tax(amount(11_200_000)), amount(1_950_000));
    }

    #[test]
    fn bracket_tax_past_last_bracket_repeats_last_payment() {
        let calculator = IncomeTaxCalculator::default();

        // All five payments (22,930,000) plus the last one again on the 800,000 remainder
        assert_eq!(
            calculator.bracket_tax(amount(100_000_000)),
            amount(35_430_000)
        );
    }

    #[test]
    fn bracket_tax_with_no_brackets_is_zero() {
        let calculator = IncomeTaxCalculator::new(&[]);

        assert_eq!(calculator.bracket_tax(amount(5_000_000)), MonetaryAmount::ZERO);
    }

    #[test]
    fn custom_bracket_table_is_used() {
        let brackets = [TaxBracket::new(1_000_000, 10), TaxBracket::new(2_000_000, 20)];
        let calculator = IncomeTaxCalculator::new(&brackets);

        // 100,000 for the first slice, 400,000 on the remainder
        assert_eq!(calculator.compute("1500000", "0", "0"), Ok(amount(500_000)));
    }

    // =========================================================================
    // rent_refund tests
    // =========================================================================

    #[test]
    fn rent_refund_is_twenty_percent() {
        let calculator = IncomeTaxCalculator::default();

        assert_eq!(calculator.rent_refund(amount(1_000_000)), amount(200_000));
    }

    #[test]
    fn rent_refund_is_capped() {
        let calculator = IncomeTaxCalculator::default();

        assert_eq!(calculator.rent_refund(amount(2_500_000)), amount(500_000));
        assert_eq!(calculator.rent_refund(amount(2_500_005)), amount(500_000));
        assert_eq!(calculator.rent_refund(amount(40_000_000)), amount(500_000));
    }

    #[test]
    fn rent_refund_rounds_down() {
        let calculator = IncomeTaxCalculator::default();

        assert_eq!(calculator.rent_refund(amount(9)), amount(1));
    }

    // =========================================================================
    // compute / assess tests
    // =========================================================================

    #[test]
    fn regression_fixture() {
        assert_eq!(tax("3200000", "1000000", "0"), 1_750_000);
    }

    #[test]
    fn repeated_calls_agree() {
        let first = compute_tax("3200000", "1000000", "0");

        for _ in 0..10 {
            assert_eq!(compute_tax("3200000", "1000000", "0"), first);
        }
    }

    #[test]
    fn large_rent_subtracts_exactly_the_cap() {
        assert_eq!(tax("3200000", "3000000", "0"), 1_450_000);
    }

    #[test]
    fn investments_are_subtracted_in_full() {
        assert_eq!(tax("3200000", "0", "950000"), 1_000_000);
    }

    #[test]
    fn deductions_beyond_liability_clamp_to_zero() {
        let assessment = IncomeTaxCalculator::default()
            .assess("3200000", "1000000", "2000000")
            .unwrap();

        assert_eq!(
            assessment,
            TaxAssessment {
                gross_tax: amount(1_950_000),
                rent_refund: amount(200_000),
                investment_deduction: amount(2_000_000),
                tax_amount: MonetaryAmount::ZERO,
                deductions_exceed_liability: true,
            }
        );
    }

    #[test]
    fn deductions_equal_to_liability_are_not_flagged() {
        let assessment = IncomeTaxCalculator::default()
            .assess("3200000", "1000000", "1750000")
            .unwrap();

        assert_eq!(assessment.tax_amount, MonetaryAmount::ZERO);
        assert!(!assessment.deductions_exceed_liability);
    }

    #[test]
    fn assessment_reports_breakdown() {
        let assessment = IncomeTaxCalculator::default()
            .assess("3200000", "1000000", "50000")
            .unwrap();

        assert_eq!(assessment.gross_tax, amount(1_950_000));
        assert_eq!(assessment.rent_refund, amount(200_000));
        assert_eq!(assessment.investment_deduction, amount(50_000));
        assert_eq!(assessment.tax_amount, amount(1_700_000));
        assert!(!assessment.deductions_exceed_liability);
    }

    // =========================================================================
    // error tests
    // =========================================================================

    #[test]
    fn malformed_earnings_name_the_field() {
        let err = compute_tax("abc", "0", "0").unwrap_err();

        assert_eq!(err.field(), TaxField::AnnualEarnings);
        assert_eq!(
            err,
            TaxCalculationError::Parse {
                field: TaxField::AnnualEarnings,
                raw: "abc".to_string(),
                source: AmountParseError::InvalidFormat("abc".to_string()),
            }
        );
    }

    #[test]
    fn malformed_rent_is_reported_after_floor_check() {
        let err = compute_tax("3200000", "12.5", "0").unwrap_err();

        assert_eq!(err.field(), TaxField::RentAmount);
    }

    #[test]
    fn malformed_investments_name_the_field() {
        let err = compute_tax("3200000", "0", "lots").unwrap_err();

        assert_eq!(err.field(), TaxField::BusinessExpenses);
    }

    #[test]
    fn rent_error_wins_over_investment_error() {
        let err = compute_tax("3200000", "x", "y").unwrap_err();

        assert_eq!(err.field(), TaxField::RentAmount);
    }

    #[test]
    fn error_message_names_field_and_raw_value() {
        let err = compute_tax("-5", "0", "0").unwrap_err();

        assert_eq!(
            err.to_string(),
            "invalid annualEarnings value '-5': '-5' is not a whole non-negative amount"
        );
    }
}
