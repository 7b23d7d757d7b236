use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Suffix accepted (and discarded) after the integer part of an amount.
const WHOLE_UNITS_SUFFIX: &str = ".00";

/// Error returned when a string is not a valid [`MonetaryAmount`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AmountParseError {
    #[error("'{0}' is not a whole non-negative amount")]
    InvalidFormat(String),

    #[error("'{0}' is too large")]
    Overflow(String),
}

/// A non-negative whole number of currency units.
///
/// Parsed from a string of ASCII digits, optionally followed by `.00`.
/// The empty string and `"0"` both parse to zero; signs, whitespace,
/// separators and any other fraction are rejected.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MonetaryAmount(u64);

impl MonetaryAmount {
    pub const ZERO: MonetaryAmount = MonetaryAmount(0);

    pub const fn new(units: u64) -> Self {
        Self(units)
    }

    pub const fn units(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `percent`% of this amount, rounded down.
    pub const fn percent(self, percent: u8) -> MonetaryAmount {
        // The widened product cannot overflow and the quotient never exceeds `self`.
        MonetaryAmount(((self.0 as u128 * percent as u128) / 100) as u64)
    }

    pub const fn saturating_sub(self, other: MonetaryAmount) -> MonetaryAmount {
        MonetaryAmount(self.0.saturating_sub(other.0))
    }

    pub const fn saturating_add(self, other: MonetaryAmount) -> MonetaryAmount {
        MonetaryAmount(self.0.saturating_add(other.0))
    }

    /// Formats the amount with `,` as the thousands separator.
    pub fn grouped(self) -> String {
        let digits = self.0.to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        out
    }
}

impl FromStr for MonetaryAmount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s == "0" {
            return Ok(Self::ZERO);
        }

        let digits = s.strip_suffix(WHOLE_UNITS_SUFFIX).unwrap_or(s);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountParseError::InvalidFormat(s.to_string()));
        }

        digits
            .parse::<u64>()
            .map(MonetaryAmount)
            .map_err(|_| AmountParseError::Overflow(s.to_string()))
    }
}

impl From<u64> for MonetaryAmount {
    fn from(units: u64) -> Self {
        Self(units)
    }
}

impl fmt::Display for MonetaryAmount {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(s: &str) -> Result<MonetaryAmount, AmountParseError> {
        s.parse()
    }

    #[test]
    fn empty_and_zero_parse_to_zero() {
        assert_eq!(parse(""), Ok(MonetaryAmount::ZERO));
        assert_eq!(parse("0"), Ok(MonetaryAmount::ZERO));
        assert_eq!(parse("0.00"), Ok(MonetaryAmount::ZERO));
    }

    #[test]
    fn whole_number_parses() {
        assert_eq!(parse("3200000"), Ok(MonetaryAmount::new(3_200_000)));
    }

    #[test]
    fn trailing_zero_cents_are_accepted() {
        assert_eq!(parse("700000.00"), Ok(MonetaryAmount::new(700_000)));
    }

    #[test]
    fn other_fractions_are_rejected() {
        assert!(matches!(
            parse("700000.50"),
            Err(AmountParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse("700000.0"),
            Err(AmountParseError::InvalidFormat(_))
        ));
        assert!(matches!(parse(".00"), Err(AmountParseError::InvalidFormat(_))));
    }

    #[test]
    fn signs_and_garbage_are_rejected() {
        for input in ["-5", "+5", "abc", " 5", "5 ", "1,000", "1e6"] {
            assert_eq!(
                parse(input),
                Err(AmountParseError::InvalidFormat(input.to_string())),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn values_beyond_u64_overflow() {
        let input = "18446744073709551616";
        assert_eq!(
            parse(input),
            Err(AmountParseError::Overflow(input.to_string()))
        );
    }

    #[test]
    fn percent_rounds_down() {
        assert_eq!(MonetaryAmount::new(999).percent(20), MonetaryAmount::new(199));
        assert_eq!(
            MonetaryAmount::new(2_200_000).percent(15),
            MonetaryAmount::new(330_000)
        );
    }

    #[test]
    fn percent_does_not_overflow_on_large_amounts() {
        assert_eq!(
            MonetaryAmount::new(u64::MAX).percent(100),
            MonetaryAmount::new(u64::MAX)
        );
    }

    #[test]
    fn saturating_sub_stops_at_zero() {
        let result = MonetaryAmount::new(10).saturating_sub(MonetaryAmount::new(25));

        assert_eq!(result, MonetaryAmount::ZERO);
    }

    #[test]
    fn grouped_inserts_thousands_separators() {
        assert_eq!(MonetaryAmount::new(0).grouped(), "0");
        assert_eq!(MonetaryAmount::new(999).grouped(), "999");
        assert_eq!(MonetaryAmount::new(1_000).grouped(), "1,000");
        assert_eq!(MonetaryAmount::new(1_750_000).grouped(), "1,750,000");
    }
}
