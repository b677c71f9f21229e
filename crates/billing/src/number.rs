use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use freightdesk_core::{DomainError, DomainResult};

/// A human-facing invoice number such as `A-000001`.
///
/// The letter is the upper-cased first character of the issuing office's
/// name; the numeric part is that office's sequence value, zero-padded to
/// six digits. Sequences past 999999 simply widen the numeric part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
    pub fn compose(prefix: char, sequence: u32) -> Self {
        Self(format!("{}-{:06}", prefix.to_ascii_uppercase(), sequence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for InvoiceNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        let Some((prefix, digits)) = s.split_once('-') else {
            return Err(DomainError::validation(format!(
                "invoice number {s:?} is missing the letter-sequence separator"
            )));
        };
        let prefix_ok = prefix.len() == 1
            && prefix.chars().all(|c| c.is_ascii_uppercase());
        let digits_ok = digits.len() >= 6 && digits.chars().all(|c| c.is_ascii_digit());
        if !prefix_ok || !digits_ok {
            return Err(DomainError::validation(format!(
                "invoice number {s:?} must look like A-000001"
            )));
        }
        Ok(Self(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn composes_letter_dash_padded_sequence() {
        assert_eq!(InvoiceNumber::compose('A', 1).as_str(), "A-000001");
        assert_eq!(InvoiceNumber::compose('A', 2).as_str(), "A-000002");
        assert_eq!(InvoiceNumber::compose('m', 42).as_str(), "M-000042");
    }

    #[test]
    fn sequences_past_six_digits_widen() {
        assert_eq!(InvoiceNumber::compose('B', 1_000_000).as_str(), "B-1000000");
    }

    #[test]
    fn parse_rejects_malformed_numbers() {
        assert!("A000001".parse::<InvoiceNumber>().is_err());
        assert!("a-000001".parse::<InvoiceNumber>().is_err());
        assert!("AB-000001".parse::<InvoiceNumber>().is_err());
        assert!("A-1".parse::<InvoiceNumber>().is_err());
        assert!("A-00000x".parse::<InvoiceNumber>().is_err());
    }

    proptest! {
        #[test]
        fn composed_numbers_always_round_trip(prefix in proptest::char::range('a', 'z'), seq in 1u32..=9_999_999) {
            let number = InvoiceNumber::compose(prefix, seq);
            let parsed: InvoiceNumber = number.as_str().parse().unwrap();
            prop_assert_eq!(parsed, number);
        }

        #[test]
        fn padded_range_keeps_fixed_width(prefix in proptest::char::range('A', 'Z'), seq in 1u32..=999_999) {
            let number = InvoiceNumber::compose(prefix, seq);
            prop_assert_eq!(number.as_str().len(), 8);
        }
    }
}
