//! Provider-number authentication contract.
//!
//! The portal accepts a single credential: a National Provider Identifier,
//! exactly ten ASCII digits. There is no password and no email login.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const PROVIDER_NUMBER_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("provider number is required")]
    Empty,
    #[error("provider number may only contain digits")]
    InvalidCharacters,
    #[error("provider number must be exactly 10 digits, got {len}")]
    WrongLength { len: usize },
}

/// A validated 10-digit provider number (NPI).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProviderNumber(String);

impl ProviderNumber {
    /// Parses a provider number, ignoring surrounding whitespace.
    pub fn parse(input: &str) -> Result<Self, AuthError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AuthError::Empty);
        }
        if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(AuthError::InvalidCharacters);
        }
        if trimmed.len() != PROVIDER_NUMBER_LEN {
            return Err(AuthError::WrongLength { len: trimmed.len() });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Keeps only digits and truncates to ten, as the entry field does while typing.
pub fn sanitize_input(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(PROVIDER_NUMBER_LEN)
        .collect()
}

impl fmt::Display for ProviderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProviderNumber {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProviderNumber {
    type Error = AuthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProviderNumber> for String {
    fn from(value: ProviderNumber) -> Self {
        value.0
    }
}

impl AsRef<str> for ProviderNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_accepts_ten_digits() {
        let npi = ProviderNumber::parse("1234567890").unwrap();
        assert_eq!(npi.as_str(), "1234567890");

        let padded = ProviderNumber::parse("  1234567890\n").unwrap();
        assert_eq!(padded, npi);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(ProviderNumber::parse(""), Err(AuthError::Empty));
        assert_eq!(ProviderNumber::parse("   "), Err(AuthError::Empty));
        assert_eq!(
            ProviderNumber::parse("12345abcde"),
            Err(AuthError::InvalidCharacters)
        );
        assert_eq!(
            ProviderNumber::parse("123 456 7890"),
            Err(AuthError::InvalidCharacters)
        );
        assert_eq!(
            ProviderNumber::parse("123456789"),
            Err(AuthError::WrongLength { len: 9 })
        );
        assert_eq!(
            ProviderNumber::parse("12345678901"),
            Err(AuthError::WrongLength { len: 11 })
        );
    }

    #[test]
    fn test_sanitize_input() {
        assert_eq!(sanitize_input("123-456-7890"), "1234567890");
        assert_eq!(sanitize_input("12345678901234"), "1234567890");
        assert_eq!(sanitize_input("abc"), "");
    }

    proptest! {
        #[test]
        fn prop_sanitized_input_parses_only_at_full_length(raw in "[0-9a-z -]{0,40}") {
            let cleaned = sanitize_input(&raw);
            prop_assert!(cleaned.len() <= PROVIDER_NUMBER_LEN);
            prop_assert_eq!(
                ProviderNumber::parse(&cleaned).is_ok(),
                cleaned.len() == PROVIDER_NUMBER_LEN
            );
        }

        #[test]
        fn prop_any_ten_digits_are_accepted(digits in "[0-9]{10}") {
            let npi = ProviderNumber::parse(&digits).unwrap();
            prop_assert_eq!(npi.as_str(), digits.as_str());
        }
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: ProviderNumber = serde_json::from_str("\"1234567890\"").unwrap();
        assert_eq!(ok.to_string(), "1234567890");

        let bad = serde_json::from_str::<ProviderNumber>("\"12\"");
        assert!(bad.is_err());
    }
}
