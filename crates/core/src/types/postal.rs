//! Postal code type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PostalCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PostalCodeError {
    /// Wrong number of characters.
    #[error("postal code must be exactly {expected} characters (got {actual})")]
    Length {
        /// Required length.
        expected: usize,
        /// Length of the input.
        actual: usize,
    },
    /// A character other than an ASCII digit.
    #[error("postal code must contain only digits")]
    NonDigit,
}

/// A five-digit postal code used for address auto-fill.
///
/// ```
/// use mercado_core::PostalCode;
///
/// assert!(PostalCode::parse("06700").is_ok());
/// assert!(PostalCode::parse("6700").is_err());
/// assert!(PostalCode::parse("06A00").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostalCode(String);

impl PostalCode {
    /// Required length of a postal code.
    pub const LENGTH: usize = 5;

    /// Parse a postal code, ignoring surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error unless the trimmed input is exactly five ASCII digits.
    pub fn parse(s: &str) -> Result<Self, PostalCodeError> {
        let trimmed = s.trim();
        let actual = trimmed.chars().count();
        if actual != Self::LENGTH {
            return Err(PostalCodeError::Length {
                expected: Self::LENGTH,
                actual,
            });
        }
        if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(PostalCodeError::NonDigit);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PostalCode {
    type Error = PostalCodeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PostalCode> for String {
    fn from(code: PostalCode) -> Self {
        code.0
    }
}
