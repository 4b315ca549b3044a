//! Phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// Nothing but whitespace was given.
    #[error("phone number cannot be empty")]
    Empty,
    /// The number does not match `+` followed by up to 16 digits.
    #[error("please enter a valid phone number")]
    Invalid,
}

/// A loosely validated international phone number.
///
/// Whitespace is dropped. What remains must be an optional leading `+`
/// followed by 1-16 digits, the first of which is not zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Maximum number of digits.
    pub const MAX_DIGITS: usize = 16;

    /// Parse a `Phone` from user input.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError::Empty`] for blank input and
    /// [`PhoneError::Invalid`] for anything else that is not a phone number.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(PhoneError::Empty);
        }

        let digits = compact.strip_prefix('+').unwrap_or(&compact);
        let valid = !digits.is_empty()
            && digits.len() <= Self::MAX_DIGITS
            && digits.chars().all(|c| c.is_ascii_digit())
            && !digits.starts_with('0');

        if valid {
            Ok(Self(compact))
        } else {
            Err(PhoneError::Invalid)
        }
    }

    /// Returns the phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_spaces() {
        let phone = Phone::parse("+1 555 010 2030").map(|p| p.as_str().to_owned());
        assert_eq!(phone, Ok("+15550102030".to_owned()));
    }

    #[test]
    fn test_parse_rejects() {
        assert_eq!(Phone::parse(" "), Err(PhoneError::Empty));
        assert_eq!(Phone::parse("0555"), Err(PhoneError::Invalid));
        assert_eq!(Phone::parse("+"), Err(PhoneError::Invalid));
        assert_eq!(Phone::parse("555-0102"), Err(PhoneError::Invalid));
        assert_eq!(Phone::parse("12345678901234567"), Err(PhoneError::Invalid));
    }
}
