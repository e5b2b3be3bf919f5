//! Numeric tokens protected by a trailing Luhn check digit.
//!
//! Tickets carry 12 digit tokens, validation codes carry 6 digit ones.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const TICKET_TOKEN_LENGTH: usize = 12;
pub const VALIDATION_TOKEN_LENGTH: usize = 6;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LuhnError {
    #[error("value is not a number")]
    NotANumber,
    #[error("value does not pass the Luhn check")]
    InvalidChecksum,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LuhnToken(String);

impl LuhnToken {
    /// Wraps a caller supplied value without checking it.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Random token of `length` digits, check digit included.
    pub fn generate(length: usize) -> Self {
        let mut rng = rand::thread_rng();
        let digits: String = (0..length.saturating_sub(1))
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();

        let check = check_digit(&digits).unwrap_or(0);
        Self(format!("{digits}{check}"))
    }

    /// Returns the check digit of the current value and the value with
    /// that digit appended.
    pub fn calculate(&self) -> Result<(u8, String), LuhnError> {
        let check = check_digit(&self.0)?;
        Ok((check, format!("{}{}", self.0, check)))
    }

    pub fn validate(&self) -> Result<(), LuhnError> {
        if self.0.is_empty() {
            return Err(LuhnError::NotANumber);
        }
        if luhn_sum(&self.0, self.0.len() % 2)? % 10 != 0 {
            return Err(LuhnError::InvalidChecksum);
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for LuhnToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<LuhnToken> for String {
    fn from(token: LuhnToken) -> Self {
        token.0
    }
}

fn check_digit(number: &str) -> Result<u8, LuhnError> {
    let sum = luhn_sum(number, (number.len() + 1) % 2)?;
    Ok(((10 - sum % 10) % 10) as u8)
}

/// Sums the digits, doubling every position whose index parity equals
/// `parity` (counted from the left).
fn luhn_sum(number: &str, parity: usize) -> Result<u32, LuhnError> {
    number.bytes().enumerate().try_fold(0u32, |sum, (i, b)| {
        if !b.is_ascii_digit() {
            return Err(LuhnError::NotANumber);
        }
        let mut d = u32::from(b - b'0');
        if i % 2 == parity {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        Ok(sum + d)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        assert!(LuhnToken::new("79927398713").is_valid());
        assert!(LuhnToken::new("4539578763621486").is_valid());
        assert_eq!(
            LuhnToken::new("79927398710").validate(),
            Err(LuhnError::InvalidChecksum)
        );
    }

    #[test]
    fn test_calculate_appends_check_digit() {
        let (check, full) = LuhnToken::new("7992739871").calculate().unwrap();
        assert_eq!(check, 3);
        assert_eq!(full, "79927398713");
        assert!(LuhnToken::new(full).is_valid());
    }

    #[test]
    fn test_generate_has_length_and_validates() {
        for length in [TICKET_TOKEN_LENGTH, VALIDATION_TOKEN_LENGTH, 2] {
            for _ in 0..200 {
                let token = LuhnToken::generate(length);
                assert_eq!(token.as_str().len(), length);
                assert!(token.as_str().bytes().all(|b| b.is_ascii_digit()));
                assert!(token.is_valid(), "{token} should validate");
            }
        }
    }

    #[test]
    fn test_single_digit_corruption_fails() {
        let token = LuhnToken::generate(TICKET_TOKEN_LENGTH);
        let mut bytes = token.as_str().as_bytes().to_vec();
        bytes[3] = if bytes[3] == b'9' { b'0' } else { bytes[3] + 1 };
        let corrupted = LuhnToken::new(String::from_utf8(bytes).unwrap());
        assert_eq!(corrupted.validate(), Err(LuhnError::InvalidChecksum));
    }

    #[test]
    fn test_rejects_non_digits_and_empty() {
        assert_eq!(LuhnToken::new("12a4").validate(), Err(LuhnError::NotANumber));
        assert_eq!(LuhnToken::new("").validate(), Err(LuhnError::NotANumber));
        assert_eq!(
            LuhnToken::new("12a4").calculate(),
            Err(LuhnError::NotANumber)
        );
    }
}
