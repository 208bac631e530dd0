//! LocalNumber 值对象

use std::fmt;

use serde::{Deserialize, Serialize};

use super::is_fixed_digits;

/// 七位数字本地号码，保留前导零
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocalNumber(String);

impl LocalNumber {
    pub const LEN: usize = 7;

    pub fn new(value: impl Into<String>) -> Result<Self, LocalNumberError> {
        let value = value.into();
        if !is_fixed_digits(&value, Self::LEN) {
            return Err(LocalNumberError::InvalidFormat);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 按十进制整数解释，用于距离计算
    pub fn numeric_value(&self) -> u32 {
        self.0
            .bytes()
            .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'))
    }

    /// 与另一个号码的绝对数值距离
    pub fn distance_to(&self, other: &LocalNumber) -> u32 {
        self.numeric_value().abs_diff(other.numeric_value())
    }
}

impl TryFrom<String> for LocalNumber {
    type Error = LocalNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LocalNumber> for String {
    fn from(value: LocalNumber) -> Self {
        value.0
    }
}

impl fmt::Display for LocalNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocalNumberError {
    #[error("Local number must be exactly 7 digits.")]
    InvalidFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_zeros_are_kept() {
        let number = LocalNumber::new("0000042").unwrap();
        assert_eq!(number.as_str(), "0000042");
        assert_eq!(number.numeric_value(), 42);
    }

    #[test]
    fn test_rejects_invalid() {
        for bad in ["", "555123", "55512345", "555-123", "555123x"] {
            assert!(LocalNumber::new(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = LocalNumber::new("5551234").unwrap();
        let b = LocalNumber::new("5551200").unwrap();
        assert_eq!(a.distance_to(&b), 34);
        assert_eq!(b.distance_to(&a), 34);
        assert_eq!(a.distance_to(&a), 0);
    }
}
