//! AreaCode 值对象

use std::fmt;

use serde::{Deserialize, Serialize};

use super::is_fixed_digits;

/// 三位数字区号
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AreaCode(String);

impl AreaCode {
    pub const LEN: usize = 3;

    pub fn new(value: impl Into<String>) -> Result<Self, AreaCodeError> {
        let value = value.into();
        if !is_fixed_digits(&value, Self::LEN) {
            return Err(AreaCodeError::InvalidFormat);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AreaCode {
    type Error = AreaCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AreaCode> for String {
    fn from(value: AreaCode) -> Self {
        value.0
    }
}

impl fmt::Display for AreaCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AreaCodeError {
    #[error("Area code must be exactly 3 digits.")]
    InvalidFormat,
}
