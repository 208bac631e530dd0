//! Username 值对象

use std::fmt;

use serde::Serialize;

/// 操作员用户名：3-150 个字符，字母、数字及 `@.+-_`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn new(username: impl Into<String>) -> Result<Self, UsernameError> {
        let username = username.into();
        let length = username.chars().count();

        if length < 3 {
            return Err(UsernameError::TooShort);
        }
        if length > 150 {
            return Err(UsernameError::TooLong);
        }
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            return Err(UsernameError::InvalidCharacters);
        }

        Ok(Self(username))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsernameError {
    #[error("Username is too short (minimum 3 characters)")]
    TooShort,

    #[error("Username is too long (maximum 150 characters)")]
    TooLong,

    #[error("Username may contain only letters, digits and @/./+/-/_ characters")]
    InvalidCharacters,
}
