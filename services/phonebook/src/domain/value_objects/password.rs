//! Password 值对象
//!
//! 操作员密码策略与 Argon2 哈希

use std::fmt;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use phonebook_errors::AppError;

/// 常见弱密码（小写匹配，包含即拒绝）
const COMMON_PASSWORDS: &[&str] = &[
    "password", "123456", "12345678", "qwerty", "abc123", "monkey", "letmein", "trustno1",
    "dragon", "baseball", "111111", "iloveyou", "master", "sunshine", "passw0rd", "shadow",
    "123123", "654321", "superman", "qazwsx", "football", "welcome", "admin", "changeme",
];

/// 密码策略
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
    /// 小写、大写、数字、特殊字符中至少出现几类
    pub min_complexity_types: usize,
    pub check_common_passwords: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            min_complexity_types: 2,
            check_common_passwords: true,
        }
    }
}

/// 明文密码（仅用于校验）
pub struct Password;

impl Password {
    /// 按策略校验；`username` 用于拒绝与用户名相近的密码
    pub fn validate(password: &str, username: Option<&str>, policy: &PasswordPolicy) -> Result<(), PasswordError> {
        let length = password.chars().count();
        if length < policy.min_length {
            return Err(PasswordError::TooShort(policy.min_length));
        }
        if length > policy.max_length {
            return Err(PasswordError::TooLong(policy.max_length));
        }

        let lowercase = password.to_lowercase();
        if let Some(username) = username {
            let username = username.to_lowercase();
            if username.chars().count() >= 3
                && (lowercase.contains(&username) || username.contains(&lowercase))
            {
                return Err(PasswordError::SimilarToUsername);
            }
        }

        if policy.check_common_passwords && COMMON_PASSWORDS.iter().any(|common| lowercase.contains(common)) {
            return Err(PasswordError::CommonPassword);
        }

        if password.chars().all(|c| c.is_ascii_digit()) {
            return Err(PasswordError::EntirelyNumeric);
        }

        let has_lowercase = password.chars().any(|c| c.is_lowercase());
        let has_uppercase = password.chars().any(|c| c.is_uppercase());
        let has_digit = password.chars().any(|c| c.is_numeric());
        let has_special = password.chars().any(|c| !c.is_alphanumeric());
        let found_types = [has_lowercase, has_uppercase, has_digit, has_special]
            .iter()
            .filter(|&&x| x)
            .count();

        if found_types < policy.min_complexity_types {
            return Err(PasswordError::TooWeak {
                required_types: policy.min_complexity_types,
                found_types,
            });
        }

        Ok(())
    }
}

/// Argon2 PHC 格式的密码哈希
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// 校验后哈希
    pub fn from_plain(plain: &str, username: Option<&str>, policy: &PasswordPolicy) -> Result<Self, PasswordError> {
        Password::validate(plain, username, policy)?;
        Self::hash(plain)
    }

    fn hash(plain: &str) -> Result<Self, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?
            .to_string();
        Ok(Self(hash))
    }

    pub fn verify(&self, plain: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(&self.0).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;
        Ok(Argon2::default().verify_password(plain.as_bytes(), &parsed).is_ok())
    }

    pub fn from_hash(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("This password is too short. It must contain at least {0} characters.")]
    TooShort(usize),

    #[error("This password is too long. It must contain at most {0} characters.")]
    TooLong(usize),

    #[error("The password is too similar to the username.")]
    SimilarToUsername,

    #[error("This password is too common.")]
    CommonPassword,

    #[error("This password is entirely numeric.")]
    EntirelyNumeric,

    #[error("This password is too weak: use at least {required_types} of lowercase, uppercase, digits and symbols (found {found_types}).")]
    TooWeak { required_types: usize, found_types: usize },

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash: {0}")]
    InvalidHash(String),
}

impl PasswordError {
    /// 策略违规（用户可修正）还是内部故障
    pub fn is_policy_violation(&self) -> bool {
        !matches!(self, Self::HashingFailed(_) | Self::InvalidHash(_))
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        if err.is_policy_violation() {
            AppError::validation(err.to_string())
        } else {
            AppError::internal(err.to_string())
        }
    }
}
