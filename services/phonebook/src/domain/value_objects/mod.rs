//! 值对象

mod area_code;
mod cost;
mod local_number;
mod ordering;
mod password;
mod username;

pub use area_code::{AreaCode, AreaCodeError};
pub use cost::{Cost, CostError};
pub use local_number::{LocalNumber, LocalNumberError};
pub use ordering::{ListOrdering, SortField, SortOrder};
pub use password::{HashedPassword, Password, PasswordError, PasswordPolicy};
pub use username::{Username, UsernameError};

/// 定长纯 ASCII 数字
fn is_fixed_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}
