//! Cost 值对象
//!
//! 对应 NUMERIC(10, 2)：两位小数，最多八位整数

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};

/// 小数位数
const SCALE: u32 = 2;
/// 整数部分上限（10^8）
const INTEGER_LIMIT: i64 = 100_000_000;

/// 号码费用
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cost(Decimal);

impl Cost {
    /// 宽松解析：超出两位的小数按四舍五入截断
    pub fn parse(input: &str) -> Result<Self, CostError> {
        let value = parse_decimal(input)?;
        Self::from_decimal(value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero))
    }

    /// 严格解析：小数超过两位视为错误
    pub fn parse_exact(input: &str) -> Result<Self, CostError> {
        let value = parse_decimal(input)?;
        if value.normalize().scale() > SCALE {
            return Err(CostError::TooManyDecimalPlaces);
        }
        Self::from_decimal(value)
    }

    fn from_decimal(value: Decimal) -> Result<Self, CostError> {
        if value.abs() >= Decimal::from(INTEGER_LIMIT) {
            return Err(CostError::TooLarge);
        }
        Ok(Self::from_stored(value))
    }

    /// 从数据库读出的值（已满足列约束）
    pub fn from_stored(mut value: Decimal) -> Self {
        value.rescale(SCALE);
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

fn parse_decimal(input: &str) -> Result<Decimal, CostError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CostError::Invalid);
    }
    Decimal::from_str(input)
        .or_else(|_| Decimal::from_scientific(input))
        .map_err(|_| CostError::Invalid)
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Cost {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CostError {
    #[error("Enter a number.")]
    Invalid,

    #[error("Ensure that there are no more than 2 decimal places.")]
    TooManyDecimalPlaces,

    #[error("Ensure that there are no more than 8 digits before the decimal point.")]
    TooLarge,
}
