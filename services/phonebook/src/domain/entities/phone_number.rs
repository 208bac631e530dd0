//! PhoneNumber 实体

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{AreaCode, Cost, LocalNumber};

/// 号码代理主键
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumberId(pub i64);

/// 目录中的一条号码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber {
    pub id: PhoneNumberId,
    pub area_code: AreaCode,
    pub local_number: LocalNumber,
    pub cost: Cost,
}

impl PhoneNumber {
    /// 区号与本地号码拼接的十位完整号码
    pub fn full_number(&self) -> String {
        format!("{}{}", self.area_code, self.local_number)
    }

    pub fn same_key(&self, area_code: &AreaCode, local_number: &LocalNumber) -> bool {
        &self.area_code == area_code && &self.local_number == local_number
    }
}

/// 已校验、尚未持久化的号码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhoneNumber {
    pub area_code: AreaCode,
    pub local_number: LocalNumber,
    pub cost: Cost,
}

impl NewPhoneNumber {
    pub fn new(area_code: AreaCode, local_number: LocalNumber, cost: Cost) -> Self {
        Self {
            area_code,
            local_number,
            cost,
        }
    }

    pub fn into_entity(self, id: PhoneNumberId) -> PhoneNumber {
        PhoneNumber {
            id,
            area_code: self.area_code,
            local_number: self.local_number,
            cost: self.cost,
        }
    }
}
