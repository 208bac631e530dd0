//! 响应 DTO

use serde::Serialize;

use crate::domain::entities::PhoneNumber;
use crate::domain::value_objects::Cost;

/// 公开搜索结果
#[derive(Debug, Serialize)]
pub struct PhoneNumberResponse {
    pub area_code: String,
    pub local_number: String,
    pub full_number: String,
    pub cost: Cost,
}

impl From<PhoneNumber> for PhoneNumberResponse {
    fn from(number: PhoneNumber) -> Self {
        Self {
            full_number: number.full_number(),
            area_code: number.area_code.into(),
            local_number: number.local_number.into(),
            cost: number.cost,
        }
    }
}

/// 后台行，附带主键
#[derive(Debug, Serialize)]
pub struct DashboardRow {
    pub id: i64,
    #[serde(flatten)]
    pub number: PhoneNumberResponse,
}

impl From<PhoneNumber> for DashboardRow {
    fn from(number: PhoneNumber) -> Self {
        Self {
            id: number.id.0,
            number: number.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{NewPhoneNumber, PhoneNumberId};
    use crate::domain::value_objects::{AreaCode, LocalNumber};

    #[test]
    fn test_dashboard_row_shape() {
        let number = NewPhoneNumber::new(
            AreaCode::new("123").unwrap(),
            LocalNumber::new("5551234").unwrap(),
            Cost::parse("2.5").unwrap(),
        )
        .into_entity(PhoneNumberId(7));

        let json = serde_json::to_value(DashboardRow::from(number)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "area_code": "123",
                "local_number": "5551234",
                "full_number": "1235551234",
                "cost": "2.50"
            })
        );
    }
}
