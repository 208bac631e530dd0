//! 后台表单命令

use phonebook_errors::FieldErrors;
use serde::Deserialize;

use crate::domain::entities::NewPhoneNumber;
use crate::domain::value_objects::{AreaCode, Cost, LocalNumber};

const REQUIRED: &str = "This field is required.";

/// JSON 中的费用既可以是字符串也可以是数字
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CostInput {
    Text(String),
    Number(serde_json::Number),
}

impl CostInput {
    fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => n.to_string(),
        }
    }
}

/// 新建/编辑号码
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhoneNumberForm {
    #[serde(default)]
    pub area_code: Option<String>,
    #[serde(default)]
    pub local_number: Option<String>,
    #[serde(default)]
    pub cost: Option<CostInput>,
}

impl PhoneNumberForm {
    /// 逐字段校验（先去除首尾空白），错误一起收集
    pub fn validate(&self) -> Result<NewPhoneNumber, FieldErrors> {
        let mut errors = FieldErrors::new();

        let area_code = match required(self.area_code.as_deref()) {
            None => {
                errors.add("area_code", REQUIRED);
                None
            }
            Some(value) => AreaCode::new(value)
                .map_err(|e| errors.add("area_code", e.to_string()))
                .ok(),
        };

        let local_number = match required(self.local_number.as_deref()) {
            None => {
                errors.add("local_number", REQUIRED);
                None
            }
            Some(value) => LocalNumber::new(value)
                .map_err(|e| errors.add("local_number", e.to_string()))
                .ok(),
        };

        let cost = match self.cost.as_ref().map(CostInput::as_text).filter(|s| !s.is_empty()) {
            None => {
                errors.add("cost", REQUIRED);
                None
            }
            Some(value) => Cost::parse_exact(&value)
                .map_err(|e| errors.add("cost", e.to_string()))
                .ok(),
        };

        match (area_code, local_number, cost) {
            (Some(area_code), Some(local_number), Some(cost)) => {
                Ok(NewPhoneNumber::new(area_code, local_number, cost))
            }
            _ => Err(errors),
        }
    }
}

fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// 登录
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginCommand {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// 修改密码
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangePasswordCommand {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_new_password: String,
}

impl ChangePasswordCommand {
    /// 与账号无关的检查：必填与两次输入一致
    pub fn check_fields(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for (field, value) in [
            ("current_password", &self.current_password),
            ("new_password", &self.new_password),
            ("confirm_new_password", &self.confirm_new_password),
        ] {
            if value.is_empty() {
                errors.add(field, REQUIRED);
            }
        }
        if !self.new_password.is_empty()
            && !self.confirm_new_password.is_empty()
            && self.new_password != self.confirm_new_password
        {
            errors.add("confirm_new_password", "New passwords do not match.");
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(json: &str) -> PhoneNumberForm {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_valid_form_trims_and_accepts_numeric_cost() {
        let number = form(r#"{"area_code": " 415 ", "local_number": "5550100", "cost": 2.5}"#)
            .validate()
            .unwrap();
        assert_eq!(number.area_code.as_str(), "415");
        assert_eq!(number.cost.to_string(), "2.50");

        let number = form(r#"{"area_code": "415", "local_number": "5550100", "cost": "0.99"}"#)
            .validate()
            .unwrap();
        assert_eq!(number.cost.to_string(), "0.99");
    }

    #[test]
    fn test_field_errors_are_collected() {
        let errors = form(r#"{"area_code": "41", "local_number": "55501x0", "cost": "cheap"}"#)
            .validate()
            .unwrap_err();
        assert_eq!(errors.get("area_code"), Some("Area code must be exactly 3 digits."));
        assert_eq!(errors.get("local_number"), Some("Local number must be exactly 7 digits."));
        assert_eq!(errors.get("cost"), Some("Enter a number."));
    }

    #[test]
    fn test_required_fields() {
        let errors = form(r#"{"area_code": "  "}"#).validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("area_code"), Some(REQUIRED));
    }

    #[test]
    fn test_cost_with_three_places_rejected() {
        let errors = form(r#"{"area_code": "415", "local_number": "5550100", "cost": "1.005"}"#)
            .validate()
            .unwrap_err();
        assert_eq!(
            errors.get("cost"),
            Some("Ensure that there are no more than 2 decimal places.")
        );
    }

    #[test]
    fn test_password_confirmation_mismatch() {
        let cmd = ChangePasswordCommand {
            current_password: "old".into(),
            new_password: "Harbor-Lights-42".into(),
            confirm_new_password: "Harbor-Lights-43".into(),
        };
        let errors = cmd.check_fields();
        assert_eq!(errors.get("confirm_new_password"), Some("New passwords do not match."));
    }
}
