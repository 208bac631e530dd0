//! phonebook-errors - 统一错误处理
//!
//! 基于 RFC 7807 Problem Details 规范；字段级校验错误以扁平 JSON 对象返回

use std::collections::BTreeMap;
use std::fmt;

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// 字段级校验错误集合
///
/// 同一请求的所有字段错误一起收集，不在第一个错误处短路
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录字段错误；同一字段只保留第一条
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid fields: {0}")]
    InvalidFields(FieldErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) | Self::InvalidFields(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Conflict(_) => 409,
            Self::Internal(_) | Self::Database(_) => 500,
        }
    }

    /// 转换为 Problem Details
    ///
    /// 5xx 错误不向客户端暴露内部信息
    pub fn to_problem_details(&self) -> ProblemDetails {
        let detail = match self {
            Self::Internal(_) | Self::Database(_) => "Internal server error".to_string(),
            Self::NotFound(m)
            | Self::Validation(m)
            | Self::Unauthorized(m)
            | Self::Conflict(m) => m.clone(),
            Self::InvalidFields(fields) => fields.to_string(),
        };

        ProblemDetails {
            r#type: format!("https://phonebook.local/problems/{}", self.problem_slug()),
            title: self.problem_title().to_string(),
            status: self.status_code(),
            detail,
            instance: None,
        }
    }

    fn problem_slug(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not-found",
            Self::Validation(_) | Self::InvalidFields(_) => "validation",
            Self::Unauthorized(_) => "unauthorized",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal",
            Self::Database(_) => "database",
        }
    }

    fn problem_title(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "Resource Not Found",
            Self::Validation(_) | Self::InvalidFields(_) => "Validation Error",
            Self::Unauthorized(_) => "Unauthorized",
            Self::Conflict(_) => "Conflict",
            Self::Internal(_) | Self::Database(_) => "Internal Server Error",
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        Self::InvalidFields(errors)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if let Self::InvalidFields(fields) = self {
            return (status, Json(fields)).into_response();
        }

        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = self.to_problem_details();
        (
            status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            Json(body),
        )
            .into_response()
    }
}

/// RFC 7807 Problem Details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_keep_first_message() {
        let mut errors = FieldErrors::new();
        errors.add("area_code", "first");
        errors.add("area_code", "second");
        errors.add("digits", "bad");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("area_code"), Some("first"));
    }

    #[test]
    fn test_field_errors_serialize_flat() {
        let errors = FieldErrors::single("top", "top must be between 1 and 100.");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({"top": "top must be between 1 and 100."}));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::conflict("dup").status_code(), 409);
        assert_eq!(AppError::not_found("x").status_code(), 404);
        assert_eq!(AppError::from(FieldErrors::single("a", "b")).status_code(), 400);
        assert_eq!(AppError::database("boom").status_code(), 500);
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let problem = AppError::database("relation \"phone_numbers\" does not exist").to_problem_details();
        assert_eq!(problem.detail, "Internal server error");
        assert_eq!(problem.status, 500);
    }

    #[tokio::test]
    async fn test_invalid_fields_response_is_flat_object() {
        let response = AppError::from(FieldErrors::single("digits", "bad")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, serde_json::json!({"digits": "bad"}));
    }
}
