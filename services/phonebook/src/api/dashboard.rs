//! 后台接口（均需会话）

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use phonebook_errors::{AppError, AppResult, FieldErrors};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::dto::{DashboardRow, MessageResponse};
use crate::api::session::CurrentUser;
use crate::api::state::AppState;
use crate::application::{ChangePasswordCommand, ImportSummary, ListQuery, PhoneNumberForm};
use crate::domain::entities::PhoneNumberId;
use crate::domain::value_objects::{SortField, SortOrder};

/// 上传表单字段名
pub const CSV_FIELD: &str = "csv_file";

/// 浏览器上传 CSV 时常见的 Content-Type
const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "text/csv",
    "application/csv",
    "application/vnd.ms-excel",
    "text/plain",
    "application/octet-stream",
];

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub items: Vec<DashboardRow>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub serial_start: u64,
    pub sort: SortField,
    pub order: SortOrder,
}

pub async fn home(State(state): State<AppState>, Query(params): Query<ListParams>) -> AppResult<Json<ListResponse>> {
    let query = ListQuery::parse(params.sort.as_deref(), params.order.as_deref(), params.page.as_deref());
    let result = state.catalog.list(&query).await?;
    let serial_start = result.page.serial_start();
    let page = result.page.map(DashboardRow::from);

    Ok(Json(ListResponse {
        items: page.items,
        total: page.total,
        page: page.page,
        page_size: page.page_size,
        total_pages: page.total_pages,
        serial_start,
        sort: result.ordering.sort,
        order: result.ordering.order,
    }))
}

pub async fn create(
    State(state): State<AppState>,
    Json(form): Json<PhoneNumberForm>,
) -> AppResult<(StatusCode, Json<DashboardRow>)> {
    let created = state.catalog.create(&form).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn edit_form(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<DashboardRow>> {
    let number = state.catalog.get(PhoneNumberId(id)).await?;
    Ok(Json(number.into()))
}

pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<PhoneNumberForm>,
) -> AppResult<Json<DashboardRow>> {
    let updated = state.catalog.update(PhoneNumberId(id), &form).await?;
    Ok(Json(updated.into()))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<MessageResponse>> {
    state.catalog.delete(PhoneNumberId(id)).await?;
    Ok(Json(MessageResponse::new("Phone number deleted.")))
}

#[derive(Debug, Serialize)]
pub struct DeleteAllPrompt {
    pub count: u64,
    pub confirm_required: bool,
}

pub async fn delete_all_prompt(State(state): State<AppState>) -> AppResult<Json<DeleteAllPrompt>> {
    Ok(Json(DeleteAllPrompt {
        count: state.catalog.count().await?,
        confirm_required: true,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteAllRequest {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteAllResponse {
    pub deleted: u64,
    pub message: String,
}

/// 请求体为空视为未确认
pub async fn delete_all(State(state): State<AppState>, body: Bytes) -> AppResult<Json<DeleteAllResponse>> {
    let request: DeleteAllRequest = if body.is_empty() {
        DeleteAllRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::validation(format!("Invalid request body: {}", e)))?
    };

    let deleted = state.catalog.delete_all(request.confirm).await?;
    Ok(Json(DeleteAllResponse {
        deleted,
        message: format!("Removed {} phone numbers.", deleted),
    }))
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    #[serde(flatten)]
    pub summary: ImportSummary,
    pub message: &'static str,
}

/// 校验上传文件的 Content-Type 与扩展名
fn check_upload(file_name: Option<&str>, content_type: Option<&str>) -> Result<(), FieldErrors> {
    if let Some(content_type) = content_type.filter(|c| !c.is_empty()) {
        if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
            return Err(FieldErrors::single(CSV_FIELD, "Upload a valid CSV file."));
        }
    }
    let has_csv_extension = file_name.is_some_and(|name| name.to_lowercase().ends_with(".csv"));
    if !has_csv_extension {
        return Err(FieldErrors::single(CSV_FIELD, "File extension must be .csv"));
    }
    Ok(())
}

pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> AppResult<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(CSV_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        check_upload(file_name.as_deref(), content_type.as_deref())?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Failed to read upload: {}", e)))?;
        info!(file_name = ?file_name, size = bytes.len(), "CSV upload received");

        let summary = state.catalog.import_csv(&bytes).await?;
        return Ok(Json(UploadResponse {
            message: summary.message(),
            summary,
        }));
    }

    Err(FieldErrors::single(CSV_FIELD, "This field is required.").into())
}

/// 修改成功后清除 Cookie，需要重新登录
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(command): Json<ChangePasswordCommand>,
) -> AppResult<Response> {
    state.accounts.change_password(&user, &command).await?;
    Ok((
        [(SET_COOKIE, state.session.clear_cookie())],
        Json(MessageResponse::new(
            "Password updated. Please sign in with your new password.",
        )),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_upload() {
        assert!(check_upload(Some("numbers.CSV"), Some("text/csv")).is_ok());
        assert!(check_upload(Some("numbers.csv"), None).is_ok());
        assert!(check_upload(Some("numbers.csv"), Some("application/octet-stream")).is_ok());

        let err = check_upload(Some("numbers.csv"), Some("image/png")).unwrap_err();
        assert_eq!(err.get(CSV_FIELD), Some("Upload a valid CSV file."));

        let err = check_upload(Some("numbers.txt"), Some("text/plain")).unwrap_err();
        assert_eq!(err.get(CSV_FIELD), Some("File extension must be .csv"));

        assert!(check_upload(None, None).is_err());
    }
}
