//! 公开只读接口

use axum::Json;
use axum::extract::{Query, State};
use phonebook_errors::AppResult;
use serde::{Deserialize, Serialize};

use crate::api::dto::PhoneNumberResponse;
use crate::api::state::AppState;
use crate::application::SearchQuery;
use crate::domain::value_objects::AreaCode;

#[derive(Debug, Serialize)]
pub struct AreaCodesResponse {
    pub area_codes: Vec<AreaCode>,
}

pub async fn area_codes(State(state): State<AppState>) -> AppResult<Json<AreaCodesResponse>> {
    let area_codes = state.catalog.area_codes().await?;
    Ok(Json(AreaCodesResponse { area_codes }))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub area_code: Option<String>,
    pub digits: Option<String>,
    pub top: Option<String>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<PhoneNumberResponse>>> {
    let query = SearchQuery::parse(
        params.area_code.as_deref(),
        params.digits.as_deref(),
        params.top.as_deref(),
    )?;
    let results = state.catalog.search(&query).await?;
    Ok(Json(results.into_iter().map(PhoneNumberResponse::from).collect()))
}
