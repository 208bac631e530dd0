//! 运维接口

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use phonebook_adapter_postgres::check_connection;
use phonebook_telemetry::HealthStatus;
use serde_json::json;

use crate::api::state::AppState;

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// 数据库不可达时返回 503
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let mut status = HealthStatus::new();
    match &state.database {
        Some(pool) => match check_connection(pool).await {
            Ok(latency) => status.add_check("postgres", true, Some(format!("{}ms", latency.as_millis()))),
            Err(e) => status.add_check("postgres", false, Some(e.to_string())),
        },
        None => status.add_check("storage", true, Some("in-memory".to_string())),
    }

    let code = if status.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

/// Prometheus 文本格式
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
