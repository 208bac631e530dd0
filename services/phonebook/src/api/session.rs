//! 后台会话：登录、登出、会话中间件与当前用户提取器

use axum::extract::{FromRequestParts, Query, Request, State};
use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use phonebook_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::dto::MessageResponse;
use crate::api::state::AppState;
use crate::application::LoginCommand;
use crate::domain::entities::DashboardUser;

/// 已通过会话校验的操作员
///
/// 只能用在挂了 [`require_session`] 的路由上
#[derive(Debug, Clone)]
pub struct CurrentUser(pub DashboardUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}

/// 依次从 `Authorization: Bearer` 和会话 Cookie 中取令牌
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// 会话中间件
///
/// 未登录的 GET 请求跳转到登录页，其余方法返回 401
pub async fn require_session(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let Some(token) = extract_token(request.headers(), &state.session.cookie_name) else {
        debug!(path = %request.uri().path(), "No session token");
        return deny(&request);
    };

    match state.accounts.authenticate(&token).await {
        Ok(user) => {
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        Err(e) if e.status_code() >= 500 => e.into_response(),
        Err(e) => {
            warn!(error = %e, path = %request.uri().path(), "Session rejected");
            deny(&request)
        }
    }
}

fn deny(request: &Request) -> Response {
    if request.method() == Method::GET || request.method() == Method::HEAD {
        let target = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        Redirect::to(&format!("/login?next={}", urlencoding::encode(target))).into_response()
    } else {
        AppError::unauthorized("Authentication required").into_response()
    }
}

/// 只接受站内相对路径，防止开放重定向
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path,
        _ => "/",
    }
}

#[derive(Debug, Deserialize)]
pub struct NextParam {
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginPage<'a> {
    fields: [&'static str; 2],
    next: &'a str,
}

/// 登录页：已登录时直接跳到 `next`
pub async fn login_page(State(state): State<AppState>, headers: HeaderMap, Query(params): Query<NextParam>) -> Response {
    let next = safe_next(params.next.as_deref());
    if let Some(token) = extract_token(&headers, &state.session.cookie_name) {
        if state.accounts.authenticate(&token).await.is_ok() {
            return Redirect::to(next).into_response();
        }
    }
    Json(LoginPage {
        fields: ["username", "password"],
        next,
    })
    .into_response()
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub username: String,
}

pub async fn login(State(state): State<AppState>, Json(command): Json<LoginCommand>) -> AppResult<Response> {
    let session = state.accounts.login(&command).await?;
    let cookie = state.session.set_cookie(&session.token);
    let body = LoginResponse {
        token: session.token,
        expires_in: session.expires_in,
        username: session.user.username.to_string(),
    };
    Ok(([(SET_COOKIE, cookie)], Json(body)).into_response())
}

pub async fn logout(State(state): State<AppState>) -> Response {
    (
        [(SET_COOKIE, state.session.clear_cookie())],
        Json(MessageResponse::new("Signed out.")),
    )
        .into_response()
}
