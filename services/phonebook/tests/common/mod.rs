//! 集成测试公共工具：内存 Repository + 真实路由
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Request, Response};
use phonebook::api::{AppState, SessionSettings, router};
use phonebook::application::{AccountHandler, CatalogHandler};
use phonebook::domain::entities::{NewPhoneNumber, PhoneNumber};
use phonebook::domain::repositories::PhoneNumberRepository;
use phonebook::domain::value_objects::{AreaCode, Cost, LocalNumber};
use phonebook::infrastructure::persistence::{InMemoryPhoneNumberRepository, InMemoryUserRepository};
use phonebook_auth_core::TokenService;
use serde_json::Value;
use tower::ServiceExt;

pub const OPERATOR: &str = "operator";
pub const OPERATOR_PASSWORD: &str = "Harbor-Lights-42";
pub const COOKIE_NAME: &str = "phonebook_session";
const SESSION_SECRET: &str = "integration-test-session-secret-0123456789";
const BOUNDARY: &str = "phonebook-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub numbers: Arc<InMemoryPhoneNumberRepository>,
}

impl TestApp {
    pub async fn new() -> Self {
        let numbers = Arc::new(InMemoryPhoneNumberRepository::new());
        let users = Arc::new(InMemoryUserRepository::new());
        let tokens = Arc::new(TokenService::new(
            SESSION_SECRET,
            3600,
            "phonebook".to_string(),
            "phonebook-dashboard".to_string(),
        ));

        let accounts = Arc::new(AccountHandler::new(users, tokens));
        accounts
            .ensure_admin(OPERATOR, OPERATOR_PASSWORD)
            .await
            .expect("operator should be created");

        let catalog = Arc::new(CatalogHandler::new(numbers.clone()));
        let session = SessionSettings {
            cookie_name: COOKIE_NAME.to_string(),
            secure: false,
            max_age: 3600,
        };

        Self {
            router: router(AppState::new(catalog, accounts, session)),
            numbers,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.expect("router is infallible")
    }

    /// 登录并返回 `name=value` 形式的 Cookie
    pub async fn login_as(&self, password: &str) -> Response<Body> {
        self.send(post_json(
            "/login",
            None,
            serde_json::json!({ "username": OPERATOR, "password": password }),
        ))
        .await
    }

    pub async fn login(&self) -> String {
        let response = self.login_as(OPERATOR_PASSWORD).await;
        assert_eq!(response.status(), 200);
        session_cookie(&response).expect("login sets a session cookie")
    }

    pub async fn seed(&self, area_code: &str, local_number: &str, cost: &str) -> PhoneNumber {
        self.numbers
            .insert(&NewPhoneNumber::new(
                AreaCode::new(area_code).unwrap(),
                LocalNumber::new(local_number).unwrap(),
                Cost::parse(cost).unwrap(),
            ))
            .await
            .unwrap()
    }

    pub async fn count(&self) -> u64 {
        self.numbers.count().await.unwrap()
    }
}

pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn get_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn post_empty(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// 构造单文件 multipart 上传
pub fn post_file(
    uri: &str,
    cookie: Option<&str>,
    field: &str,
    file_name: &str,
    content_type: &str,
    contents: &[u8],
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            field, file_name, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY));
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

pub fn upload_csv(cookie: &str, contents: &[u8]) -> Request<Body> {
    post_file("/upload/", Some(cookie), "csv_file", "numbers.csv", "text/csv", contents)
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}
