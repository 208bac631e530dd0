//! 公开搜索接口

mod common;

use common::{TestApp, body_json, get};
use serde_json::json;

#[tokio::test]
async fn test_area_codes_are_distinct_and_sorted() {
    let app = TestApp::new().await;
    app.seed("415", "5550001", "1.00").await;
    app.seed("212", "5550001", "1.00").await;
    app.seed("415", "5550002", "1.00").await;

    let response = app.send(get("/api/area-codes/", None)).await;
    assert_eq!(response.status(), 200);
    assert_eq!(body_json(response).await, json!({ "area_codes": ["212", "415"] }));
}

#[tokio::test]
async fn test_search_without_matches_returns_empty_list() {
    let app = TestApp::new().await;

    let response = app.send(get("/api/search/?area_code=123&digits=5551234", None)).await;
    assert_eq!(response.status(), 200);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_search_ranks_by_distance_within_area_code() {
    let app = TestApp::new().await;
    app.seed("123", "5551300", "1.00").await;
    app.seed("123", "5551268", "2.5").await;
    app.seed("123", "5551200", "3.00").await;
    app.seed("999", "5551234", "9.00").await;

    let response = app.send(get("/api/search/?area_code=123&digits=5551234", None)).await;
    assert_eq!(response.status(), 200);

    let body = body_json(response).await;
    let locals: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["local_number"].as_str().unwrap())
        .collect();
    assert_eq!(locals, vec!["5551200", "5551268", "5551300"]);
    assert_eq!(
        body[1],
        json!({
            "area_code": "123",
            "local_number": "5551268",
            "full_number": "1235551268",
            "cost": "2.50"
        })
    );
}

#[tokio::test]
async fn test_search_honours_top() {
    let app = TestApp::new().await;
    for i in 0..5 {
        app.seed("305", &format!("00000{:02}", i), "1.00").await;
    }

    let response = app.send(get("/api/search/?area_code=305&digits=0000000&top=2", None)).await;
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["local_number"], "0000000");
    assert_eq!(body[1]["local_number"], "0000001");
}

#[tokio::test]
async fn test_invalid_parameters_are_reported_together() {
    let app = TestApp::new().await;

    let response = app.send(get("/api/search/?area_code=12&digits=abc&top=500", None)).await;
    assert_eq!(response.status(), 400);
    assert_eq!(
        body_json(response).await,
        json!({
            "area_code": "area_code must be exactly 3 digits.",
            "digits": "digits must be exactly 7 digits.",
            "top": "top must be between 1 and 100."
        })
    );
}

#[tokio::test]
async fn test_missing_parameters() {
    let app = TestApp::new().await;

    let response = app.send(get("/api/search/", None)).await;
    assert_eq!(response.status(), 400);
    let body = body_json(response).await;
    assert!(body.get("area_code").is_some());
    assert!(body.get("digits").is_some());
    assert!(body.get("top").is_none());
}

#[tokio::test]
async fn test_non_integer_top() {
    let app = TestApp::new().await;

    let response = app.send(get("/api/search/?area_code=123&digits=5551234&top=ten", None)).await;
    assert_eq!(response.status(), 400);
    assert_eq!(
        body_json(response).await,
        json!({ "top": "top must be an integer between 1 and 100." })
    );
}

#[tokio::test]
async fn test_public_responses_carry_security_headers() {
    let app = TestApp::new().await;

    let response = app.send(get("/api/area-codes/", None)).await;
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
    assert_eq!(response.headers().get("x-content-type-options").unwrap(), "nosniff");
}

#[tokio::test]
async fn test_health_and_readiness() {
    let app = TestApp::new().await;

    let response = app.send(get("/health", None)).await;
    assert_eq!(response.status(), 200);
    assert_eq!(body_json(response).await["status"], "healthy");

    let response = app.send(get("/ready", None)).await;
    assert_eq!(response.status(), 200);
    assert_eq!(body_json(response).await["healthy"], true);

    // 未安装 exporter 时不暴露 /metrics
    let response = app.send(get("/metrics", None)).await;
    assert_eq!(response.status(), 404);
}
