//! End-to-end tests driving the router over in-memory SQLite.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use inventory_api::{
    app_router,
    config::AppConfig,
    db::{self, DbConfig},
    AppState,
};

async fn test_app() -> Router {
    let cfg = AppConfig::new(
        "sqlite::memory:".to_string(),
        "127.0.0.1".to_string(),
        8000,
        "test".to_string(),
    );
    let config = DbConfig {
        url: cfg.connection_url(),
        max_connections: 1,
        min_connections: 1,
        acquire_timeout: Duration::from_secs(8),
        ..Default::default()
    };
    let conn = db::establish_connection_with_config(&config)
        .await
        .expect("db connect");
    db::run_migrations(&conn).await.expect("migrations");

    app_router(AppState {
        db: Arc::new(conn),
        config: cfg,
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("request");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn post_item(app: &Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/items/")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    send(app, request).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    send(app, request).await
}

#[tokio::test]
async fn create_then_update_then_aggregate() {
    let app = test_app().await;

    // First write creates the row
    let (status, body) = post_item(
        &app,
        json!({"name": "Pen", "category": "Stationary", "price": 10.5}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let first_id = body["id"].as_str().expect("id").to_string();
    assert_eq!(first_id.len(), 36, "canonical hyphenated form");

    // Second write for the same name updates in place, same id
    let (status, body) = post_item(
        &app,
        json!({"name": "Pen", "category": "Stationary", "price": 12.0}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"].as_str(), Some(first_id.as_str()));

    // One group, updated total, single row
    let (status, body) = get(&app, "/items-by-category/?category=Stationary").await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["category"], "Stationary");
    assert_eq!(items[0]["total_price"], "12.00");
    assert_eq!(items[0]["count"], 1);
}

#[tokio::test]
async fn category_all_and_empty_marker() {
    let app = test_app().await;

    post_item(
        &app,
        json!({"name": "Pen", "category": "Stationary", "price": 10.5}),
    )
    .await;
    post_item(
        &app,
        json!({"name": "Lamp", "category": "Furniture", "price": 40}),
    )
    .await;

    let (status, body) = get(&app, "/items-by-category/?category=all").await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().expect("items");
    assert_eq!(items.len(), 2);
    // Lexicographic group order
    assert_eq!(items[0]["category"], "Furniture");
    assert_eq!(items[1]["category"], "Stationary");

    // Unknown category: 200 with a message, not an empty items list
    let (status, body) = get(&app, "/items-by-category/?category=Garden").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("items").is_none());
    assert_eq!(body["message"], "No items found for category: Garden");
}

#[tokio::test]
async fn date_range_lists_items_with_total() {
    let app = test_app().await;

    post_item(
        &app,
        json!({"name": "Pen", "category": "Stationary", "price": 10.5}),
    )
    .await;
    post_item(
        &app,
        json!({"name": "Notebook", "category": "Stationary", "price": 3.25}),
    )
    .await;

    let (status, body) = get(
        &app,
        "/items/?dt_from=2020-01-01T00:00:00Z&dt_to=2099-01-01T00:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().expect("items");
    assert_eq!(items.len(), 2);
    for item in items {
        let id = item["id"].as_str().expect("id");
        assert_eq!(id.len(), 36, "ids are decoded to canonical form");
    }
    assert_eq!(body["total_price"], "13.75");

    // A range with no matches yields the explicit message payload
    let (status, body) = get(
        &app,
        "/items/?dt_from=2000-01-01T00:00:00Z&dt_to=2000-12-31T00:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("items").is_none());
    assert_eq!(
        body["message"],
        "No items found within the specified date range"
    );
}

#[tokio::test]
async fn rejects_invalid_create_payloads() {
    let app = test_app().await;

    // Negative price fails validation before any write
    let (status, body) = post_item(
        &app,
        json!({"name": "Pen", "category": "Stationary", "price": -1}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");

    // Empty name fails validation
    let (status, _) = post_item(
        &app,
        json!({"name": "", "category": "Stationary", "price": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Missing fields are rejected by deserialization
    let (status, _) = post_item(&app, json!({"name": "Pen"})).await;
    assert!(status.is_client_error());

    // Nothing was written
    let (_, body) = get(&app, "/items-by-category/?category=all").await;
    assert!(body.get("items").is_none());
}

#[tokio::test]
async fn health_reports_database_status() {
    let app = test_app().await;

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
    assert_eq!(body["database"], "up");
}
