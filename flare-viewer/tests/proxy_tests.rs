//! Integration tests for the upstream proxy routes
//!
//! The real reqwest clients run against a local fake upstream, so these cover
//! the full path: browser request → proxy route → HTTP client → upstream →
//! transport envelope → browser response.

mod helpers;

use axum::{
    body::Body,
    extract::Query,
    http::{header, Request, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

use flare_common::config::ApiKey;
use flare_viewer::upstream::{build_http_client, DonkiClient, HelioviewerClient};
use flare_viewer::{build_router, AppState};
use helpers::spawn_server;

const TEST_KEY: &str = "TEST_KEY_0123456789";
const JOB_ID: &str = "abc123";

/// Every byte value, so any text re-encoding would corrupt it
fn screenshot_bytes() -> Vec<u8> {
    (0..=255u8).chain([0xFF, 0xD8, 0xFF, 0x00]).collect()
}

async fn echo(Query(params): Query<HashMap<String, String>>) -> Json<HashMap<String, String>> {
    Json(params)
}

async fn download(Query(params): Query<HashMap<String, String>>) -> axum::response::Response {
    if params.get("id").map(String::as_str) == Some(JOB_ID) {
        ([(header::CONTENT_TYPE, "image/jpeg")], screenshot_bytes()).into_response()
    } else {
        (StatusCode::NOT_FOUND, "No screenshot with that id").into_response()
    }
}

fn fake_upstream() -> Router {
    Router::new()
        .route("/DONKI/FLR", get(echo))
        .route("/v2/getClosestImage/", get(echo))
        .route("/v2/takeScreenshot/", get(echo))
        .route("/v2/downloadScreenshot/", get(download))
}

fn app_for(base_url: &str) -> Router {
    let client = build_http_client(Some(Duration::from_secs(5))).expect("Should build client");
    let flares = Arc::new(DonkiClient::new(
        client.clone(),
        format!("{}/DONKI", base_url),
        ApiKey::new(TEST_KEY),
    ));
    let imagery = Arc::new(HelioviewerClient::new(client, format!("{}/v2", base_url)));
    build_router(AppState::new(flares, imagery, 1))
}

async fn setup_app() -> Router {
    let base_url = spawn_server(fake_upstream()).await;
    app_for(&base_url)
}

/// Base URL of a port nothing listens on
async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body")
        .to_vec()
}

async fn body_text(response: axum::response::Response) -> String {
    String::from_utf8(body_bytes(response).await).expect("Should be UTF-8")
}

fn allow_origin(response: &axum::response::Response) -> Option<&str> {
    response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .and_then(|v| v.to_str().ok())
}

// =============================================================================
// Helioviewer proxy
// =============================================================================

#[tokio::test]
async fn test_screenshot_bytes_arrive_unchanged() {
    let app = setup_app().await;

    let response = app
        .oneshot(get_request(&format!(
            "/api/helioviewer?endpoint=downloadScreenshot&id={}",
            JOB_ID
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(allow_origin(&response), Some("*"));
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/jpeg"
    );
    assert_eq!(body_bytes(response).await, screenshot_bytes());
}

#[tokio::test]
async fn test_parameters_forwarded_without_endpoint() {
    let app = setup_app().await;

    let response = app
        .oneshot(get_request(
            "/api/helioviewer?endpoint=getClosestImage&date=2023-01-01T12:34:00Z&sourceId=14",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["date"], "2023-01-01T12:34:00Z");
    assert_eq!(body["sourceId"], "14");
    assert!(body.get("endpoint").is_none());
}

#[tokio::test]
async fn test_upstream_status_passes_through() {
    let app = setup_app().await;

    let response = app
        .oneshot(get_request(
            "/api/helioviewer?endpoint=downloadScreenshot&id=unknown",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(allow_origin(&response), Some("*"));
}

#[tokio::test]
async fn test_missing_endpoint_rejected() {
    let app = setup_app().await;

    let response = app
        .oneshot(get_request("/api/helioviewer?id=abc123"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(allow_origin(&response), Some("*"));
    assert_eq!(body_text(response).await, "Missing endpoint parameter");
}

#[tokio::test]
async fn test_unknown_endpoint_rejected() {
    let app = setup_app().await;

    let response = app
        .oneshot(get_request("/api/helioviewer?endpoint=getJP2Image&id=1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Unknown endpoint: getJP2Image");
}

#[tokio::test]
async fn test_helioviewer_unreachable() {
    let app = app_for(&unreachable_base_url().await);

    let response = app
        .oneshot(get_request(
            "/api/helioviewer?endpoint=getClosestImage&date=2023-01-01T00:00:00Z&sourceId=14",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(allow_origin(&response), Some("*"));
    assert!(body_text(response)
        .await
        .starts_with("Helioviewer proxy error:"));
}

// =============================================================================
// DONKI proxy
// =============================================================================

#[tokio::test]
async fn test_server_key_attached() {
    let app = setup_app().await;

    let response = app
        .oneshot(get_request(
            "/api/donki?startDate=2023-01-01&endDate=2023-01-07",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(allow_origin(&response), Some("*"));
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["startDate"], "2023-01-01");
    assert_eq!(body["endDate"], "2023-01-07");
    assert_eq!(body["api_key"], TEST_KEY);
}

#[tokio::test]
async fn test_missing_dates_rejected() {
    let app = setup_app().await;

    let response = app
        .oneshot(get_request("/api/donki?startDate=2023-01-01"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(allow_origin(&response), Some("*"));
    assert_eq!(
        body_text(response).await,
        "Missing startDate or endDate parameter"
    );
}

#[tokio::test]
async fn test_donki_unreachable_hides_key() {
    let app = app_for(&unreachable_base_url().await);

    let response = app
        .oneshot(get_request(
            "/api/donki?startDate=2023-01-01&endDate=2023-01-07",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_text(response).await;
    assert!(body.starts_with("DONKI proxy error:"));
    assert!(!body.contains(TEST_KEY));
}

// =============================================================================
// Non-proxy routes
// =============================================================================

#[tokio::test]
async fn test_cors_header_scoped_to_proxy() {
    let app = setup_app().await;

    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(allow_origin(&response), None);
}
