//! Integration tests for health checks and request correlation.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use dorodango_integration_tests::TestApp;

#[tokio::test]
async fn test_liveness() {
    let app = TestApp::new();

    let response = app.client().get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text, "ok");
    assert!(response.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_readiness_follows_remote_store() {
    let app = TestApp::new();
    let browser = app.client();

    assert_eq!(browser.get("/health/ready").await.status, StatusCode::OK);

    app.catalog.set_offline(true);
    assert_eq!(
        browser.get("/health/ready").await.status,
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn test_catalog_reads_survive_remote_outage() {
    let app = TestApp::new();
    app.catalog.set_offline(true);

    assert!(app.state.catalog().sync_from_remote().await.is_err());

    let response = app.client().get("/products").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["products"].as_array().unwrap().len(), 6);
}
