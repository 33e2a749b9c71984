//! Integration tests for the cart and checkout endpoints.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use dorodango_integration_tests::TestApp;

fn p1() -> Value {
    json!({
        "id": "p1",
        "name": "Botanical Canvas Tote",
        "artisan": "Priya Sharma",
        "price": 500,
        "image": "/images/product-2.jpg",
    })
}

#[tokio::test]
async fn test_add_twice_then_remove() {
    let app = TestApp::new();
    let browser = app.client();

    browser.post("/cart/add", p1()).await;
    let cart = browser.post("/cart/add", p1()).await.json();
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["quantity"], 2);
    assert_eq!(cart["count"], 2);
    assert_eq!(cart["total"].as_f64(), Some(1000.0));

    let cart = browser.post("/cart/remove", json!({"id": "p1"})).await.json();
    assert!(cart["items"].as_array().unwrap().is_empty());
    assert_eq!(cart["count"], 0);
    assert_eq!(cart["total"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn test_cart_survives_requests_and_is_per_browser() {
    let app = TestApp::new();
    let browser = app.client();

    let added = browser.post("/cart/add", p1()).await;
    assert!(added.set_cookie("doro_cart").is_some());

    let cart = browser.get("/cart").await.json();
    assert_eq!(cart["count"], 1);

    let other = app.client().get("/cart").await.json();
    assert_eq!(other, json!({"items": [], "total": 0.0, "count": 0}));
}

#[tokio::test]
async fn test_cart_survives_sign_in() {
    let app = TestApp::new();
    let browser = app.client();

    browser.post("/cart/add", p1()).await;
    browser.sign_up("Asha", "asha@example.com").await;
    browser.post("/auth", json!({"action": "logout"})).await;

    assert_eq!(browser.get("/cart").await.json()["count"], 1);
}

#[tokio::test]
async fn test_update_quantity() {
    let app = TestApp::new();
    let browser = app.client();
    browser.post("/cart/add", p1()).await;

    let cart = browser
        .post("/cart/update", json!({"id": "p1", "quantity": 5}))
        .await
        .json();
    assert_eq!(cart["count"], 5);
    assert_eq!(cart["total"].as_f64(), Some(2500.0));

    let cart = browser
        .post("/cart/update", json!({"id": "p1", "quantity": 0}))
        .await
        .json();
    assert_eq!(cart["count"], 0);
    assert!(cart["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_clear() {
    let app = TestApp::new();
    let browser = app.client();
    browser.post("/cart/add", p1()).await;

    let cart = browser.post("/cart/clear", json!({})).await.json();
    assert_eq!(cart["count"], 0);
}

#[tokio::test]
async fn test_checkout_empties_cart() {
    let app = TestApp::new();
    let browser = app.client();

    let empty = browser.post("/checkout", json!({"method": "upi"})).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.json(), json!({"error": "Cart is empty"}));

    browser.post("/cart/add", p1()).await;
    browser.post("/cart/add", p1()).await;

    let response = browser.post("/checkout", json!({"method": "card"})).await;
    assert_eq!(response.status, StatusCode::OK);
    let order = response.json()["order"].clone();
    assert_eq!(order["method"], "card");
    assert_eq!(order["count"], 2);
    assert_eq!(order["total"].as_f64(), Some(1000.0));
    assert!(order["orderId"].is_string());

    assert_eq!(browser.get("/cart").await.json()["count"], 0);
}

#[tokio::test]
async fn test_checkout_rejects_unknown_method() {
    let app = TestApp::new();
    let browser = app.client();
    browser.post("/cart/add", p1()).await;

    let response = browser.post("/checkout", json!({"method": "cheque"})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(browser.get("/cart").await.json()["count"], 1);
}
