//! Integration tests for the contact endpoint.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use dorodango_integration_tests::{Mail, TestApp};

fn contribution() -> Value {
    json!({
        "type": "contribute",
        "name": "Asha",
        "location": "Pune",
        "mobile": "9820000000",
        "email": "asha@example.com",
        "clothesType": "Sarees",
    })
}

#[tokio::test]
async fn test_contribution_is_relayed() {
    let app = TestApp::new();

    let response = app.client().post("/contact", contribution()).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"success": true}));

    let sent = app.relay.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["dorodango.org@gmail.com".to_owned()]);
    assert_eq!(sent[0].subject, "[Dorodango] New Contribution from Asha");
    assert!(sent[0].text.contains("Type of Clothes: Sarees"));
}

#[tokio::test]
async fn test_collaboration_is_relayed() {
    let app = TestApp::new();

    let response = app
        .client()
        .post(
            "/contact",
            json!({
                "type": "collaborate",
                "name": "Ravi",
                "location": "Jaipur",
                "artForms": ["Block printing"],
                "experience": "10 years",
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let sent = app.relay.sent();
    assert_eq!(sent[0].subject, "[Dorodango] New Collaboration from Ravi");
    assert!(sent[0].text.contains("Social Media: Not provided"));
}

#[tokio::test]
async fn test_unknown_type_is_rejected() {
    let app = TestApp::new();

    let response = app
        .client()
        .post("/contact", json!({"type": "volunteer", "name": "X"}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json(), json!({"error": "Invalid type"}));
    assert!(app.relay.sent().is_empty());
}

#[tokio::test]
async fn test_malformed_fields_are_not_reported_as_bad_type() {
    let app = TestApp::new();

    let response = app
        .client()
        .post(
            "/contact",
            json!({"type": "collaborate", "name": "Meera", "artForms": "Kantha"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json(), json!({"error": "Invalid form data"}));
    assert!(app.relay.sent().is_empty());
}

#[tokio::test]
async fn test_missing_relay_is_a_configuration_error() {
    let app = TestApp::with_mail(Mail::Missing);

    let response = app.client().post("/contact", contribution()).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        response.json()["error"]
            .as_str()
            .unwrap()
            .contains("RESEND_API_KEY")
    );
}

#[tokio::test]
async fn test_relay_failure_is_reported() {
    let app = TestApp::new();
    app.relay.set_failing(true);

    let response = app.client().post("/contact", contribution()).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json(), json!({"error": "Failed to send message"}));
}
