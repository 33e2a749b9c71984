//! Contact form route handler.
//!
//! Submissions are composed into a plain-text message, logged, and handed to
//! the mail relay.

use axum::{Json, extract::State};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use super::json::JsonBody;
use crate::error::{AppError, Result};
use crate::services::ContactSubmission;
use crate::state::AppState;

/// Response for form submission.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
}

/// `POST /contact`
#[instrument(skip(state, body))]
pub async fn submit(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<ContactResponse>> {
    let kind = body.get("type").and_then(Value::as_str);
    if !matches!(kind, Some("contribute" | "collaborate")) {
        return Err(AppError::BadRequest("Invalid type".to_owned()));
    }
    let submission: ContactSubmission = serde_json::from_value(body)
        .map_err(|_| AppError::BadRequest("Invalid form data".to_owned()))?;

    let mail_config = &state.config().mail;
    let mail = submission.to_mail(&mail_config.from, &mail_config.recipient);
    info!(
        kind = submission.kind(),
        to = %mail_config.recipient,
        subject = %mail.subject,
        body = %mail.text,
        "Contact form submitted"
    );

    let relay = state.mail().ok_or_else(|| {
        AppError::Configuration(
            "Email delivery is not configured. Set RESEND_API_KEY to enable the contact form."
                .to_owned(),
        )
    })?;
    relay.send(&mail).await?;

    info!(kind = submission.kind(), "Contact message delivered");
    Ok(Json(ContactResponse { success: true }))
}
