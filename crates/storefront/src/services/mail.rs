//! Outbound mail relay.
//!
//! Contact submissions are delivered through the Resend HTTP API. The relay
//! sits behind [`MailRelay`] so that handlers can be exercised without a
//! network.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;

/// Resend API base URL.
const BASE_URL: &str = "https://api.resend.com";

/// Errors that can occur when handing a message to the relay.
#[derive(Debug, Error)]
pub enum MailError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Client could not be built from the configuration.
    #[error("Invalid mail configuration: {0}")]
    Config(String),
}

/// A plain-text message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
}

/// Something that can deliver an [`OutgoingMail`].
#[async_trait]
pub trait MailRelay: Send + Sync {
    /// Deliver a message.
    ///
    /// # Errors
    ///
    /// Returns `MailError` if the relay rejects or cannot receive the message.
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    text: &'a str,
}

/// Resend API client.
#[derive(Clone)]
pub struct ResendClient {
    client: reqwest::Client,
    base_url: String,
}

impl ResendClient {
    /// Create a new Resend client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(api_key: &SecretString) -> Result<Self, MailError> {
        Self::with_base_url(api_key, BASE_URL)
    }

    /// Create a client against a different API host.
    ///
    /// # Errors
    ///
    /// See [`ResendClient::new`].
    pub fn with_base_url(api_key: &SecretString, base_url: &str) -> Result<Self, MailError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", api_key.expose_secret());
        let mut auth = HeaderValue::from_str(&auth_value)
            .map_err(|e| MailError::Config(format!("Invalid API key format: {e}")))?;
        auth.set_sensitive(true);
        headers.insert("Authorization", auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }
}

#[async_trait]
impl MailRelay for ResendClient {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let url = format!("{}/emails", self.base_url);
        let body = SendEmailRequest {
            from: &mail.from,
            to: &mail.to,
            subject: &mail.subject,
            text: &mail.text,
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let to = vec!["dorodango.org@gmail.com".to_owned()];
        let body = SendEmailRequest {
            from: "Dorodango ReFashion <onboarding@resend.dev>",
            to: &to,
            subject: "Hello",
            text: "Body",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["to"][0], "dorodango.org@gmail.com");
        assert_eq!(json["subject"], "Hello");
    }

    #[test]
    fn test_rejects_api_key_with_newline() {
        let key = SecretString::from("re_123\nInjected: yes");
        assert!(matches!(ResendClient::new(&key), Err(MailError::Config(_))));
    }
}
