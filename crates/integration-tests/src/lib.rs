//! HTTP-level test harness for the Dorodango storefront.
//!
//! Builds the real router in-process against the memory backends and a
//! `tower_sessions::MemoryStore`, then drives it with `tower::ServiceExt::oneshot`.
//! A [`TestClient`] plays one browser: it keeps the cookies the server sets and
//! sends them back on the next request.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p dorodango-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use parking_lot::Mutex;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use tower_sessions::cookie::Cookie;

use dorodango_storefront::config::{CatalogConfig, MailConfig, StorefrontConfig};
use dorodango_storefront::remote::memory::{MemoryCatalog, MemoryDirectory};
use dorodango_storefront::services::{MailError, MailRelay, OutgoingMail};
use dorodango_storefront::state::{AppState, Backends};
use dorodango_storefront::storage::MemoryStorage;

/// Mail relay that records what it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingRelay {
    sent: Mutex<Vec<OutgoingMail>>,
    failing: Mutex<bool>,
}

impl RecordingRelay {
    #[must_use]
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().clone()
    }

    /// Reject every message until switched back.
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }
}

#[async_trait]
impl MailRelay for RecordingRelay {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        if *self.failing.lock() {
            return Err(MailError::Api {
                status: 502,
                message: "relay rejected the message".to_owned(),
            });
        }
        self.sent.lock().push(mail.clone());
        Ok(())
    }
}

/// Whether the app gets a mail relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mail {
    Configured,
    Missing,
}

/// The storefront wired to memory backends.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub catalog: Arc<MemoryCatalog>,
    pub accounts: Arc<MemoryDirectory>,
    pub relay: Arc<RecordingRelay>,
}

impl TestApp {
    /// Build the app with a mail relay. Must run inside a tokio runtime.
    #[must_use]
    pub fn new() -> Self {
        Self::with_mail(Mail::Configured)
    }

    #[must_use]
    pub fn with_mail(mail: Mail) -> Self {
        let catalog = Arc::new(MemoryCatalog::new());
        let accounts = Arc::new(MemoryDirectory::new());
        let relay = Arc::new(RecordingRelay::default());

        let mail_relay: Option<Arc<dyn MailRelay>> = match mail {
            Mail::Configured => Some(relay.clone()),
            Mail::Missing => None,
        };

        let state = AppState::new(
            test_config(),
            Backends {
                local: Arc::new(MemoryStorage::new()),
                catalog: catalog.clone(),
                accounts: accounts.clone(),
                mail: mail_relay,
            },
        )
        .unwrap();

        let router = dorodango_storefront::app(state.clone(), MemoryStore::default(), false);

        Self {
            router,
            state,
            catalog,
            accounts,
            relay,
        }
    }

    /// A fresh browser with no cookies.
    #[must_use]
    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookies: Mutex::new(BTreeMap::new()),
        }
    }

    /// Wait until queued remote catalog writes have been applied.
    pub async fn settle_writes(&self) {
        self.state.catalog().writer().flush().await;
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/unused"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3000,
        base_url: "http://localhost:3000".to_owned(),
        session_secret: SecretString::from("k3Yq9-Tz!vR2mW7#pL4sN8@xC1bH6&dF"),
        data_dir: PathBuf::from("unused"),
        catalog: CatalogConfig {
            write_backoff: Duration::from_millis(1),
            ..CatalogConfig::default()
        },
        checkout_delay: Duration::ZERO,
        mail: MailConfig::default(),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A response with its body already read.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
}

impl TestResponse {
    /// Parse the body as JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).unwrap()
    }

    /// The `Set-Cookie` header for `name`, if any.
    #[must_use]
    pub fn set_cookie(&self, name: &str) -> Option<Cookie<'static>> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| Cookie::parse(v.to_owned()).ok())
            .find(|c| c.name() == name)
    }
}

/// One browser talking to the app.
pub struct TestClient {
    router: Router,
    cookies: Mutex<BTreeMap<String, String>>,
}

impl TestClient {
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None).await
    }

    /// Set a raw cookie, bypassing the server.
    pub fn set_cookie(&self, name: &str, value: &str) {
        self.cookies.lock().insert(name.to_owned(), value.to_owned());
    }

    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.lock().get(name).cloned()
    }

    /// Sign up and keep the resulting session.
    pub async fn sign_up(&self, name: &str, email: &str) -> TestResponse {
        let response = self
            .post(
                "/auth",
                serde_json::json!({
                    "action": "signup",
                    "name": name,
                    "email": email,
                    "password": "x",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "signup failed: {}", response.text);
        response
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        let cookie_header = self
            .cookies
            .lock()
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        if !cookie_header.is_empty() {
            builder = builder.header(header::COOKIE, cookie_header);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        let response = TestResponse {
            status,
            headers,
            text: String::from_utf8(bytes.to_vec()).unwrap(),
        };
        self.store_cookies(&response);
        response
    }

    fn store_cookies(&self, response: &TestResponse) {
        let mut jar = self.cookies.lock();
        for value in response.headers.get_all(header::SET_COOKIE) {
            let Some(cookie) = value.to_str().ok().and_then(|v| Cookie::parse(v.to_owned()).ok())
            else {
                continue;
            };
            let expired = cookie.max_age().is_some_and(|age| age.is_zero() || age.is_negative());
            if expired {
                jar.remove(cookie.name());
            } else {
                jar.insert(cookie.name().to_owned(), cookie.value().to_owned());
            }
        }
    }
}
