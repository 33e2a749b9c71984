//! Dorodango Storefront library.
//!
//! JSON storefront for a textile-upcycling studio: product catalog with a
//! local cache and background sync, cookie-based sessions, a per-browser cart,
//! simulated checkout and the contact form relay. The crate is a library so the
//! router can be driven in-process by tests and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod remote;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;

use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::SessionStore;
use tracing::Span;

use crate::middleware::{create_session_layer, request_id_middleware};
use crate::state::AppState;

/// Build the storefront router with its middleware stack.
///
/// `store` backs the cart sessions. Sentry layers are left to the binary.
pub fn app<S>(state: AppState, store: S, rate_limit: bool) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(store, state.config().secure_cookies());

    routes::routes(rate_limit)
        .layer(session_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
