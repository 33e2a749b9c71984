//! Dorodango Storefront - JSON storefront server.
//!
//! This binary serves the storefront API on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework serving JSON to the presentation layer
//! - `PostgreSQL` as the remote store for products, accounts and cart sessions
//! - A file-backed local cache that answers catalog reads before any network call
//! - Resend for contact form delivery (optional)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use tokio::sync::broadcast::error::RecvError;
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dorodango_storefront::config::StorefrontConfig;
use dorodango_storefront::db::{self, PgAccountDirectory, PgCatalogRemote};
use dorodango_storefront::services::{MailRelay, ResendClient};
use dorodango_storefront::state::{AppState, Backends};
use dorodango_storefront::storage::FileStorage;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
#[allow(clippy::expect_used)]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dorodango_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p dorodango-cli -- migrate

    let local = FileStorage::open(config.data_dir.clone()).expect("Failed to open local data directory");
    tracing::info!(dir = %local.dir().display(), "Local catalog cache opened");

    let mail: Option<Arc<dyn MailRelay>> = match &config.mail.resend_api_key {
        Some(key) => Some(Arc::new(
            ResendClient::new(key).expect("Failed to build Resend client"),
        )),
        None => {
            tracing::warn!("RESEND_API_KEY not set, contact form submissions will be rejected");
            None
        }
    };

    let state = AppState::new(
        config.clone(),
        Backends {
            local: Arc::new(local),
            catalog: Arc::new(PgCatalogRemote::new(pool.clone())),
            accounts: Arc::new(PgAccountDirectory::new(pool.clone())),
            mail,
        },
    )
    .expect("Failed to initialize application state");

    // Serve from the local cache immediately, merge the remote collection behind it
    let catalog = Arc::clone(state.catalog());
    let loaded = catalog.load();
    tracing::info!(count = loaded.len(), policy = %catalog.policy(), "Catalog ready");
    tokio::spawn(async move {
        let _ = catalog.sync_from_remote().await;
    });

    let mut failures = state.catalog().writer().subscribe();
    tokio::spawn(async move {
        loop {
            match failures.recv().await {
                Ok(failure) => tracing::warn!(
                    kind = failure.write.kind(),
                    product_id = %failure.write.product_id(),
                    attempts = failure.attempts,
                    error = %failure.error,
                    "Remote catalog write abandoned"
                ),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Missed remote write failure reports");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let session_store = PostgresStore::new(pool);

    let app = dorodango_storefront::app(state, session_store, true)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
