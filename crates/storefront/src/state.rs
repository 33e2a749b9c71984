//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::middleware::session::{InvalidSigningKey, SessionSigner};
use crate::remote::{AccountDirectory, CatalogRemote};
use crate::services::{AuthService, CheckoutService, MailRelay, ProductCatalog, RemoteWriter, RetryPolicy};
use crate::storage::LocalStore;

/// The storage and delivery backends the application runs against.
///
/// Production wires Postgres and the file store; tests pass the memory
/// implementations.
pub struct Backends {
    pub local: Arc<dyn LocalStore>,
    pub catalog: Arc<dyn CatalogRemote>,
    pub accounts: Arc<dyn AccountDirectory>,
    /// `None` when no relay credentials are configured.
    pub mail: Option<Arc<dyn MailRelay>>,
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Arc<ProductCatalog>,
    remote: Arc<dyn CatalogRemote>,
    auth: AuthService,
    checkout: CheckoutService,
    mail: Option<Arc<dyn MailRelay>>,
    signer: SessionSigner,
}

impl AppState {
    /// Create a new application state and start the remote writer.
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the session secret cannot key the signer.
    pub fn new(config: StorefrontConfig, backends: Backends) -> Result<Self, InvalidSigningKey> {
        let signer = SessionSigner::new(&config.session_secret, config.secure_cookies())?;

        let writer = RemoteWriter::spawn(
            Arc::clone(&backends.catalog),
            RetryPolicy {
                max_attempts: config.catalog.write_attempts,
                backoff: config.catalog.write_backoff,
            },
        );
        let catalog = ProductCatalog::new(
            backends.local,
            Arc::clone(&backends.catalog),
            writer,
            config.catalog.sync_policy,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                auth: AuthService::new(backends.accounts),
                checkout: CheckoutService::new(config.checkout_delay),
                catalog: Arc::new(catalog),
                remote: backends.catalog,
                mail: backends.mail,
                signer,
                config,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The product state container.
    #[must_use]
    pub fn catalog(&self) -> &Arc<ProductCatalog> {
        &self.inner.catalog
    }

    /// The remote product store, used for readiness checks.
    #[must_use]
    pub fn remote(&self) -> &Arc<dyn CatalogRemote> {
        &self.inner.remote
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }

    /// The contact relay, if one is configured.
    #[must_use]
    pub fn mail(&self) -> Option<&Arc<dyn MailRelay>> {
        self.inner.mail.as_ref()
    }

    #[must_use]
    pub fn signer(&self) -> &SessionSigner {
        &self.inner.signer
    }
}
