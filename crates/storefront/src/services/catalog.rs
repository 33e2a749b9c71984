//! Product catalog container.
//!
//! The catalog keeps a local cache of products that is read synchronously from
//! [`LocalStore`] and merged with the remote collection in the background.
//! Mutations are optimistic: they change the cache immediately, persist it,
//! and hand the remote write to the [`RemoteWriter`].
//!
//! ```text
//! Uninitialized --load()--> LocalLoaded --sync_from_remote()--> RemoteSynced
//! ```
//!
//! The cache sits behind a `parking_lot::RwLock` that is never held across an
//! `.await`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use dorodango_core::defaults::default_products;
use dorodango_core::{NewProduct, Product, ProductError, ProductId};

use super::writer::{RemoteWrite, RemoteWriter};
use crate::db::RepositoryError;
use crate::remote::CatalogRemote;
use crate::storage::{LocalStore, MIGRATED_KEY, PRODUCTS_KEY};

/// How remote records are merged into the local cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncPolicy {
    /// Append remote records whose id is unknown locally; never overwrite.
    #[default]
    AppendMissing,
    /// Also replace a local record when the remote copy is strictly newer.
    LastWriteWins,
}

impl FromStr for SyncPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append-missing" => Ok(Self::AppendMissing),
            "last-write-wins" => Ok(Self::LastWriteWins),
            other => Err(format!(
                "unknown sync policy '{other}' (expected append-missing or last-write-wins)"
            )),
        }
    }
}

impl fmt::Display for SyncPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AppendMissing => "append-missing",
            Self::LastWriteWins => "last-write-wins",
        })
    }
}

/// Lifecycle of the local cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CatalogState {
    Uninitialized,
    LocalLoaded,
    RemoteSynced,
}

/// What a sync changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub appended: usize,
    pub replaced: usize,
}

/// Result of the one-time migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    AlreadyMigrated,
    Migrated { uploaded: usize, failed: usize },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Invalid(#[from] ProductError),

    #[error("product not found: {0}")]
    NotFound(ProductId),

    #[error("remote store error: {0}")]
    Remote(#[from] RepositoryError),
}

struct Inner {
    products: Vec<Product>,
    state: CatalogState,
}

/// The product state container.
pub struct ProductCatalog {
    inner: RwLock<Inner>,
    store: Arc<dyn LocalStore>,
    remote: Arc<dyn CatalogRemote>,
    writer: RemoteWriter,
    policy: SyncPolicy,
}

impl ProductCatalog {
    #[must_use]
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn CatalogRemote>,
        writer: RemoteWriter,
        policy: SyncPolicy,
    ) -> Self {
        Self {
            inner: RwLock::new(Inner {
                products: Vec::new(),
                state: CatalogState::Uninitialized,
            }),
            store,
            remote,
            writer,
            policy,
        }
    }

    #[must_use]
    pub fn state(&self) -> CatalogState {
        self.inner.read().state
    }

    #[must_use]
    pub const fn policy(&self) -> SyncPolicy {
        self.policy
    }

    #[must_use]
    pub const fn writer(&self) -> &RemoteWriter {
        &self.writer
    }

    /// Load the cache from local storage, seeding defaults when it is empty.
    ///
    /// Never touches the network. Later calls return the current cache.
    pub fn load(&self) -> Vec<Product> {
        let mut inner = self.inner.write();
        if inner.state == CatalogState::Uninitialized {
            inner.products = self.read_snapshot();
            inner.state = CatalogState::LocalLoaded;
            info!(count = inner.products.len(), "Catalog loaded from local cache");
        }
        inner.products.clone()
    }

    /// Current products in display order.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.load()
    }

    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<Product> {
        self.load();
        self.inner.read().products.iter().find(|p| &p.id == id).cloned()
    }

    /// Merge the remote collection into the cache.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Remote` if the remote collection cannot be
    /// fetched; the cache is left untouched.
    #[instrument(skip(self), fields(policy = %self.policy))]
    pub async fn sync_from_remote(&self) -> Result<SyncReport, CatalogError> {
        self.load();

        let remote = match self.remote.list().await {
            Ok(products) => products,
            Err(e) => {
                warn!(error = %e, "Catalog sync failed, keeping local cache");
                return Err(e.into());
            }
        };

        let mut inner = self.inner.write();
        let report = merge(&mut inner.products, remote, self.policy);
        inner.state = CatalogState::RemoteSynced;
        self.persist(&inner.products);
        drop(inner);

        info!(
            appended = report.appended,
            replaced = report.replaced,
            "Catalog synced from remote"
        );
        Ok(report)
    }

    /// Create a product and queue its remote copy.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Invalid` if the submitted fields are incomplete.
    #[instrument(skip(self, submitted), fields(name = %submitted.name))]
    pub fn add_product(&self, submitted: NewProduct) -> Result<Product, CatalogError> {
        let product = Product::create(ProductId::generate(), submitted, Utc::now())?;

        self.load();
        let mut inner = self.inner.write();
        inner.products.insert(0, product.clone());
        self.persist(&inner.products);
        drop(inner);

        info!(product_id = %product.id, "Product added");
        self.writer.enqueue(RemoteWrite::Create(product.clone()));
        Ok(product)
    }

    /// Remove a product and queue its remote deletion.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the id is not in the local cache.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn remove_product(&self, id: &ProductId) -> Result<(), CatalogError> {
        self.load();
        let mut inner = self.inner.write();
        let Some(idx) = inner.products.iter().position(|p| &p.id == id) else {
            return Err(CatalogError::NotFound(id.clone()));
        };
        inner.products.remove(idx);
        self.persist(&inner.products);
        drop(inner);

        info!("Product removed");
        self.writer.enqueue(RemoteWrite::Delete(id.clone()));
        Ok(())
    }

    /// Upload the default catalog to an empty remote store, once.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Remote` if the remote collection cannot be
    /// inspected. Individual upload failures are counted, not returned.
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<MigrationOutcome, CatalogError> {
        if self.is_migrated() {
            return Ok(MigrationOutcome::AlreadyMigrated);
        }

        let existing = self.remote.list().await?;
        if !existing.is_empty() {
            info!(count = existing.len(), "Remote catalog already populated");
            self.mark_migrated();
            return Ok(MigrationOutcome::AlreadyMigrated);
        }

        let mut uploaded = 0;
        let mut failed = 0;
        for product in default_products() {
            match self.remote.create(&product).await {
                Ok(()) => uploaded += 1,
                Err(e) => {
                    error!(product_id = %product.id, error = %e, "Failed to upload product");
                    failed += 1;
                }
            }
        }
        self.mark_migrated();

        info!(uploaded, failed, "Catalog migration finished");
        Ok(MigrationOutcome::Migrated { uploaded, failed })
    }

    fn is_migrated(&self) -> bool {
        match self.store.get(MIGRATED_KEY) {
            Ok(flag) => flag.as_deref() == Some("true"),
            Err(e) => {
                warn!(error = %e, "Could not read migration flag");
                false
            }
        }
    }

    fn mark_migrated(&self) {
        if let Err(e) = self.store.set(MIGRATED_KEY, "true") {
            error!(error = %e, "Could not persist migration flag");
        }
    }

    fn read_snapshot(&self) -> Vec<Product> {
        let stored = match self.store.get(PRODUCTS_KEY) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Could not read catalog cache");
                None
            }
        };

        if let Some(raw) = stored {
            match serde_json::from_str::<Vec<Product>>(&raw) {
                Ok(products) => return products,
                Err(e) => warn!(error = %e, "Catalog cache is unreadable, reseeding defaults"),
            }
        }

        let products = default_products();
        self.persist(&products);
        products
    }

    fn persist(&self, products: &[Product]) {
        let result = serde_json::to_string(products)
            .map_err(|e| e.to_string())
            .and_then(|json| self.store.set(PRODUCTS_KEY, &json).map_err(|e| e.to_string()));
        if let Err(e) = result {
            error!(error = %e, "Could not persist catalog cache");
        }
    }
}

/// Merge `remote` into `local` according to `policy`.
fn merge(local: &mut Vec<Product>, remote: Vec<Product>, policy: SyncPolicy) -> SyncReport {
    let mut report = SyncReport::default();
    for incoming in remote {
        match local.iter_mut().find(|p| p.id == incoming.id) {
            Some(existing) => {
                if policy == SyncPolicy::LastWriteWins && incoming.updated_at > existing.updated_at
                {
                    *existing = incoming;
                    report.replaced += 1;
                }
            }
            None => {
                local.push(incoming);
                report.appended += 1;
            }
        }
    }
    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;
    use crate::remote::memory::MemoryCatalog;
    use crate::services::writer::RetryPolicy;
    use crate::storage::MemoryStorage;

    fn product(id: &str, name: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            artisan: "Meera Devi".to_owned(),
            price: Decimal::from(500),
            image: "/images/placeholder.jpg".to_owned(),
            images: Vec::new(),
            tag: None,
            description: "Upcycled".to_owned(),
            updated_at: Utc.timestamp_opt(1_000, 0).unwrap(),
        }
    }

    fn catalog(
        store: Arc<MemoryStorage>,
        remote: Arc<MemoryCatalog>,
        policy: SyncPolicy,
    ) -> ProductCatalog {
        let writer = RemoteWriter::spawn(
            remote.clone(),
            RetryPolicy {
                max_attempts: 1,
                backoff: Duration::from_millis(1),
            },
        );
        ProductCatalog::new(store, remote, writer, policy)
    }

    fn seed(store: &MemoryStorage, products: &[Product]) {
        store
            .set(PRODUCTS_KEY, &serde_json::to_string(products).unwrap())
            .unwrap();
    }

    #[test]
    fn test_merge_appends_missing_and_keeps_local() {
        let mut local = vec![product("a", "A"), product("b", "local B")];
        let remote = vec![product("b", "remote B"), product("c", "C")];

        let report = merge(&mut local, remote, SyncPolicy::AppendMissing);

        let names: Vec<&str> = local.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["A", "local B", "C"]);
        assert_eq!(report, SyncReport { appended: 1, replaced: 0 });
    }

    #[test]
    fn test_merge_last_write_wins_needs_strictly_newer() {
        let mut local = vec![product("a", "local A"), product("b", "local B")];
        let mut newer = product("a", "remote A");
        newer.updated_at = Utc.timestamp_opt(2_000, 0).unwrap();
        let same_age = product("b", "remote B");

        let report = merge(&mut local, vec![newer, same_age], SyncPolicy::LastWriteWins);

        assert_eq!(local[0].name, "remote A");
        assert_eq!(local[1].name, "local B");
        assert_eq!(report.replaced, 1);
    }

    #[test]
    fn test_sync_policy_parse() {
        assert_eq!("append-missing".parse(), Ok(SyncPolicy::AppendMissing));
        assert_eq!("Last-Write-Wins".parse(), Ok(SyncPolicy::LastWriteWins));
        assert!("newest".parse::<SyncPolicy>().is_err());
    }

    #[tokio::test]
    async fn test_load_seeds_defaults_and_persists() {
        let store = Arc::new(MemoryStorage::new());
        let catalog = catalog(store.clone(), Arc::new(MemoryCatalog::new()), SyncPolicy::default());
        assert_eq!(catalog.state(), CatalogState::Uninitialized);

        let products = catalog.load();
        assert_eq!(products.len(), 6);
        assert_eq!(catalog.state(), CatalogState::LocalLoaded);
        assert!(store.get(PRODUCTS_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_load_reseeds_unreadable_cache() {
        let store = Arc::new(MemoryStorage::new());
        store.set(PRODUCTS_KEY, "{broken").unwrap();
        let catalog = catalog(store, Arc::new(MemoryCatalog::new()), SyncPolicy::default());
        assert_eq!(catalog.load(), default_products());
    }

    #[tokio::test]
    async fn test_sync_merges_remote_records() {
        let store = Arc::new(MemoryStorage::new());
        seed(&store, &[product("a", "A"), product("b", "local B")]);
        let remote = Arc::new(MemoryCatalog::with_products(vec![
            product("b", "remote B"),
            product("c", "C"),
        ]));
        let catalog = catalog(store.clone(), remote, SyncPolicy::AppendMissing);

        catalog.sync_from_remote().await.unwrap();

        let ids: Vec<String> = catalog
            .products()
            .into_iter()
            .map(|p| p.id.into_inner())
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(catalog.get(&ProductId::new("b")).unwrap().name, "local B");
        assert_eq!(catalog.state(), CatalogState::RemoteSynced);

        let cached: Vec<Product> =
            serde_json::from_str(&store.get(PRODUCTS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(cached.len(), 3);
    }

    #[tokio::test]
    async fn test_sync_failure_leaves_cache_untouched() {
        let store = Arc::new(MemoryStorage::new());
        seed(&store, &[product("a", "A")]);
        let remote = Arc::new(MemoryCatalog::with_products(vec![product("z", "Z")]));
        remote.set_offline(true);
        let catalog = catalog(store, remote, SyncPolicy::AppendMissing);

        assert!(matches!(
            catalog.sync_from_remote().await,
            Err(CatalogError::Remote(_))
        ));
        assert_eq!(catalog.products().len(), 1);
        assert_eq!(catalog.state(), CatalogState::LocalLoaded);
    }

    #[tokio::test]
    async fn test_add_product_prepends_and_reaches_remote() {
        let store = Arc::new(MemoryStorage::new());
        let remote = Arc::new(MemoryCatalog::new());
        let catalog = catalog(store, remote.clone(), SyncPolicy::default());

        let created = catalog
            .add_product(NewProduct {
                name: "Kantha Throw".to_owned(),
                artisan: "Meera Devi".to_owned(),
                price: Some(Decimal::from(1499)),
                description: "Layered saris".to_owned(),
                tag: Some("New".to_owned()),
                images: Vec::new(),
            })
            .unwrap();

        assert_eq!(catalog.products()[0].id, created.id);
        assert_eq!(catalog.products().len(), 7);

        catalog.writer().flush().await;
        assert_eq!(remote.snapshot(), vec![created]);
    }

    #[tokio::test]
    async fn test_add_product_survives_remote_failure() {
        let remote = Arc::new(MemoryCatalog::new());
        remote.set_offline(true);
        let catalog = catalog(Arc::new(MemoryStorage::new()), remote, SyncPolicy::default());
        let mut failures = catalog.writer().subscribe();

        let created = catalog
            .add_product(NewProduct {
                name: "Tote".to_owned(),
                artisan: "Priya Sharma".to_owned(),
                price: Some(Decimal::from(899)),
                description: "Canvas".to_owned(),
                ..NewProduct::default()
            })
            .unwrap();
        catalog.writer().flush().await;

        assert!(catalog.get(&created.id).is_some());
        assert_eq!(failures.try_recv().unwrap().write.product_id(), &created.id);
    }

    #[tokio::test]
    async fn test_add_product_rejects_missing_fields() {
        let catalog = catalog(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryCatalog::new()),
            SyncPolicy::default(),
        );
        assert!(matches!(
            catalog.add_product(NewProduct::default()),
            Err(CatalogError::Invalid(ProductError::MissingFields))
        ));
        assert_eq!(catalog.products().len(), 6);
    }

    #[tokio::test]
    async fn test_remove_product() {
        let remote = Arc::new(MemoryCatalog::with_products(default_products()));
        let catalog = catalog(Arc::new(MemoryStorage::new()), remote.clone(), SyncPolicy::default());

        catalog.remove_product(&ProductId::new("2")).unwrap();
        assert!(catalog.get(&ProductId::new("2")).is_none());
        assert!(matches!(
            catalog.remove_product(&ProductId::new("2")),
            Err(CatalogError::NotFound(_))
        ));

        catalog.writer().flush().await;
        assert_eq!(remote.snapshot().len(), 5);
    }

    #[tokio::test]
    async fn test_migrate_uploads_defaults_once() {
        let store = Arc::new(MemoryStorage::new());
        let remote = Arc::new(MemoryCatalog::new());
        let catalog = catalog(store.clone(), remote.clone(), SyncPolicy::default());

        assert_eq!(
            catalog.migrate().await.unwrap(),
            MigrationOutcome::Migrated { uploaded: 6, failed: 0 }
        );
        assert_eq!(remote.snapshot().len(), 6);
        assert_eq!(store.get(MIGRATED_KEY).unwrap().as_deref(), Some("true"));

        assert_eq!(catalog.migrate().await.unwrap(), MigrationOutcome::AlreadyMigrated);
        assert_eq!(remote.write_calls(), 6);
    }

    #[tokio::test]
    async fn test_migrate_is_noop_for_populated_remote() {
        let store = Arc::new(MemoryStorage::new());
        let remote = Arc::new(MemoryCatalog::with_products(vec![product("x", "X")]));
        let catalog = catalog(store.clone(), remote.clone(), SyncPolicy::default());

        assert_eq!(catalog.migrate().await.unwrap(), MigrationOutcome::AlreadyMigrated);
        assert_eq!(remote.write_calls(), 0);
        assert_eq!(store.get(MIGRATED_KEY).unwrap().as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn test_migrate_reports_partial_failure() {
        let remote = Arc::new(MemoryCatalog::new());
        remote.fail_next_writes(2);
        let catalog = catalog(Arc::new(MemoryStorage::new()), remote, SyncPolicy::default());

        assert_eq!(
            catalog.migrate().await.unwrap(),
            MigrationOutcome::Migrated { uploaded: 4, failed: 2 }
        );
    }
}
