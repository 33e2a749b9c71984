//! Catalog maintenance commands.
//!
//! Both commands operate on the same local cache directory as the running
//! server (`STOREFRONT_DATA_DIR`) and the remote store behind
//! `STOREFRONT_DATABASE_URL`.

use std::sync::Arc;

use thiserror::Error;

use dorodango_storefront::config::{ConfigError, MaintenanceConfig};
use dorodango_storefront::db::{self, PgCatalogRemote};
use dorodango_storefront::remote::CatalogRemote;
use dorodango_storefront::services::{
    CatalogError, MigrationOutcome, ProductCatalog, RemoteWriter, RetryPolicy,
};
use dorodango_storefront::storage::{FileStorage, StorageError};

#[derive(Debug, Error)]
pub enum CatalogCommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Local store error: {0}")]
    Storage(#[from] StorageError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

async fn open_catalog() -> Result<ProductCatalog, CatalogCommandError> {
    let config = MaintenanceConfig::from_env()?;

    tracing::info!("Connecting to storefront database...");
    let pool = db::create_pool(&config.database_url).await?;
    let remote: Arc<dyn CatalogRemote> = Arc::new(PgCatalogRemote::new(pool));
    let local = Arc::new(FileStorage::open(config.data_dir)?);

    let writer = RemoteWriter::spawn(
        Arc::clone(&remote),
        RetryPolicy {
            max_attempts: config.catalog.write_attempts,
            backoff: config.catalog.write_backoff,
        },
    );

    Ok(ProductCatalog::new(
        local,
        remote,
        writer,
        config.catalog.sync_policy,
    ))
}

/// Upload the default products to an empty remote store.
///
/// # Errors
///
/// Returns an error if the remote collection cannot be inspected.
pub async fn migrate() -> Result<(), CatalogCommandError> {
    let catalog = open_catalog().await?;

    match catalog.migrate().await? {
        MigrationOutcome::AlreadyMigrated => {
            tracing::info!("Catalog already migrated, nothing to do");
        }
        MigrationOutcome::Migrated { uploaded, failed } => {
            if failed > 0 {
                tracing::warn!(uploaded, failed, "Catalog migration finished with failures");
            } else {
                tracing::info!(uploaded, "Catalog migration complete!");
            }
        }
    }
    Ok(())
}

/// Merge the remote catalog into the local cache.
///
/// # Errors
///
/// Returns an error if the remote collection cannot be fetched.
pub async fn sync() -> Result<(), CatalogCommandError> {
    let catalog = open_catalog().await?;

    let loaded = catalog.load();
    tracing::info!(count = loaded.len(), policy = %catalog.policy(), "Local cache loaded");

    let report = catalog.sync_from_remote().await?;
    catalog.writer().flush().await;

    tracing::info!(
        appended = report.appended,
        replaced = report.replaced,
        total = catalog.products().len(),
        "Catalog sync complete!"
    );
    Ok(())
}
