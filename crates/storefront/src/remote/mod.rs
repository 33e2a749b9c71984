//! Remote store ports.
//!
//! The catalog and account services talk to the authoritative store only
//! through these traits. `crate::db` provides the `PostgreSQL` adapters and
//! [`memory`] provides in-process adapters for tests and local tooling.

use async_trait::async_trait;

use dorodango_core::{AccountId, Email, Product, ProductId};

use crate::db::RepositoryError;
use crate::models::{Account, NewAccount};

pub mod memory;

/// The remote product collection.
#[async_trait]
pub trait CatalogRemote: Send + Sync {
    /// Fetch the full collection, newest first.
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Store a new product record.
    ///
    /// Returns `RepositoryError::Conflict` if the id is taken.
    async fn create(&self, product: &Product) -> Result<(), RepositoryError>;

    /// Delete a product record. Deleting an unknown id is not an error.
    async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError>;

    /// Cheap connectivity probe for readiness checks.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// The remote account directory.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError>;

    async fn find_by_uid(&self, uid: &AccountId) -> Result<Option<Account>, RepositoryError>;

    /// Create a password account.
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    async fn create(&self, account: NewAccount) -> Result<Account, RepositoryError>;

    /// Create or merge a profile-only account keyed by `uid`.
    ///
    /// Returns `RepositoryError::Conflict` if the uid belongs to a password
    /// account or the email is held by another uid. Password accounts are left
    /// untouched.
    async fn upsert_profile(
        &self,
        uid: &AccountId,
        name: &str,
        email: &Email,
    ) -> Result<Account, RepositoryError>;
}
