//! In-memory remote store adapters.
//!
//! Both adapters can be told to fail, which lets tests exercise the sync,
//! migration and background write paths without a database.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use dorodango_core::{AccountId, Email, Product, ProductId};

use super::{AccountDirectory, CatalogRemote};
use crate::db::RepositoryError;
use crate::models::{Account, NewAccount};

/// A product collection held in memory.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    products: Mutex<Vec<Product>>,
    offline: AtomicBool,
    failing_writes: AtomicUsize,
    write_calls: AtomicUsize,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given records.
    #[must_use]
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: Mutex::new(products),
            ..Self::default()
        }
    }

    /// Make every call fail until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Fail the next `n` create/delete calls.
    pub fn fail_next_writes(&self, n: usize) {
        self.failing_writes.store(n, Ordering::SeqCst);
    }

    /// Current contents.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Product> {
        self.products.lock().clone()
    }

    /// Number of create/delete calls received, failed ones included.
    #[must_use]
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), RepositoryError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("memory catalog offline".to_owned()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), RepositoryError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let failing = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(RepositoryError::Unavailable("injected write failure".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogRemote for MemoryCatalog {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        self.check_online()?;
        Ok(self.snapshot())
    }

    async fn create(&self, product: &Product) -> Result<(), RepositoryError> {
        self.check_write()?;
        let mut products = self.products.lock();
        if products.iter().any(|p| p.id == product.id) {
            return Err(RepositoryError::Conflict(format!(
                "product {} already exists",
                product.id
            )));
        }
        products.insert(0, product.clone());
        Ok(())
    }

    async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        self.check_write()?;
        self.products.lock().retain(|p| &p.id != id);
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.check_online()
    }
}

/// An account directory held in memory.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    accounts: Mutex<Vec<Account>>,
    offline: AtomicBool,
}

impl MemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), RepositoryError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("memory directory offline".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountDirectory for MemoryDirectory {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        self.check_online()?;
        Ok(self
            .accounts
            .lock()
            .iter()
            .find(|a| &a.email == email)
            .cloned())
    }

    async fn find_by_uid(&self, uid: &AccountId) -> Result<Option<Account>, RepositoryError> {
        self.check_online()?;
        Ok(self.accounts.lock().iter().find(|a| &a.uid == uid).cloned())
    }

    async fn create(&self, account: NewAccount) -> Result<Account, RepositoryError> {
        self.check_online()?;
        let mut accounts = self.accounts.lock();
        if accounts.iter().any(|a| a.email == account.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let now = Utc::now();
        let created = Account {
            uid: account.uid,
            name: account.name,
            email: account.email,
            password_hash: Some(account.password_hash),
            created_at: now,
            updated_at: now,
        };
        accounts.push(created.clone());
        Ok(created)
    }

    async fn upsert_profile(
        &self,
        uid: &AccountId,
        name: &str,
        email: &Email,
    ) -> Result<Account, RepositoryError> {
        self.check_online()?;
        let mut accounts = self.accounts.lock();
        if accounts.iter().any(|a| &a.email == email && &a.uid != uid) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let now = Utc::now();
        if let Some(existing) = accounts.iter_mut().find(|a| &a.uid == uid) {
            if existing.password_hash.is_some() {
                return Err(RepositoryError::Conflict(
                    "uid belongs to a password account".to_owned(),
                ));
            }
            existing.name = name.to_owned();
            existing.email = email.clone();
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let created = Account {
            uid: uid.clone(),
            name: name.to_owned(),
            email: email.clone(),
            password_hash: None,
            created_at: now,
            updated_at: now,
        };
        accounts.push(created.clone());
        Ok(created)
    }
}
