//! Authentication service.
//!
//! Password accounts are stored with Argon2id hashes. Identities that were
//! authenticated by another provider are recorded as profile-only accounts.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::{info, instrument};

use dorodango_core::{AccountId, Email};

use crate::db::RepositoryError;
use crate::models::{Account, NewAccount};
use crate::remote::AccountDirectory;

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountDirectory>,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(accounts: Arc<dyn AccountDirectory>) -> Self {
        Self { accounts }
    }

    /// Register a new password account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if name, email or password is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, password))]
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<Account, AuthError> {
        let name = name.trim();
        if name.is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        let email = Email::parse(email)?;
        let password_hash = hash_password(password)?;

        let account = self
            .accounts
            .create(NewAccount {
                uid: AccountId::generate(),
                name: name.to_owned(),
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        info!(uid = %account.uid, "Account created");
        Ok(account)
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown, the
    /// account has no password, or the password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let hash = account
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, hash)?;

        Ok(account)
    }

    /// Fetch the account behind a session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountNotFound` if no account has this uid.
    pub async fn profile(&self, uid: &AccountId) -> Result<Account, AuthError> {
        self.accounts
            .find_by_uid(uid)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }

    /// Create or merge the profile document for an externally authenticated identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if the uid belongs to a password
    /// account or the email is held by another uid.
    pub async fn upsert_profile(
        &self,
        uid: &AccountId,
        name: &str,
        email: &Email,
    ) -> Result<Account, AuthError> {
        self.accounts
            .upsert_profile(uid, name, email)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::remote::memory::MemoryDirectory;

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryDirectory::new()))
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("kantha-stitch").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("kantha-stitch", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let auth = service();
        let created = auth.signup("Asha", "Asha@Example.com", "x").await.unwrap();
        assert_eq!(created.email.as_str(), "asha@example.com");

        let logged_in = auth.login("asha@example.com", "x").await.unwrap();
        assert_eq!(logged_in.uid, created.uid);
        assert!(matches!(
            auth.login("asha@example.com", "y").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_signup_conflicts() {
        let auth = service();
        auth.signup("Asha", "asha@example.com", "x").await.unwrap();
        assert!(matches!(
            auth.signup("Asha", "asha@example.com", "x").await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_signup_requires_fields() {
        let auth = service();
        assert!(matches!(
            auth.signup("", "asha@example.com", "x").await,
            Err(AuthError::MissingFields)
        ));
        assert!(matches!(
            auth.signup("Asha", "not-an-email", "x").await,
            Err(AuthError::InvalidEmail(_))
        ));
    }

    #[tokio::test]
    async fn test_profile_only_account_cannot_password_login() {
        let auth = service();
        let email = Email::parse("ravi@example.com").unwrap();
        auth.upsert_profile(&AccountId::new("ext-1"), "Ravi", &email)
            .await
            .unwrap();

        assert!(matches!(
            auth.login("ravi@example.com", "anything").await,
            Err(AuthError::InvalidCredentials)
        ));
        let profile = auth.profile(&AccountId::new("ext-1")).await.unwrap();
        assert_eq!(profile.name, "Ravi");
    }

    #[tokio::test]
    async fn test_upsert_profile_refuses_password_account() {
        let auth = service();
        let asha = auth.signup("Asha", "asha@example.com", "x").await.unwrap();
        let other = Email::parse("mallory@example.com").unwrap();

        assert!(matches!(
            auth.upsert_profile(&asha.uid, "Mallory", &other).await,
            Err(AuthError::UserAlreadyExists)
        ));
        let stored = auth.profile(&asha.uid).await.unwrap();
        assert_eq!(stored.email.as_str(), "asha@example.com");
        assert!(auth.login("asha@example.com", "x").await.is_ok());
    }

    #[tokio::test]
    async fn test_upsert_profile_email_taken_conflicts() {
        let auth = service();
        auth.signup("Asha", "asha@example.com", "x").await.unwrap();
        let email = Email::parse("asha@example.com").unwrap();

        assert!(matches!(
            auth.upsert_profile(&AccountId::new("fb-1"), "Asha", &email).await,
            Err(AuthError::UserAlreadyExists)
        ));
    }
}
