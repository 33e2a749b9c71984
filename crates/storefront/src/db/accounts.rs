//! Account repository backed by `storefront.account`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use dorodango_core::{AccountId, Email};

use super::RepositoryError;
use crate::models::{Account, NewAccount};
use crate::remote::AccountDirectory;

#[derive(sqlx::FromRow)]
struct AccountRow {
    uid: AccountId,
    name: String,
    email: String,
    password_hash: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            uid: row.uid,
            name: row.name,
            email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// `PostgreSQL` adapter for [`AccountDirectory`].
#[derive(Clone)]
pub struct PgAccountDirectory {
    pool: PgPool,
}

impl PgAccountDirectory {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountDirectory for PgAccountDirectory {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        sqlx::query_as::<_, AccountRow>(
            r"
            SELECT uid, name, email, password_hash, created_at, updated_at
            FROM storefront.account
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?
        .map(Account::try_from)
        .transpose()
    }

    async fn find_by_uid(&self, uid: &AccountId) -> Result<Option<Account>, RepositoryError> {
        sqlx::query_as::<_, AccountRow>(
            r"
            SELECT uid, name, email, password_hash, created_at, updated_at
            FROM storefront.account
            WHERE uid = $1
            ",
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?
        .map(Account::try_from)
        .transpose()
    }

    async fn create(&self, account: NewAccount) -> Result<Account, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r"
            INSERT INTO storefront.account (uid, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING uid, name, email, password_hash, created_at, updated_at
            ",
        )
        .bind(&account.uid)
        .bind(&account.name)
        .bind(account.email.as_str())
        .bind(&account.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "email"))?;

        Account::try_from(row)
    }

    async fn upsert_profile(
        &self,
        uid: &AccountId,
        name: &str,
        email: &Email,
    ) -> Result<Account, RepositoryError> {
        // No row comes back when the uid belongs to a password account.
        let row = sqlx::query_as::<_, AccountRow>(
            r"
            INSERT INTO storefront.account (uid, name, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (uid) DO UPDATE
                SET name = EXCLUDED.name,
                    email = EXCLUDED.email,
                    updated_at = NOW()
                WHERE storefront.account.password_hash IS NULL
            RETURNING uid, name, email, password_hash, created_at, updated_at
            ",
        )
        .bind(uid)
        .bind(name)
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "email"))?
        .ok_or_else(|| RepositoryError::Conflict("uid belongs to a password account".to_owned()))?;

        Account::try_from(row)
    }
}
