//! Account records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use dorodango_core::{AccountId, Email};

/// A stored account.
///
/// Password accounts are created by signup. Identities authenticated elsewhere
/// get a profile-only account with no password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub uid: AccountId,
    pub name: String,
    pub email: Email,
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new password account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub uid: AccountId,
    pub name: String,
    pub email: Email,
    pub password_hash: String,
}

/// The profile document returned to the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub uid: AccountId,
    pub name: String,
    pub email: Email,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for Profile {
    fn from(account: Account) -> Self {
        Self {
            uid: account.uid,
            name: account.name,
            email: account.email,
            created_at: account.created_at,
        }
    }
}
