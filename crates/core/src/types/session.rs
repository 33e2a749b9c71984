//! Session identity.

use serde::{Deserialize, Serialize};

/// The identity carried by the `session` cookie.
///
/// `uid` is absent for identities restored from older cookies; every session
/// written by the storefront carries one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    pub name: String,
    pub email: String,
}

impl SessionUser {
    /// Create a session identity with a uid.
    #[must_use]
    pub fn new(uid: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
            name: name.into(),
            email: email.into(),
        }
    }
}
