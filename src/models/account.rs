//! Email/password accounts backing authentication.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A stored credential row.
///
/// The hash is iterated SHA-256 seeded with `salt || password`; hash and
/// salt are both base64 encoded.
#[derive(Clone, FromRow, Debug)]
pub struct Account {
    pub uid: String,
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
    pub created_at: DateTime<Utc>,
}

/// The authenticated identity carried by a session.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
}

impl From<Account> for AuthUser {
    fn from(account: Account) -> Self {
        Self {
            uid: account.uid,
            email: account.email,
        }
    }
}
