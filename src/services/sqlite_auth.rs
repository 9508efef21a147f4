//! Email/password authentication backed by the `accounts` table.
//!
//! This is the local stand-in for a hosted auth service. Passwords are
//! stored as an iterated, salted SHA-256 digest.

use crate::models::account::{Account, AuthUser};
use crate::services::backend::{AuthBackend, BackendError, BackendResult, is_unique_violation};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 6;

/// SHA-256 rounds applied to every password.
const HASH_ROUNDS: u32 = 10_000;

#[derive(Clone)]
pub struct SqliteAuth {
    db: Arc<SqlitePool>,
}

impl SqliteAuth {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    async fn fetch_account(&self, email: &str) -> BackendResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT uid, email, password_hash, password_salt, created_at
             FROM accounts WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&*self.db)
        .await?;
        Ok(account)
    }
}

/// Lowercase and trim an email, rejecting obviously malformed input.
fn normalize_email(email: &str) -> BackendResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(BackendError::InvalidArgument(format!(
            "invalid email address `{}`",
            email
        ))),
    }
}

fn hash_password(salt: &[u8], password: &str) -> String {
    let mut digest = Sha256::new()
        .chain_update(salt)
        .chain_update(password.as_bytes())
        .finalize();
    for _ in 1..HASH_ROUNDS {
        digest = Sha256::new()
            .chain_update(digest)
            .chain_update(salt)
            .finalize();
    }
    general_purpose::STANDARD.encode(digest)
}

fn verify_password(account: &Account, password: &str) -> bool {
    match general_purpose::STANDARD.decode(&account.password_salt) {
        Ok(salt) => hash_password(&salt, password) == account.password_hash,
        Err(_) => false,
    }
}

#[async_trait]
impl AuthBackend for SqliteAuth {
    async fn create_user(&self, email: &str, password: &str) -> BackendResult<AuthUser> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(BackendError::InvalidArgument(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let salt = Uuid::new_v4();
        let account = Account {
            uid: Uuid::new_v4().simple().to_string(),
            email: email.clone(),
            password_hash: hash_password(salt.as_bytes(), password),
            password_salt: general_purpose::STANDARD.encode(salt.as_bytes()),
            created_at: Utc::now(),
        };

        match sqlx::query(
            "INSERT INTO accounts (uid, email, password_hash, password_salt, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&account.uid)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.password_salt)
        .bind(account.created_at)
        .execute(&*self.db)
        .await
        {
            Ok(_) => {
                info!("created account {}", account.uid);
                Ok(account.into())
            }
            Err(err) if is_unique_violation(&err) => Err(BackendError::EmailInUse(email)),
            Err(err) => Err(BackendError::Sqlx(err)),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthUser> {
        let email = normalize_email(email).map_err(|_| BackendError::InvalidCredentials)?;
        let Some(account) = self.fetch_account(&email).await? else {
            debug!("sign-in for unknown email");
            return Err(BackendError::InvalidCredentials);
        };
        if !verify_password(&account, password) {
            debug!("sign-in with wrong password for {}", account.uid);
            return Err(BackendError::InvalidCredentials);
        }
        Ok(account.into())
    }
}
