//! Backend seams and the shared client handle.
//!
//! The application talks to three collaborators: authentication, a
//! document database and blob storage. Each sits behind a trait so the
//! repository layer never names a concrete store. [`Backend`] bundles one
//! of each with the client-side [`Session`] and is built once at startup,
//! then cloned into every component that needs it.

use crate::models::{account::AuthUser, blob::BlobObject, document::Document};
use crate::services::{
    disk_blobs::DiskBlobs, session::Session, sqlite_auth::SqliteAuth,
    sqlite_documents::SqliteDocuments,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use std::{io, path::PathBuf, sync::Arc};
use thiserror::Error;
use tokio::fs::File;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("document `{collection}/{id}` not found")]
    DocumentNotFound { collection: String, id: String },
    #[error("object `{0}` not found")]
    ObjectNotFound(String),
    #[error("invalid object key `{0}`")]
    InvalidObjectKey(String),
    #[error("invalid collection path `{0}`")]
    InvalidCollection(String),
    #[error("invalid field path `{0}`")]
    InvalidFieldPath(String),
    #[error("unsupported filter value for field `{0}`")]
    UnsupportedFilter(String),
    #[error("email `{0}` is already in use")]
    EmailInUse(String),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("{0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Byte stream accepted by [`BlobStore::put`].
pub type BlobBody = BoxStream<'static, io::Result<Bytes>>;

/// Email/password account management.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Register a new account and return its identity.
    async fn create_user(&self, email: &str, password: &str) -> BackendResult<AuthUser>;

    /// Check credentials and return the matching identity.
    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthUser>;
}

/// A collection-oriented JSON document database.
///
/// Collections are `/`-separated paths; a nested collection lives under a
/// parent document (`adresses/{id}/comments`). Queries support a single
/// equality filter and return documents in no particular order.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document under a store-assigned id and creation time.
    async fn add(&self, collection: &str, data: Map<String, Value>) -> BackendResult<Document>;

    /// Create or replace the document at `collection/id`.
    async fn set(&self, collection: &str, id: &str, data: Map<String, Value>)
    -> BackendResult<()>;

    async fn get(&self, collection: &str, id: &str) -> BackendResult<Option<Document>>;

    async fn list(&self, collection: &str) -> BackendResult<Vec<Document>>;

    /// Documents whose top-level `field` equals `value`.
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> BackendResult<Vec<Document>>;

    /// Remove a document and every collection nested under it.
    /// Returns false when nothing was stored at that id.
    async fn delete(&self, collection: &str, id: &str) -> BackendResult<bool>;

    /// Cheap connectivity probe used by readiness checks.
    async fn ping(&self) -> BackendResult<()>;
}

/// Key/value blob storage with public download URLs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `body` under `key`, replacing any previous payload.
    async fn put(
        &self,
        key: &str,
        content_type: Option<String>,
        body: BlobBody,
    ) -> BackendResult<BlobObject>;

    /// Resolve the durable download URL for an existing key.
    async fn download_url(&self, key: &str) -> BackendResult<String>;

    /// Open a stored payload for streaming out.
    async fn open(&self, key: &str) -> BackendResult<(BlobObject, File)>;

    async fn ping(&self) -> BackendResult<()>;
}

/// Connection handle shared by every component.
#[derive(Clone)]
pub struct Backend {
    pub auth: Arc<dyn AuthBackend>,
    pub documents: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub session: Session,
    /// Directory the device's image picker writes into. Local images are
    /// only read from beneath it; `None` refuses every local read.
    pub picker_root: Option<PathBuf>,
}

impl Backend {
    pub fn new(
        auth: Arc<dyn AuthBackend>,
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            auth,
            documents,
            blobs,
            session: Session::new(),
            picker_root: None,
        }
    }

    /// Allow image uploads from files beneath `root`.
    pub fn with_picker_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.picker_root = Some(root.into());
        self
    }

    /// Build the local backend: accounts and documents in SQLite, blob
    /// payloads under `storage_dir`, download URLs rooted at
    /// `public_base_url`.
    pub fn sqlite(
        db: Arc<SqlitePool>,
        storage_dir: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self::new(
            Arc::new(SqliteAuth::new(db.clone())),
            Arc::new(SqliteDocuments::new(db.clone())),
            Arc::new(DiskBlobs::new(db, storage_dir, public_base_url)),
        )
    }
}

/// Return true if SQLx error indicates a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}
