#![allow(dead_code)]

use async_trait::async_trait;
use bonnes_adresses::{
    AccountService, Backend, database,
    models::document::Document,
    services::{
        backend::{BackendError, BackendResult, DocumentStore},
        disk_blobs::DiskBlobs,
        sqlite_auth::SqliteAuth,
        sqlite_documents::SqliteDocuments,
    },
};
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tempfile::{TempDir, tempdir};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

pub const PUBLIC_URL: &str = "http://127.0.0.1:3000";

/// A throwaway database + blob root shared by every simulated device.
pub struct Fixture {
    pub dir: TempDir,
    pub db: Arc<SqlitePool>,
}

impl Fixture {
    pub async fn new() -> Self {
        let dir = tempdir().expect("tempdir");
        let url = format!("sqlite://{}", dir.path().join("meta/test.db").display());
        let db = database::connect(&url).await.expect("connect sqlite");
        database::run_migrations(&db).await.expect("run migrations");
        std::fs::create_dir_all(dir.path().join("picker")).expect("picker dir");
        Self { dir, db }
    }

    pub fn blob_root(&self) -> PathBuf {
        self.dir.path().join("blobs")
    }

    pub fn picker_root(&self) -> PathBuf {
        self.dir.path().join("picker")
    }

    /// A fresh client with its own session over the shared backend data.
    pub fn device(&self) -> Backend {
        Backend::sqlite(self.db.clone(), self.blob_root(), PUBLIC_URL)
            .with_picker_root(self.picker_root())
    }

    /// A device whose document store fails every collection listing, so
    /// comments can be written but not read back.
    pub fn device_without_listing(&self) -> Backend {
        Backend::new(
            Arc::new(SqliteAuth::new(self.db.clone())),
            Arc::new(ListingFails(SqliteDocuments::new(self.db.clone()))),
            Arc::new(DiskBlobs::new(self.db.clone(), self.blob_root(), PUBLIC_URL)),
        )
        .with_picker_root(self.picker_root())
    }

    /// A device already signed in as a new account.
    pub async fn signed_in_device(&self, username: &str) -> Backend {
        let backend = self.device();
        AccountService::new(backend.clone())
            .sign_up(username, &format!("{username}@example.com"), "secret-pass")
            .await
            .expect("sign up");
        backend
    }

    /// Write a fake picked image and return its local path.
    pub fn picked_image(&self, name: &str, bytes: &[u8]) -> String {
        let path = self.picker_root().join(name);
        std::fs::write(&path, bytes).expect("write image");
        path.display().to_string()
    }

    pub async fn blob_rows(&self, key: &str) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM blobs WHERE key = ?")
            .bind(key)
            .fetch_one(&*self.db)
            .await
            .expect("count blobs")
    }

    pub async fn total_blobs(&self) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM blobs")
            .fetch_one(&*self.db)
            .await
            .expect("count all blobs")
    }

    pub async fn document_count(&self, collection: &str) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_one(&*self.db)
            .await
            .expect("count documents")
    }
}

/// Delegates to SQLite except for `list`, which always errors.
pub struct ListingFails(pub SqliteDocuments);

#[async_trait]
impl DocumentStore for ListingFails {
    async fn add(&self, collection: &str, data: Map<String, Value>) -> BackendResult<Document> {
        self.0.add(collection, data).await
    }

    async fn set(&self, collection: &str, id: &str, data: Map<String, Value>) -> BackendResult<()> {
        self.0.set(collection, id, data).await
    }

    async fn get(&self, collection: &str, id: &str) -> BackendResult<Option<Document>> {
        self.0.get(collection, id).await
    }

    async fn list(&self, collection: &str) -> BackendResult<Vec<Document>> {
        Err(BackendError::InvalidArgument(format!(
            "listing {collection} is unavailable"
        )))
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> BackendResult<Vec<Document>> {
        self.0.query_eq(collection, field, value).await
    }

    async fn delete(&self, collection: &str, id: &str) -> BackendResult<bool> {
        self.0.delete(collection, id).await
    }

    async fn ping(&self) -> BackendResult<()> {
        self.0.ping().await
    }
}

/// Send one HTTP/1.1 request and return `(status, body)`.
pub async fn send(addr: SocketAddr, method: &str, path: &str, body: Option<&str>) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.expect("connect server");
    let body = body.unwrap_or("");
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.expect("read response");
    let response = String::from_utf8_lossy(&raw).to_string();
    let status = response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .expect("status code");
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();
    (status, body)
}
