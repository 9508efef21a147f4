//! src/services/disk_blobs.rs
//!
//! DiskBlobs: blob storage with payloads on local disk and metadata in
//! SQLite. Payloads are sharded beneath `base_path/{shard}/{shard}/{key}`.
//! Keys are chosen by the application; writing an existing key replaces
//! its payload and metadata row, so a fixed key never accumulates copies.

use crate::models::blob::BlobObject;
use crate::services::backend::{BackendError, BackendResult, BlobBody, BlobStore};
use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use md5::Context;
use sqlx::SqlitePool;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

const MAX_OBJECT_KEY_LEN: usize = 1024;

#[derive(Clone)]
pub struct DiskBlobs {
    /// Shared SQLite connection pool used for metadata operations.
    db: Arc<SqlitePool>,

    /// Base directory on disk where payloads are stored.
    base_path: PathBuf,

    /// Prefix of every download URL, e.g. `http://127.0.0.1:3000`.
    public_base_url: String,
}

impl DiskBlobs {
    pub fn new(
        db: Arc<SqlitePool>,
        base_path: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            db,
            base_path: base_path.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Basic key validation to avoid trivial path traversal vectors.
    ///
    /// Rejects keys that begin with `/` or contain `..`, control characters
    /// or backslashes.
    fn ensure_key_safe(key: &str) -> BackendResult<()> {
        let invalid = key.is_empty()
            || key.len() > MAX_OBJECT_KEY_LEN
            || key.starts_with('/')
            || key.ends_with('/')
            || key.contains("..")
            || key.contains("//")
            || key
                .bytes()
                .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0' || b == b'?' || b == b'#');
        if invalid {
            return Err(BackendError::InvalidObjectKey(key.to_string()));
        }
        Ok(())
    }

    /// Two-level shard identifiers from MD5(key), as lowercase hex.
    fn key_shards(key: &str) -> (String, String) {
        let digest = md5::compute(key);
        (format!("{:02x}", digest[0]), format!("{:02x}", digest[1]))
    }

    /// Combines base_path/{shard}/{shard}/{key}. Parent directories may not
    /// exist yet.
    fn blob_path(&self, key: &str) -> PathBuf {
        let (shard_a, shard_b) = Self::key_shards(key);
        let mut path = self.base_path.clone();
        path.push(shard_a);
        path.push(shard_b);
        path.push(key);
        path
    }

    async fn fetch_blob(&self, key: &str) -> BackendResult<BlobObject> {
        sqlx::query_as::<_, BlobObject>(
            "SELECT key, size_bytes, etag, content_type, updated_at FROM blobs WHERE key = ?",
        )
        .bind(key)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => BackendError::ObjectNotFound(key.to_string()),
            other => BackendError::Sqlx(other),
        })
    }
}

#[async_trait]
impl BlobStore for DiskBlobs {
    /// Stream a payload to disk and upsert its metadata.
    ///
    /// Bytes go to a temporary file while size and MD5 are computed, the
    /// file is fsynced and renamed over the final path, then the metadata
    /// row is upserted. Temp files are removed on every error path.
    async fn put(
        &self,
        key: &str,
        content_type: Option<String>,
        mut body: BlobBody,
    ) -> BackendResult<BlobObject> {
        Self::ensure_key_safe(key)?;

        let file_path = self.blob_path(key);
        let parent = file_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| io::Error::new(ErrorKind::Other, "blob path missing parent directory"))?;
        fs::create_dir_all(&parent).await?;
        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let mut size_bytes: i64 = 0;
        let mut digest = Context::new();
        while let Some(chunk_res) = body.next().await {
            let chunk = match chunk_res {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(BackendError::Io(err));
                }
            };
            size_bytes += chunk.len() as i64;
            digest.consume(&chunk);
            if let Err(err) = file.write_all(&chunk).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(BackendError::Io(err));
            }
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(BackendError::Io(err));
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(BackendError::Io(err));
        }
        drop(file);

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&file_path).await?;
                fs::rename(&tmp_path, &file_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(BackendError::Io(err));
            }
        }

        let etag = format!("{:x}", digest.compute());
        let blob = sqlx::query_as::<_, BlobObject>(
            r#"
            INSERT INTO blobs (key, size_bytes, etag, content_type, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                size_bytes = excluded.size_bytes,
                etag = excluded.etag,
                content_type = excluded.content_type,
                updated_at = excluded.updated_at
            RETURNING key, size_bytes, etag, content_type, updated_at
            "#,
        )
        .bind(key)
        .bind(size_bytes)
        .bind(&etag)
        .bind(content_type)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await
        .map_err(BackendError::Sqlx)?;

        debug!("stored blob {} ({} bytes, etag {})", key, size_bytes, etag);
        Ok(blob)
    }

    async fn download_url(&self, key: &str) -> BackendResult<String> {
        Self::ensure_key_safe(key)?;
        let blob = self.fetch_blob(key).await?;
        Ok(format!("{}/files/{}", self.public_base_url, blob.key))
    }

    /// Returns ObjectNotFound if metadata exists but the payload is gone.
    async fn open(&self, key: &str) -> BackendResult<(BlobObject, File)> {
        Self::ensure_key_safe(key)?;
        let blob = self.fetch_blob(key).await?;

        let file = File::open(self.blob_path(key)).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                BackendError::ObjectNotFound(key.to_string())
            } else {
                BackendError::Io(err)
            }
        })?;

        Ok((blob, file))
    }

    /// Write, read back and remove a probe file under `base_path`.
    async fn ping(&self) -> BackendResult<()> {
        fs::create_dir_all(&self.base_path).await?;
        let tmp_path = self.base_path.join(format!(".readyz-{}", Uuid::new_v4()));
        fs::write(&tmp_path, b"readyz").await?;
        let bytes = fs::read(&tmp_path).await;
        let _ = fs::remove_file(&tmp_path).await;
        if bytes? != b"readyz" {
            return Err(BackendError::Io(io::Error::new(
                ErrorKind::Other,
                "file content mismatch",
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_with_traversal_are_rejected() {
        assert!(DiskBlobs::ensure_key_safe("profile_pics/u1").is_ok());
        assert!(DiskBlobs::ensure_key_safe("comments/abc_1700000000000").is_ok());
        assert!(DiskBlobs::ensure_key_safe("../etc/passwd").is_err());
        assert!(DiskBlobs::ensure_key_safe("/absolute").is_err());
        assert!(DiskBlobs::ensure_key_safe("a\\b").is_err());
        assert!(DiskBlobs::ensure_key_safe("").is_err());
    }

    #[test]
    fn shards_are_stable_hex_pairs() {
        let (a, b) = DiskBlobs::key_shards("profile_pics/u1");
        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 2);
        assert_eq!((a, b), DiskBlobs::key_shards("profile_pics/u1"));
    }
}
