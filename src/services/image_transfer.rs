//! Uploads locally picked images to blob storage.
//!
//! The device picker hands back a local path or `file://` URI; this
//! helper streams the file into storage under a key derived from its
//! owner and returns the resulting download URL. Only files beneath the
//! picker directory can be read.

use crate::services::backend::{Backend, BackendError, BlobStore};
use chrono::Utc;
use futures::StreamExt;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tokio::fs::{self, File};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("could not read local image `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("could not upload image to `{key}`: {source}")]
    Upload {
        key: String,
        #[source]
        source: BackendError,
    },
    #[error("could not resolve download URL for `{key}`: {source}")]
    Url {
        key: String,
        #[source]
        source: BackendError,
    },
}

/// Who an image belongs to, which determines its storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOwner<'a> {
    /// Profile picture: one fixed key per account, always overwritten.
    Profile { uid: &'a str },
    /// Photo attached to a new address, namespaced by its author.
    Address { uid: &'a str },
    /// Photo attached to a comment on an address.
    Comment { address_id: &'a str },
}

impl ImageOwner<'_> {
    /// Storage key for an upload made at `now_millis` (Unix epoch ms).
    ///
    /// Timestamped keys let one owner keep several images; the profile key
    /// ignores the timestamp.
    pub fn storage_key(&self, now_millis: i64) -> String {
        match self {
            ImageOwner::Profile { uid } => format!("profile_pics/{}", uid),
            ImageOwner::Address { uid } => format!("addresses/{}/{}", uid, now_millis),
            ImageOwner::Comment { address_id } => {
                format!("comments/{}_{}", address_id, now_millis)
            }
        }
    }
}

#[derive(Clone)]
pub struct ImageTransfer {
    blobs: Arc<dyn BlobStore>,
    picker_root: Option<PathBuf>,
}

impl ImageTransfer {
    pub fn new(blobs: Arc<dyn BlobStore>, picker_root: Option<PathBuf>) -> Self {
        Self { blobs, picker_root }
    }

    pub fn for_backend(backend: &Backend) -> Self {
        Self::new(backend.blobs.clone(), backend.picker_root.clone())
    }

    /// Resolve `path` and require it to sit beneath the picker directory.
    ///
    /// Symlinks and `..` segments are resolved before the check.
    async fn confine(&self, path: &str) -> Result<PathBuf, TransferError> {
        let Some(root) = &self.picker_root else {
            return Err(read_error(
                path,
                io::Error::new(ErrorKind::PermissionDenied, "no picker directory configured"),
            ));
        };
        let root = fs::canonicalize(root)
            .await
            .map_err(|source| read_error(path, source))?;
        let resolved = fs::canonicalize(path)
            .await
            .map_err(|source| read_error(path, source))?;
        if !resolved.starts_with(&root) {
            warn!("refusing to read {} from outside the picker directory", path);
            return Err(read_error(
                path,
                io::Error::new(
                    ErrorKind::PermissionDenied,
                    "image is outside the picker directory",
                ),
            ));
        }
        Ok(resolved)
    }

    /// Upload the image at `local_uri` and return its download URL.
    pub async fn upload_image(
        &self,
        owner: ImageOwner<'_>,
        local_uri: &str,
    ) -> Result<String, TransferError> {
        let path = local_path(local_uri);
        let key = owner.storage_key(Utc::now().timestamp_millis());

        let resolved = self.confine(path).await?;
        let file = File::open(&resolved)
            .await
            .map_err(|source| read_error(path, source))?;
        let body = ReaderStream::new(file).boxed();

        let blob = self
            .blobs
            .put(&key, content_type_for(path), body)
            .await
            .map_err(|source| match source {
                BackendError::Io(source) => read_error(path, source),
                source => TransferError::Upload {
                    key: key.clone(),
                    source,
                },
            })?;
        debug!("uploaded {} as {} ({} bytes)", path, blob.key, blob.size_bytes);

        let url = self
            .blobs
            .download_url(&key)
            .await
            .map_err(|source| TransferError::Url {
                key: key.clone(),
                source,
            })?;
        info!("image available at {}", url);
        Ok(url)
    }

    /// Download URL of an account's profile picture, if one was uploaded.
    ///
    /// Any lookup failure counts as "no custom picture".
    pub async fn profile_image_url(&self, uid: &str) -> Option<String> {
        let key = ImageOwner::Profile { uid }.storage_key(0);
        match self.blobs.download_url(&key).await {
            Ok(url) => Some(url),
            Err(err) => {
                debug!("no profile picture for {}: {}", uid, err);
                None
            }
        }
    }
}

fn read_error(path: &str, source: io::Error) -> TransferError {
    TransferError::Read {
        path: path.to_string(),
        source,
    }
}

fn local_path(local_uri: &str) -> &str {
    local_uri.strip_prefix("file://").unwrap_or(local_uri)
}

fn content_type_for(path: &str) -> Option<String> {
    let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => return None,
    };
    Some(mime.to_string())
}
