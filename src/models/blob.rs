//! Metadata for a stored blob (image payload).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A blob written under an application-chosen key.
///
/// Only metadata lives here; the bytes are on disk. Writing the same key
/// again replaces both.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct BlobObject {
    /// Storage key, e.g. `profile_pics/{uid}`.
    pub key: String,

    pub size_bytes: i64,

    /// MD5 of the payload, lowercase hex.
    pub etag: String,

    pub content_type: Option<String>,

    /// When the payload was last written.
    pub updated_at: DateTime<Utc>,
}
