//! Represents a saved place ("address") owned by one account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named location saved by a user.
///
/// Addresses are never edited after creation; the only lifecycle
/// transition is deletion by the owner.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Identifier assigned by the document store on creation.
    pub id: String,

    pub name: String,

    pub description: String,

    /// Whether the address shows up in the cross-user public listing.
    pub is_public: bool,

    /// Account that created the address.
    pub user_id: String,

    /// Download URL of the attached photo, if an upload succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Server-observed creation time.
    pub created_at: DateTime<Utc>,
}

/// Document body written when an address is created.
///
/// `id` and `createdAt` are assigned by the store.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    pub name: String,
    pub description: String,
    pub is_public: bool,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}
