//! Comments attached to an address.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reply stored in the `comments` collection nested under an address.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,

    /// Free text; older clients write `""` for image-only comments.
    #[serde(default)]
    pub text: Option<String>,

    /// Author display name copied from the profile at post time.
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub image_url: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Document body appended to an address's comment collection.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl NewComment {
    /// True when the comment carries neither text nor an image.
    pub fn is_empty(&self) -> bool {
        let no_text = self.text.as_deref().is_none_or(|t| t.trim().is_empty());
        let no_image = self.image_url.as_deref().is_none_or(str::is_empty);
        no_text && no_image
    }
}
