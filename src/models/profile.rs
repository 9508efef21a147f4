//! User profile documents stored in the `users` collection.

use serde::{Deserialize, Serialize};

/// Profile document keyed by the account `uid`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub username: String,
}

/// What the home screen shows for the signed-in account.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HomeProfile {
    pub uid: String,

    /// `None` when the profile document is missing or could not be read.
    pub username: Option<String>,

    /// `None` when no custom picture has been uploaded.
    pub profile_image_url: Option<String>,
}
