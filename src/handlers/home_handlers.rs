//! Home screen: welcome header and profile picture.

use crate::{errors::AppError, models::profile::HomeProfile, state::AppState};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileImageReq {
    /// Local path or `file://` URI from the image picker.
    pub image_uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileImageResp {
    pub profile_image_url: String,
}

/// `GET /home`
pub async fn home(State(state): State<AppState>) -> Result<Json<HomeProfile>, AppError> {
    Ok(Json(state.accounts.home_profile().await?))
}

/// `PUT /home/profile-image`
pub async fn upload_profile_image(
    State(state): State<AppState>,
    Json(req): Json<ProfileImageReq>,
) -> Result<Json<ProfileImageResp>, AppError> {
    let url = state.accounts.upload_profile_image(&req.image_uri).await?;
    Ok(Json(ProfileImageResp {
        profile_image_url: url,
    }))
}
