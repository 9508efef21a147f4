//! Auth screen: sign-up, sign-in, sign-out and the current session.

use crate::{errors::AppError, models::account::AuthUser, state::AppState};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SignUpReq {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResp {
    pub signed_in: bool,
    pub user: Option<AuthUser>,
}

impl From<Option<AuthUser>> for SessionResp {
    fn from(user: Option<AuthUser>) -> Self {
        Self {
            signed_in: user.is_some(),
            user,
        }
    }
}

/// `POST /auth/sign-up`
pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpReq>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .accounts
        .sign_up(&req.username, &req.email, &req.password)
        .await?;
    Ok((StatusCode::CREATED, Json(SessionResp::from(Some(user)))))
}

/// `POST /auth/sign-in`
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInReq>,
) -> Result<Json<SessionResp>, AppError> {
    let user = state.accounts.sign_in(&req.email, &req.password).await?;
    Ok(Json(SessionResp::from(Some(user))))
}

/// `POST /auth/sign-out`
pub async fn sign_out(State(state): State<AppState>) -> StatusCode {
    state.accounts.sign_out();
    StatusCode::NO_CONTENT
}

/// `GET /auth/session`: decides between the auth and home screens.
pub async fn session(State(state): State<AppState>) -> Json<SessionResp> {
    Json(SessionResp::from(state.accounts.current_user()))
}
