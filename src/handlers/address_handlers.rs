//! Add-address and address list screens.
//!
//! Creation goes straight to the repository. Everything the list screen
//! does goes through the shared [`AddressListViewModel`] so panel state and
//! the comment draft persist between requests.
//!
//! [`AddressListViewModel`]: crate::services::address_list::AddressListViewModel

use crate::{
    errors::AppError,
    models::comment::Comment,
    services::address_list::{AddressItem, CommentPanel, ListScope},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddressReq {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub is_public: bool,
    pub image_uri: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResp {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub scope: Option<ListScope>,
}

#[derive(Debug, Serialize)]
pub struct ListResp {
    pub scope: ListScope,
    pub items: Vec<AddressItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentReq {
    #[serde(default)]
    pub text: String,
    pub image_uri: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentPostedResp {
    pub id: String,
    pub comments: Vec<Comment>,
}

/// `POST /addresses`
pub async fn create_address(
    State(state): State<AppState>,
    Json(req): Json<CreateAddressReq>,
) -> Result<impl IntoResponse, AppError> {
    let id = state
        .addresses
        .create_address(
            &req.name,
            &req.description,
            req.is_public,
            req.image_uri.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedResp { id })))
}

/// `GET /addresses?scope=mine|public`
///
/// Always refetches; passing `scope` switches the list first.
pub async fn list_addresses(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ListResp>, AppError> {
    let mut view = state.address_list.lock().await;
    match q.scope {
        Some(scope) => view.set_scope(scope).await?,
        None => view.refresh().await?,
    };
    Ok(Json(ListResp {
        scope: view.scope(),
        items: view.items(),
    }))
}

/// `DELETE /addresses/{id}`
pub async fn delete_address(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.address_list.lock().await.delete_address(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /addresses/{id}/comments/toggle`
pub async fn toggle_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CommentPanel>, AppError> {
    let mut view = state.address_list.lock().await;
    let panel = view.toggle_comments(&id).await?;
    Ok(Json(panel.clone()))
}

/// `GET /addresses/{id}/comments`
pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let mut view = state.address_list.lock().await;
    let comments = view.reload_comments(&id).await?;
    Ok(Json(comments.to_vec()))
}

/// `POST /addresses/{id}/comments`
pub async fn post_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CommentReq>,
) -> Result<impl IntoResponse, AppError> {
    let mut view = state.address_list.lock().await;
    view.set_draft_text(req.text);
    view.set_draft_image(req.image_uri);
    let comment_id = view.submit_comment(&id).await?;
    let comments = view
        .panel(&id)
        .map(|panel| panel.comments.clone())
        .unwrap_or_default();
    Ok((
        StatusCode::CREATED,
        Json(CommentPostedResp {
            id: comment_id,
            comments,
        }),
    ))
}
