//! Defines routes for every screen of the client.
//!
//! ## Structure
//! - **Probes**: `GET /healthz`, `GET /readyz`
//! - **Auth screen**
//!   - `POST /auth/sign-up`, `POST /auth/sign-in`, `POST /auth/sign-out`
//!   - `GET  /auth/session`
//! - **Home screen**: `GET /home`, `PUT /home/profile-image`
//! - **Addresses**
//!   - `POST   /addresses`: add an address
//!   - `GET    /addresses?scope=mine|public`: list (always refetches)
//!   - `DELETE /addresses/{id}`: delete an owned address
//!   - `POST   /addresses/{id}/comments/toggle`: open/close comment panel
//!   - `GET    /addresses/{id}/comments`: comments, oldest first
//!   - `POST   /addresses/{id}/comments`: post a comment
//! - **Files**: `GET /files/{*key}`: target of image download URLs
//!
//! The wildcard `*key` allows nested keys like `addresses/{uid}/{millis}`.

use crate::{
    handlers::{
        address_handlers::{
            create_address, delete_address, list_addresses, list_comments, post_comment,
            toggle_comments,
        },
        auth_handlers::{session, sign_in, sign_out, sign_up},
        file_handlers::get_file,
        health_handlers::{healthz, readyz},
        home_handlers::{home, upload_profile_image},
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Build the router for all screens.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // auth screen
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-out", post(sign_out))
        .route("/auth/session", get(session))
        // home screen
        .route("/home", get(home))
        .route("/home/profile-image", put(upload_profile_image))
        // addresses
        .route("/addresses", get(list_addresses).post(create_address))
        .route("/addresses/{id}", delete(delete_address))
        .route("/addresses/{id}/comments", get(list_comments).post(post_comment))
        .route("/addresses/{id}/comments/toggle", post(toggle_comments))
        // blob downloads
        .route("/files/{*key}", get(get_file))
}

/// Router with state attached, ready to serve.
pub fn build_router(state: AppState) -> Router {
    routes().with_state(state)
}
