//! Sign-up, sign-in and the signed-in user's profile.

use crate::models::{
    account::AuthUser,
    profile::{HomeProfile, UserProfile},
};
use crate::services::{
    address_repository::{RepositoryError, RepositoryResult, to_fields},
    backend::{Backend, BackendError},
    image_transfer::{ImageOwner, ImageTransfer},
};
use tracing::{info, warn};

/// Collection holding one profile document per account uid.
pub const USERS: &str = "users";

#[derive(Clone)]
pub struct AccountService {
    backend: Backend,
    images: ImageTransfer,
}

impl AccountService {
    pub fn new(backend: Backend) -> Self {
        let images = ImageTransfer::for_backend(&backend);
        Self { backend, images }
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.backend.session.current_user()
    }

    /// Create an account, store its profile and sign it in.
    pub async fn sign_up(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> RepositoryResult<AuthUser> {
        if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(RepositoryError::Validation("all fields are required".into()));
        }
        let user = self
            .backend
            .auth
            .create_user(email, password)
            .await
            .map_err(credentials_error)?;

        let profile = UserProfile {
            username: username.trim().to_string(),
        };
        self.backend
            .documents
            .set(USERS, &user.uid, to_fields(&profile)?)
            .await?;

        self.backend.session.set(Some(user.clone()));
        info!("signed up {}", user.uid);
        Ok(user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> RepositoryResult<AuthUser> {
        let user = self
            .backend
            .auth
            .sign_in(email, password)
            .await
            .map_err(credentials_error)?;
        self.backend.session.set(Some(user.clone()));
        info!("signed in {}", user.uid);
        Ok(user)
    }

    pub fn sign_out(&self) {
        if let Some(user) = self.backend.session.current_user() {
            info!("signed out {}", user.uid);
        }
        self.backend.session.set(None);
    }

    /// Username stored at sign-up for `uid`.
    ///
    /// Lookup failures are logged and reported as `None`.
    pub async fn username_for(&self, uid: &str) -> Option<String> {
        match self.backend.documents.get(USERS, uid).await {
            Ok(Some(doc)) => doc.get_str("username").map(str::to_string),
            Ok(None) => None,
            Err(err) => {
                warn!("could not load profile for {}: {}", uid, err);
                None
            }
        }
    }

    /// Welcome header data: username and profile picture, both optional.
    pub async fn home_profile(&self) -> RepositoryResult<HomeProfile> {
        let user = self
            .current_user()
            .ok_or(RepositoryError::Unauthenticated)?;
        Ok(HomeProfile {
            username: self.username_for(&user.uid).await,
            profile_image_url: self.images.profile_image_url(&user.uid).await,
            uid: user.uid,
        })
    }

    /// Replace the signed-in user's profile picture.
    pub async fn upload_profile_image(&self, image_uri: &str) -> RepositoryResult<String> {
        let user = self
            .current_user()
            .ok_or(RepositoryError::Unauthenticated)?;
        let url = self
            .images
            .upload_image(ImageOwner::Profile { uid: &user.uid }, image_uri)
            .await?;
        info!("updated profile picture for {}", user.uid);
        Ok(url)
    }
}

/// Credential problems are user input errors, not backend failures.
fn credentials_error(err: BackendError) -> RepositoryError {
    match err {
        BackendError::InvalidArgument(msg) => RepositoryError::Validation(msg),
        BackendError::EmailInUse(_) | BackendError::InvalidCredentials => {
            RepositoryError::Validation(err.to_string())
        }
        other => RepositoryError::Backend(other),
    }
}
