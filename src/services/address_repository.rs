//! Address and comment data access.
//!
//! Every operation is a direct round trip to the document store; nothing
//! is cached here. Listings come back in whatever order the store returns
//! them. Use [`sort_comments_chronologically`] before displaying comments.

use crate::models::{
    account::AuthUser,
    address::{Address, NewAddress},
    comment::{Comment, NewComment},
    document::Document,
};
use crate::services::{
    backend::{Backend, BackendError},
    image_transfer::{ImageOwner, ImageTransfer, TransferError},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

/// Collection holding address documents.
pub const ADDRESSES: &str = "adresses";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0}")]
    Validation(String),
    #[error("user is not authenticated")]
    Unauthenticated,
    #[error("address `{0}` belongs to another user")]
    Forbidden(String),
    #[error("address `{0}` not found")]
    NotFound(String),
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Path of the comment collection nested under an address.
pub fn comments_collection(address_id: &str) -> String {
    format!("{}/{}/comments", ADDRESSES, address_id)
}

/// Order comments by creation time, oldest first.
pub fn sort_comments_chronologically(comments: &mut [Comment]) {
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

pub(crate) fn to_fields<T: Serialize>(value: &T) -> Result<Map<String, Value>, BackendError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

fn decode_all<T: DeserializeOwned>(docs: Vec<Document>) -> RepositoryResult<Vec<T>> {
    docs.iter()
        .map(|doc| {
            doc.decode::<T>()
                .map_err(|err| RepositoryError::from(BackendError::from(err)))
        })
        .collect()
}

#[derive(Clone)]
pub struct AddressRepository {
    backend: Backend,
    images: ImageTransfer,
}

impl AddressRepository {
    pub fn new(backend: Backend) -> Self {
        let images = ImageTransfer::for_backend(&backend);
        Self { backend, images }
    }

    fn require_user(&self) -> RepositoryResult<AuthUser> {
        self.backend
            .session
            .current_user()
            .ok_or(RepositoryError::Unauthenticated)
    }

    /// Validate, optionally upload the photo, then write the address.
    ///
    /// The upload happens before the document write, so a failed upload
    /// leaves nothing behind in the document store.
    pub async fn create_address(
        &self,
        name: &str,
        description: &str,
        is_public: bool,
        image_uri: Option<&str>,
    ) -> RepositoryResult<String> {
        if name.trim().is_empty() || description.trim().is_empty() {
            return Err(RepositoryError::Validation(
                "name and description are required".into(),
            ));
        }
        let user = self.require_user()?;

        let image_url = match image_uri.filter(|uri| !uri.is_empty()) {
            Some(uri) => Some(
                self.images
                    .upload_image(ImageOwner::Address { uid: &user.uid }, uri)
                    .await?,
            ),
            None => None,
        };

        let record = NewAddress {
            name: name.to_string(),
            description: description.to_string(),
            is_public,
            user_id: user.uid.clone(),
            image_url,
        };
        let doc = self
            .backend
            .documents
            .add(ADDRESSES, to_fields(&record)?)
            .await?;

        info!("created address {} for {}", doc.id, user.uid);
        Ok(doc.id)
    }

    /// Addresses owned by the signed-in user.
    pub async fn get_user_addresses(&self) -> RepositoryResult<Vec<Address>> {
        let user = self.require_user()?;
        let docs = self
            .backend
            .documents
            .query_eq(ADDRESSES, "userId", &Value::String(user.uid))
            .await?;
        decode_all(docs)
    }

    /// Public addresses of every user.
    pub async fn get_public_addresses(&self) -> RepositoryResult<Vec<Address>> {
        let docs = self
            .backend
            .documents
            .query_eq(ADDRESSES, "isPublic", &Value::Bool(true))
            .await?;
        decode_all(docs)
    }

    pub async fn get_address(&self, address_id: &str) -> RepositoryResult<Address> {
        let doc = self
            .backend
            .documents
            .get(ADDRESSES, address_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(address_id.to_string()))?;
        Ok(doc.decode().map_err(BackendError::from)?)
    }

    /// Delete an address and its comments.
    ///
    /// Only the owner may delete: the stored `userId` is re-read and
    /// compared with the session before anything is removed.
    pub async fn delete_address(&self, address_id: &str) -> RepositoryResult<()> {
        let user = self.require_user()?;
        let address = self.get_address(address_id).await?;
        if address.user_id != user.uid {
            warn!(
                "user {} attempted to delete address {} owned by {}",
                user.uid, address_id, address.user_id
            );
            return Err(RepositoryError::Forbidden(address_id.to_string()));
        }

        if !self.backend.documents.delete(ADDRESSES, address_id).await? {
            return Err(RepositoryError::NotFound(address_id.to_string()));
        }
        info!("deleted address {}", address_id);
        Ok(())
    }

    /// Comments under an address, in store order.
    pub async fn get_address_comments(&self, address_id: &str) -> RepositoryResult<Vec<Comment>> {
        let docs = self
            .backend
            .documents
            .list(&comments_collection(address_id))
            .await?;
        decode_all(docs)
    }

    /// Append a comment; the store assigns its id and timestamp.
    pub async fn add_address_comment(
        &self,
        address_id: &str,
        comment: NewComment,
    ) -> RepositoryResult<String> {
        if comment.is_empty() {
            return Err(RepositoryError::Validation(
                "a comment needs text or an image".into(),
            ));
        }
        let doc = self
            .backend
            .documents
            .add(&comments_collection(address_id), to_fields(&comment)?)
            .await?;

        info!("added comment {} on address {}", doc.id, address_id);
        Ok(doc.id)
    }
}
