//! State behind the address list screen.
//!
//! Holds the currently displayed addresses, one [`CommentPanel`] per
//! address whose comments were opened, and the comment draft being typed.
//! Nothing here outlives the view model: switching accounts or signing out
//! drops every cached list and comment.

use crate::models::{account::AuthUser, address::Address, comment::Comment, comment::NewComment};
use crate::services::{
    account_service::AccountService,
    address_repository::{
        AddressRepository, RepositoryError, RepositoryResult, sort_comments_chronologically,
    },
    backend::Backend,
    image_transfer::{ImageOwner, ImageTransfer},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Which addresses the list shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListScope {
    /// The signed-in user's addresses, public or not.
    #[default]
    Mine,
    /// Every public address.
    Public,
}

/// Per-address comment state.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPanel {
    pub expanded: bool,
    /// Oldest first.
    pub comments: Vec<Comment>,
    /// A comment submission for this address is in flight.
    pub pending: bool,
    #[serde(skip)]
    loaded: bool,
}

/// The comment being composed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentDraft {
    pub text: String,
    /// Local path or `file://` URI returned by the image picker.
    pub image_uri: Option<String>,
}

impl CommentDraft {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.image_uri.as_deref().is_none_or(str::is_empty)
    }
}

/// One row of the rendered list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressItem {
    #[serde(flatten)]
    pub address: Address,
    /// Only the owner gets a delete control.
    pub can_delete: bool,
    pub comments_expanded: bool,
}

pub struct AddressListViewModel {
    repository: AddressRepository,
    accounts: AccountService,
    images: ImageTransfer,
    /// Account the cached state belongs to.
    owner_uid: Option<String>,
    scope: ListScope,
    addresses: Vec<Address>,
    panels: HashMap<String, CommentPanel>,
    draft: CommentDraft,
    username: Option<String>,
}

impl AddressListViewModel {
    pub fn new(backend: &Backend) -> Self {
        Self {
            repository: AddressRepository::new(backend.clone()),
            accounts: AccountService::new(backend.clone()),
            images: ImageTransfer::for_backend(backend),
            owner_uid: backend.session.uid(),
            scope: ListScope::default(),
            addresses: Vec::new(),
            panels: HashMap::new(),
            draft: CommentDraft::default(),
            username: None,
        }
    }

    /// Drop every cached list, panel and draft.
    pub fn teardown(&mut self) {
        self.scope = ListScope::default();
        self.addresses.clear();
        self.panels.clear();
        self.draft = CommentDraft::default();
        self.username = None;
    }

    /// Apply a session change: state cached for another account is discarded.
    pub fn observe_session(&mut self, user: Option<&AuthUser>) {
        let uid = user.map(|u| u.uid.clone());
        if uid != self.owner_uid {
            debug!("address list reset for session change");
            self.teardown();
            self.owner_uid = uid;
        }
    }

    fn sync_session(&mut self) {
        let user = self.accounts.current_user();
        self.observe_session(user.as_ref());
    }

    pub fn scope(&self) -> ListScope {
        self.scope
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub fn panel(&self, address_id: &str) -> Option<&CommentPanel> {
        self.panels.get(address_id)
    }

    pub fn draft(&self) -> &CommentDraft {
        &self.draft
    }

    pub fn set_draft_text(&mut self, text: impl Into<String>) {
        self.draft.text = text.into();
    }

    pub fn set_draft_image(&mut self, image_uri: Option<String>) {
        self.draft.image_uri = image_uri;
    }

    /// Cache the display name used when posting comments.
    pub fn set_username(&mut self, username: Option<String>) {
        self.username = username;
    }

    pub fn can_delete(&self, address: &Address) -> bool {
        self.owner_uid.as_deref() == Some(address.user_id.as_str())
    }

    pub fn items(&self) -> Vec<AddressItem> {
        self.addresses
            .iter()
            .map(|address| AddressItem {
                can_delete: self.can_delete(address),
                comments_expanded: self
                    .panels
                    .get(&address.id)
                    .is_some_and(|panel| panel.expanded),
                address: address.clone(),
            })
            .collect()
    }

    /// Re-issue the query for the current scope and replace the list.
    pub async fn refresh(&mut self) -> RepositoryResult<&[Address]> {
        self.sync_session();
        let addresses = match self.scope {
            ListScope::Mine => self.repository.get_user_addresses().await?,
            ListScope::Public => self.repository.get_public_addresses().await?,
        };
        debug!("loaded {} addresses ({:?})", addresses.len(), self.scope);
        self.addresses = addresses;
        Ok(&self.addresses)
    }

    /// Switch between "mine" and "public"; always refetches.
    pub async fn set_scope(&mut self, scope: ListScope) -> RepositoryResult<&[Address]> {
        self.sync_session();
        self.scope = scope;
        self.refresh().await
    }

    /// Open or close the comment panel of an address.
    ///
    /// The first opening fetches comments; closing keeps them cached.
    pub async fn toggle_comments(&mut self, address_id: &str) -> RepositoryResult<&CommentPanel> {
        self.sync_session();
        let panel = self.panels.entry(address_id.to_string()).or_default();
        panel.expanded = !panel.expanded;
        let needs_fetch = panel.expanded && !panel.loaded;

        if needs_fetch {
            if let Err(err) = self.reload_comments(address_id).await.map(|_| ()) {
                // Stay closed so the next toggle retries the fetch.
                if let Some(panel) = self.panels.get_mut(address_id) {
                    panel.expanded = false;
                }
                return Err(err);
            }
        }
        Ok(&self.panels[address_id])
    }

    /// Fetch the comments of an address into its panel, oldest first.
    pub async fn reload_comments(&mut self, address_id: &str) -> RepositoryResult<&[Comment]> {
        self.sync_session();
        let mut comments = self.repository.get_address_comments(address_id).await?;
        sort_comments_chronologically(&mut comments);

        let panel = self.panels.entry(address_id.to_string()).or_default();
        panel.comments = comments;
        panel.loaded = true;
        Ok(&panel.comments)
    }

    /// Post the current draft on `address_id`.
    ///
    /// An empty draft is rejected before anything is sent. A failed image
    /// upload is logged and the comment goes out without an image. On
    /// success the draft is cleared and the panel's comments refetched; a
    /// failed refetch is only logged, since the comment is already stored.
    pub async fn submit_comment(&mut self, address_id: &str) -> RepositoryResult<String> {
        self.sync_session();
        if self.draft.is_empty() {
            return Err(RepositoryError::Validation(
                "a comment needs text or an image".into(),
            ));
        }
        let user = self
            .accounts
            .current_user()
            .ok_or(RepositoryError::Unauthenticated)?;

        self.panels.entry(address_id.to_string()).or_default().pending = true;
        let posted = self.post_draft(address_id, &user).await;
        if let Some(panel) = self.panels.get_mut(address_id) {
            panel.pending = false;
        }
        let comment_id = posted?;

        self.draft = CommentDraft::default();
        if let Err(err) = self.reload_comments(address_id).await.map(|_| ()) {
            warn!(
                "comment {} posted but reloading comments for {} failed: {}",
                comment_id, address_id, err
            );
        }
        Ok(comment_id)
    }

    async fn post_draft(&mut self, address_id: &str, user: &AuthUser) -> RepositoryResult<String> {
        let image_url = match self.draft.image_uri.clone().filter(|uri| !uri.is_empty()) {
            Some(uri) => match self
                .images
                .upload_image(ImageOwner::Comment { address_id }, &uri)
                .await
            {
                Ok(url) => Some(url),
                Err(err) => {
                    warn!("comment image upload failed, posting without it: {}", err);
                    None
                }
            },
            None => None,
        };

        if self.username.is_none() {
            self.username = self.accounts.username_for(&user.uid).await;
        }

        let text = self.draft.text.trim();
        let comment = NewComment {
            text: (!text.is_empty()).then(|| text.to_string()),
            username: self.username.clone().unwrap_or_default(),
            image_url,
        };
        self.repository
            .add_address_comment(address_id, comment)
            .await
    }

    /// Delete an owned address and forget its local state.
    pub async fn delete_address(&mut self, address_id: &str) -> RepositoryResult<()> {
        self.sync_session();
        self.repository.delete_address(address_id).await?;
        self.addresses.retain(|address| address.id != address_id);
        self.panels.remove(address_id);
        Ok(())
    }
}
