//! Shared state handed to every HTTP handler.

use crate::services::{
    account_service::AccountService, address_list::AddressListViewModel,
    address_repository::AddressRepository, backend::Backend,
};
use std::sync::Arc;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub backend: Backend,
    pub addresses: AddressRepository,
    pub accounts: AccountService,
    /// The one address list screen of this client.
    pub address_list: Arc<Mutex<AddressListViewModel>>,
}

impl AppState {
    pub fn new(backend: Backend) -> Self {
        Self {
            addresses: AddressRepository::new(backend.clone()),
            accounts: AccountService::new(backend.clone()),
            address_list: Arc::new(Mutex::new(AddressListViewModel::new(&backend))),
            backend,
        }
    }

    /// Follow session changes for the life of the process: log them, reset
    /// the address list when the account changes or signs out, and preload
    /// the new account's username.
    pub fn spawn_session_watcher(&self) -> JoinHandle<()> {
        let mut stream = self.backend.session.subscribe();
        let accounts = self.accounts.clone();
        let address_list = self.address_list.clone();

        tokio::spawn(async move {
            while let Some(user) = stream.changed().await {
                match &user {
                    Some(user) => info!("session started for {}", user.uid),
                    None => info!("session ended"),
                }
                let username = match &user {
                    Some(user) => accounts.username_for(&user.uid).await,
                    None => None,
                };

                let mut view = address_list.lock().await;
                // A newer change may already be visible; only apply the
                // username if it still matches the live session.
                if accounts.current_user().map(|u| u.uid) == user.as_ref().map(|u| u.uid.clone()) {
                    view.observe_session(user.as_ref());
                    if username.is_some() {
                        view.set_username(username);
                    }
                }
            }
        })
    }
}
