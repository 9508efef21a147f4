//! Mes Bonnes Adresses: save, browse and comment on places.
//!
//! The crate is the client's data-access layer (accounts, addresses,
//! comments, images) over three backend seams, plus a small HTTP shell that
//! exposes each screen's actions as JSON routes.

pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::routes::build_router;
pub use services::{
    account_service::AccountService,
    address_list::{AddressListViewModel, ListScope},
    address_repository::{AddressRepository, RepositoryError},
    backend::Backend,
    image_transfer::{ImageOwner, ImageTransfer, TransferError},
};
pub use state::AppState;
