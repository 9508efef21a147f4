//! Backends, data access and screen state.

pub mod account_service;
pub mod address_list;
pub mod address_repository;
pub mod backend;
pub mod disk_blobs;
pub mod image_transfer;
pub mod session;
pub mod sqlite_auth;
pub mod sqlite_documents;
