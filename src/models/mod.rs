//! Core data models for the address book.
//!
//! Records travel to and from the document store as JSON objects with
//! camelCase field names, matching the schema already used by existing
//! clients. Rows owned by the local backends (accounts, blob metadata,
//! raw documents) map to SQLite tables via `sqlx::FromRow`.

pub mod account;
pub mod address;
pub mod blob;
pub mod comment;
pub mod document;
pub mod profile;
