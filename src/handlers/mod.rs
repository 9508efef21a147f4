//! HTTP handlers, one module per screen.

pub mod address_handlers;
pub mod auth_handlers;
pub mod file_handlers;
pub mod health_handlers;
pub mod home_handlers;
