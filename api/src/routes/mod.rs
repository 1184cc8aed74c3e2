//! HTTP routes
//!
//! Thin axum handlers that delegate to the services in `AppState`.

pub mod files;
