//! Showcase API library
//!
//! Storage, file resolution and file serving for the product catalog.
//! Exposed as a library so the admin and storefront layers (and the
//! integration tests) can drive the services directly.

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod routes;
pub mod services;
pub mod storage;
