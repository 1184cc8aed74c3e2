//! Database models
//!
//! Rust structs representing catalog rows that own stored files.
//! All models use serde for serialization to API clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A catalog product; owner of images and attachments
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create product request
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub slug: String,
    pub title: String,
}

/// Product image stored on disk
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StoredImage {
    pub id: String,
    pub product_id: String,
    /// Path relative to the storage root
    pub file_path: String,
    pub alt: Option<String>,
    pub mime: Option<String>,
    pub size_bytes: Option<i64>,
    pub sort_order: i64,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

/// File attached to a product (manuals, spec sheets)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StoredAttachment {
    pub id: String,
    pub product_id: String,
    /// Path relative to the storage root
    pub file_path: String,
    pub title: String,
    pub mime: Option<String>,
    pub size_bytes: Option<i64>,
    pub sort_order: i64,
}

/// Image row to insert; the id is chosen by the caller because it is
/// embedded in the blob's storage path
#[derive(Debug, Clone)]
pub struct NewImage {
    pub id: String,
    pub product_id: String,
    pub file_path: String,
    pub alt: Option<String>,
    pub mime: Option<String>,
    pub size_bytes: i64,
    pub sort_order: i64,
}

/// Attachment row to insert
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub id: String,
    pub product_id: String,
    pub file_path: String,
    pub title: String,
    pub mime: Option<String>,
    pub size_bytes: i64,
    pub sort_order: i64,
}
