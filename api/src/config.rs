//! Application configuration
//!
//! Central location for configuration constants and the runtime `Settings`
//! struct. Settings are read once at process start (defaults, then
//! environment variables) and handed to the components that need them.

use figment::{
    providers::{Env, Serialized},
    Figment,
};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ===== Storage Defaults =====

/// Storage root used when `STORAGE_PATH` is unset
pub const DEFAULT_STORAGE_PATH: &str = "./storage";

/// Upload size limit in megabytes
pub const DEFAULT_MAX_FILE_SIZE_MB: f64 = 50.0;

/// Comma separated mime types accepted for product images
pub const DEFAULT_ALLOWED_IMAGE_TYPES: &str = "image/jpeg,image/png,image/webp";

/// Comma separated mime types accepted for product attachments
pub const DEFAULT_ALLOWED_ATTACHMENT_TYPES: &str =
    "application/pdf,application/zip,application/x-rar-compressed";

// ===== Upload Conventions =====

/// Extension used for images uploaded without one
pub const DEFAULT_IMAGE_EXTENSION: &str = ".jpg";

/// Title used for attachments that have neither a title nor a filename
pub const DEFAULT_ATTACHMENT_TITLE: &str = "Attachment";

/// Content type served when a record carries no mime
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

// ===== Server Defaults =====

pub const DEFAULT_DATABASE_URL: &str = "sqlite://showcase.db";
pub const DEFAULT_API_PORT: u16 = 8000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variables read into `Settings`.
/// Anything else in the environment (frontend `VITE_*` keys etc.) is ignored.
const ENV_KEYS: &[&str] = &[
    "DATABASE_URL",
    "STORAGE_PATH",
    "STORAGE_MAX_FILE_SIZE_MB",
    "STORAGE_ALLOWED_IMAGE_TYPES",
    "STORAGE_ALLOWED_ATTACHMENT_TYPES",
    "API_PORT",
    "LOG_LEVEL",
];

/// Runtime settings for the API process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub storage_path: PathBuf,
    pub storage_max_file_size_mb: f64,
    pub storage_allowed_image_types: String,
    pub storage_allowed_attachment_types: String,
    pub api_port: u16,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            storage_max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            storage_allowed_image_types: DEFAULT_ALLOWED_IMAGE_TYPES.to_string(),
            storage_allowed_attachment_types: DEFAULT_ALLOWED_ATTACHMENT_TYPES.to_string(),
            api_port: DEFAULT_API_PORT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Settings {
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Env::raw().only(ENV_KEYS))
    }

    /// Load settings from defaults and the process environment
    pub fn load() -> Result<Self> {
        Ok(Self::figment().extract()?)
    }

    pub fn allowed_image_types(&self) -> Vec<String> {
        split_list(&self.storage_allowed_image_types)
    }

    pub fn allowed_attachment_types(&self) -> Vec<String> {
        split_list(&self.storage_allowed_attachment_types)
    }

    pub fn max_file_size_bytes(&self) -> usize {
        (self.storage_max_file_size_mb * 1024.0 * 1024.0) as usize
    }

    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.api_port)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
