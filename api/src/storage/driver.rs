//! Storage driver contract
//!
//! Every operation takes a path relative to the driver's root. Callers never
//! validate these paths themselves; each implementation is responsible for
//! refusing paths that escape its root before touching the backend.

use crate::error::Result;
use async_trait::async_trait;

/// Backend-agnostic blob storage.
///
/// The local disk driver is the only implementation today; a remote object
/// store can be slotted in behind `Arc<dyn StorageDriver>` without touching
/// call sites.
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Persist `content` at `relative_path`, creating parent directories.
    /// An existing blob at the same path is overwritten. Returns the number
    /// of bytes written.
    async fn save(
        &self,
        relative_path: &str,
        content: &[u8],
        content_type: Option<&str>,
    ) -> Result<u64>;

    /// Read a blob. `Ok(None)` when nothing is stored at the path.
    async fn read(&self, relative_path: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a blob. `Ok(false)` when there was nothing to delete.
    async fn delete(&self, relative_path: &str) -> Result<bool>;

    async fn exists(&self, relative_path: &str) -> Result<bool>;

    /// Backend-specific locator for the blob: an absolute filesystem path
    /// for local storage, a URL for remote backends.
    async fn resolve_location(&self, relative_path: &str) -> Result<String>;
}
