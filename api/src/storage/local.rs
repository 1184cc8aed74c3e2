//! Local disk storage
//!
//! Stores blobs under a single base directory using the caller's relative
//! path as-is, e.g. `products/{product_id}/images/{image_id}.jpg`.
//!
//! Every relative path is joined to the canonical base directory and
//! canonicalized before any read or write. A path whose canonical form falls
//! outside the base directory is rejected with `AppError::PathTraversal`.

use super::StorageDriver;
use crate::config::Settings;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Disk-backed storage driver
#[derive(Debug, Clone)]
pub struct LocalStorageDriver {
    base: PathBuf,
}

impl LocalStorageDriver {
    /// Create a driver rooted at the configured storage path
    pub async fn new(settings: &Settings) -> Result<Self> {
        Self::with_base(&settings.storage_path).await
    }

    /// Create a driver rooted at `base`, creating the directory if needed
    pub async fn with_base(base: impl AsRef<Path>) -> Result<Self> {
        let base = base.as_ref();
        fs::create_dir_all(base).await?;
        let base = fs::canonicalize(base).await?;

        tracing::info!("Local storage initialized at: {:?}", base);

        Ok(Self { base })
    }

    /// Canonical storage root
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolve a relative path to an absolute path inside the storage root.
    ///
    /// Canonicalization touches the filesystem, so it runs on the blocking pool.
    async fn full_path(&self, relative_path: &str) -> Result<PathBuf> {
        let base = self.base.clone();
        let relative = relative_path.to_owned();

        tokio::task::spawn_blocking(move || resolve_within(&base, &relative))
            .await
            .map_err(|e| AppError::Generic(format!("Path resolution task failed: {}", e)))?
    }
}

#[async_trait]
impl StorageDriver for LocalStorageDriver {
    async fn save(
        &self,
        relative_path: &str,
        content: &[u8],
        content_type: Option<&str>,
    ) -> Result<u64> {
        let path = self.full_path(relative_path).await?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&path, content).await?;

        tracing::debug!(
            "Saved file: {} ({} bytes, {})",
            relative_path,
            content.len(),
            content_type.unwrap_or("unknown type")
        );

        Ok(content.len() as u64)
    }

    async fn read(&self, relative_path: &str) -> Result<Option<Vec<u8>>> {
        let path = self.full_path(relative_path).await?;

        match fs::read(&path).await {
            Ok(data) => {
                tracing::debug!("Read file: {} ({} bytes)", relative_path, data.len());
                Ok(Some(data))
            }
            Err(e) if is_missing(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, relative_path: &str) -> Result<bool> {
        let path = self.full_path(relative_path).await?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("Deleted file: {}", relative_path);
                Ok(true)
            }
            Err(e) if is_missing(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, relative_path: &str) -> Result<bool> {
        let path = self.full_path(relative_path).await?;

        match fs::metadata(&path).await {
            Ok(_) => Ok(true),
            Err(e) if is_missing(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve_location(&self, relative_path: &str) -> Result<String> {
        let path = self.full_path(relative_path).await?;
        Ok(path.to_string_lossy().into_owned())
    }
}

/// Whether an I/O error just means "nothing stored at this path".
///
/// A path that runs through a regular file (`a.jpg/child`) fails with
/// `NotADirectory` rather than `NotFound`; both mean the blob is absent.
pub(crate) fn is_missing(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

/// Join `relative` onto the canonical `base` and make sure the result stays inside it.
fn resolve_within(base: &Path, relative: &str) -> Result<PathBuf> {
    let resolved = canonicalize_lenient(&base.join(relative))?;

    if !resolved.starts_with(base) {
        tracing::warn!("Rejected storage path outside root: {:?}", relative);
        return Err(AppError::PathTraversal(relative.to_owned()));
    }

    Ok(resolved)
}

/// Canonicalize a path whose trailing components may not exist yet.
///
/// `.` and `..` are applied in order. Any component that is a symlink is
/// replaced by its canonical target, so `..` after a link climbs out of the
/// link target just as the OS would. A dangling link is followed through
/// `read_link` and its target normalized the same way, so it still lands
/// somewhere the containment check can judge.
fn canonicalize_lenient(path: &Path) -> std::io::Result<PathBuf> {
    let mut resolved = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                resolved.push(name);
                let is_symlink = std::fs::symlink_metadata(&resolved)
                    .map(|meta| meta.file_type().is_symlink())
                    .unwrap_or(false);
                if is_symlink {
                    resolved = match std::fs::canonicalize(&resolved) {
                        Ok(target) => target,
                        Err(e) if is_missing(&e) => {
                            let target = std::fs::read_link(&resolved)?;
                            resolved.pop();
                            canonicalize_lenient(&resolved.join(target))?
                        }
                        Err(e) => return Err(e),
                    };
                }
            }
        }
    }

    Ok(resolved)
}
