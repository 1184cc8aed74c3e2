//! File resolver
//!
//! Maps a public file id to the stored blob's relative path, mime type and
//! download filename. Ids are only unique per record kind, so kinds are
//! looked up in a fixed order: images first, then attachments.

use crate::database::{StoredAttachment, StoredImage};
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Lookups the resolver needs from the persistence layer
#[async_trait]
pub trait FileRecordStore: Send + Sync {
    async fn find_image_by_id(&self, id: &str) -> Result<Option<StoredImage>>;
    async fn find_attachment_by_id(&self, id: &str) -> Result<Option<StoredAttachment>>;
}

/// Kinds of records that reference a stored blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Attachment,
}

impl FileKind {
    /// Probe order used whenever an id has to be matched against both kinds
    pub const LOOKUP_ORDER: [FileKind; 2] = [FileKind::Image, FileKind::Attachment];
}

/// A record that owns a stored blob
#[derive(Debug, Clone)]
pub enum FileRecord {
    Image(StoredImage),
    Attachment(StoredAttachment),
}

impl FileRecord {
    pub fn kind(&self) -> FileKind {
        match self {
            FileRecord::Image(_) => FileKind::Image,
            FileRecord::Attachment(_) => FileKind::Attachment,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            FileRecord::Image(image) => &image.id,
            FileRecord::Attachment(attachment) => &attachment.id,
        }
    }

    pub fn relative_path(&self) -> &str {
        match self {
            FileRecord::Image(image) => &image.file_path,
            FileRecord::Attachment(attachment) => &attachment.file_path,
        }
    }

    pub fn mime(&self) -> Option<&str> {
        match self {
            FileRecord::Image(image) => image.mime.as_deref(),
            FileRecord::Attachment(attachment) => attachment.mime.as_deref(),
        }
    }

    /// Filename offered to clients downloading this blob.
    ///
    /// Attachments prefer their title. Otherwise the last segment of the
    /// stored path is used, and `{id}.bin` when that segment is empty.
    pub fn download_filename(&self, id: &str) -> String {
        if let FileRecord::Attachment(attachment) = self {
            if !attachment.title.is_empty() {
                return attachment.title.clone();
            }
        }

        match last_segment(self.relative_path()) {
            Some(segment) => segment.to_string(),
            None => format!("{}.bin", id),
        }
    }

    fn into_resolved(self, id: &str) -> ResolvedFile {
        ResolvedFile {
            filename: self.download_filename(id),
            mime: self.mime().map(str::to_string),
            relative_path: self.relative_path().to_string(),
        }
    }
}

/// Result of resolving a file id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedFile {
    pub relative_path: String,
    pub mime: Option<String>,
    pub filename: String,
}

fn last_segment(path: &str) -> Option<&str> {
    path.rsplit('/').next().filter(|segment| !segment.is_empty())
}

/// Find the record owning `id`, probing kinds in `FileKind::LOOKUP_ORDER`
pub async fn find_file_record(store: &dyn FileRecordStore, id: &str) -> Result<Option<FileRecord>> {
    for kind in FileKind::LOOKUP_ORDER {
        let record = match kind {
            FileKind::Image => store.find_image_by_id(id).await?.map(FileRecord::Image),
            FileKind::Attachment => store
                .find_attachment_by_id(id)
                .await?
                .map(FileRecord::Attachment),
        };

        if record.is_some() {
            return Ok(record);
        }
    }

    Ok(None)
}

/// Resolves public file ids against the record store
#[derive(Clone)]
pub struct FileResolver {
    store: Arc<dyn FileRecordStore>,
}

impl FileResolver {
    pub fn new(store: Arc<dyn FileRecordStore>) -> Self {
        Self { store }
    }

    /// Resolve `id` to its blob location and download metadata.
    /// `Ok(None)` when no image or attachment carries this id.
    pub async fn resolve(&self, id: &str) -> Result<Option<ResolvedFile>> {
        let resolved = find_file_record(self.store.as_ref(), id)
            .await?
            .map(|record| {
                tracing::debug!("Resolved file {} as {:?}", id, record.kind());
                record.into_resolved(id)
            });

        Ok(resolved)
    }
}
