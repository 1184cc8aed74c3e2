//! Media service
//!
//! Upload and removal of product images and attachments.
//! Integrates Repository and a StorageDriver: the blob is written before its
//! row is inserted, and removed before its row is deleted. The two steps are
//! not transactional.

use crate::config::{Settings, DEFAULT_ATTACHMENT_TITLE, DEFAULT_IMAGE_EXTENSION};
use crate::database::{NewAttachment, NewImage, Repository, StoredAttachment, StoredImage};
use crate::error::{AppError, Result};
use crate::services::file_resolver::{find_file_record, FileKind, FileRecord};
use crate::storage::StorageDriver;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// A file received from a client
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Filename as sent by the client, if any
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Upload limits taken from settings
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    /// Limit as configured, used in the rejection message
    pub max_file_size_mb: f64,
    pub max_file_size_bytes: usize,
    pub allowed_image_types: Vec<String>,
    pub allowed_attachment_types: Vec<String>,
}

impl UploadPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_file_size_mb: settings.storage_max_file_size_mb,
            max_file_size_bytes: settings.max_file_size_bytes(),
            allowed_image_types: settings.allowed_image_types(),
            allowed_attachment_types: settings.allowed_attachment_types(),
        }
    }

    fn check(&self, file: &UploadedFile, allowed: &[String]) -> Result<()> {
        let content_type = file.content_type.as_deref().unwrap_or_default();
        if !allowed.iter().any(|t| t == content_type) {
            return Err(AppError::Validation(format!(
                "Allowed types: {}",
                allowed.join(", ")
            )));
        }

        if file.data.len() > self.max_file_size_bytes {
            return Err(AppError::Validation(format!(
                "Max size {}MB",
                self.max_file_size_mb
            )));
        }

        Ok(())
    }
}

/// Public URL a stored file is served from
pub fn file_url(id: &str) -> String {
    format!("/api/files/{}", id)
}

/// Storage path for a product image
pub fn image_path(product_id: &str, image_id: &str, filename: Option<&str>) -> String {
    let ext = extension_of(filename).unwrap_or_else(|| DEFAULT_IMAGE_EXTENSION.to_string());
    format!("products/{}/images/{}{}", product_id, image_id, ext)
}

/// Storage path for a product attachment
pub fn attachment_path(product_id: &str, attachment_id: &str, filename: Option<&str>) -> String {
    let ext = extension_of(filename).unwrap_or_default();
    format!("products/{}/attachments/{}{}", product_id, attachment_id, ext)
}

/// Suffix of the uploaded filename including the leading dot
fn extension_of(filename: Option<&str>) -> Option<String> {
    let ext = Path::new(filename?).extension()?.to_str()?;
    (!ext.is_empty()).then(|| format!(".{}", ext))
}

/// Service for managing product images and attachments
#[derive(Clone)]
pub struct MediaService {
    repo: Repository,
    storage: Arc<dyn StorageDriver>,
    policy: UploadPolicy,
}

impl MediaService {
    pub fn new(repo: Repository, storage: Arc<dyn StorageDriver>, policy: UploadPolicy) -> Self {
        Self {
            repo,
            storage,
            policy,
        }
    }

    /// Store an image for a product
    pub async fn upload_image(
        &self,
        product_id: &str,
        file: UploadedFile,
        alt: Option<String>,
        sort_order: i64,
    ) -> Result<StoredImage> {
        self.policy.check(&file, &self.policy.allowed_image_types)?;
        self.repo.get_product(product_id).await?;

        let id = Uuid::new_v4().to_string();
        let file_path = image_path(product_id, &id, file.filename.as_deref());

        tracing::info!(
            "Uploading image {} for product {} ({} bytes)",
            id,
            product_id,
            file.data.len()
        );

        let size = self
            .storage
            .save(&file_path, &file.data, file.content_type.as_deref())
            .await?;

        let image = NewImage {
            id,
            product_id: product_id.to_string(),
            file_path,
            alt: alt.filter(|a| !a.is_empty()),
            mime: file.content_type,
            size_bytes: size as i64,
            sort_order,
        };

        let stored_path = image.file_path.clone();
        match self.repo.create_image(image).await {
            Ok(stored) => Ok(stored),
            Err(e) => {
                self.discard_blob(&stored_path).await;
                Err(e)
            }
        }
    }

    /// Store an attachment for a product
    pub async fn upload_attachment(
        &self,
        product_id: &str,
        file: UploadedFile,
        title: Option<String>,
        sort_order: i64,
    ) -> Result<StoredAttachment> {
        self.policy.check(&file, &self.policy.allowed_attachment_types)?;
        self.repo.get_product(product_id).await?;

        let id = Uuid::new_v4().to_string();
        let file_path = attachment_path(product_id, &id, file.filename.as_deref());

        let title = title
            .filter(|t| !t.is_empty())
            .or_else(|| file.filename.as_deref().map(sanitize_filename))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_ATTACHMENT_TITLE.to_string());

        tracing::info!(
            "Uploading attachment {} for product {} ({} bytes)",
            id,
            product_id,
            file.data.len()
        );

        let size = self
            .storage
            .save(&file_path, &file.data, file.content_type.as_deref())
            .await?;

        let attachment = NewAttachment {
            id,
            product_id: product_id.to_string(),
            file_path,
            title,
            mime: file.content_type,
            size_bytes: size as i64,
            sort_order,
        };

        let stored_path = attachment.file_path.clone();
        match self.repo.create_attachment(attachment).await {
            Ok(stored) => Ok(stored),
            Err(e) => {
                self.discard_blob(&stored_path).await;
                Err(e)
            }
        }
    }

    pub async fn list_images(&self, product_id: &str) -> Result<Vec<StoredImage>> {
        self.repo.list_images(product_id).await
    }

    pub async fn list_attachments(&self, product_id: &str) -> Result<Vec<StoredAttachment>> {
        self.repo.list_attachments(product_id).await
    }

    /// Delete an image or attachment by its public id
    pub async fn delete_file(&self, id: &str) -> Result<FileKind> {
        let record = find_file_record(&self.repo, id)
            .await?
            .ok_or_else(|| AppError::not_found("File", id))?;

        tracing::info!("Deleting {:?} {}", record.kind(), record.id());

        self.remove_blob(record.relative_path()).await?;

        match &record {
            FileRecord::Image(_) => self.repo.delete_image(id).await?,
            FileRecord::Attachment(_) => self.repo.delete_attachment(id).await?,
        };

        Ok(record.kind())
    }

    /// Delete a product together with every blob it owns
    pub async fn delete_product(&self, product_id: &str) -> Result<()> {
        self.repo.get_product(product_id).await?;

        for image in self.repo.list_images(product_id).await? {
            self.remove_blob(&image.file_path).await?;
        }
        for attachment in self.repo.list_attachments(product_id).await? {
            self.remove_blob(&attachment.file_path).await?;
        }

        self.repo.delete_product(product_id).await?;

        tracing::info!("Product deleted with its files: {}", product_id);
        Ok(())
    }

    async fn remove_blob(&self, relative_path: &str) -> Result<()> {
        if !self.storage.delete(relative_path).await? {
            tracing::warn!("Blob already missing from storage: {}", relative_path);
        }
        Ok(())
    }

    /// Best-effort cleanup of a blob whose row could not be written
    async fn discard_blob(&self, relative_path: &str) {
        if let Err(e) = self.storage.delete(relative_path).await {
            tracing::warn!("Failed to remove orphaned blob {}: {}", relative_path, e);
        }
    }
}

/// Strip path separators and null bytes from a client-supplied filename
fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| *c != '/' && *c != '\\' && *c != '\0')
        .take(255)
        .collect()
}
