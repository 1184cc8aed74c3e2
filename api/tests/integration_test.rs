//! Integration tests for the showcase API
//!
//! These tests verify end-to-end functionality including:
//! - Application setup from settings (file-backed database, storage root)
//! - Upload, resolve, download and delete of product files
//! - Resolution through a custom record store

use async_trait::async_trait;
use axum_test::TestServer;
use showcase_api::app;
use showcase_api::config::Settings;
use showcase_api::database::{CreateProductRequest, StoredAttachment, StoredImage};
use showcase_api::error::{AppError, Result};
use showcase_api::services::{FileRecordStore, FileResolver, ResolvedFile, UploadedFile};
use showcase_api::storage::{LocalStorageDriver, StorageDriver};
use std::sync::Arc;
use tempfile::TempDir;

fn test_settings(temp_dir: &TempDir) -> Settings {
    Settings {
        database_url: format!("sqlite://{}", temp_dir.path().join("test.db").display()),
        storage_path: temp_dir.path().join("storage"),
        ..Settings::default()
    }
}

fn upload(filename: &str, content_type: &str, data: &[u8]) -> UploadedFile {
    UploadedFile {
        filename: Some(filename.to_string()),
        content_type: Some(content_type.to_string()),
        data: data.to_vec(),
    }
}

#[tokio::test]
async fn test_upload_serve_delete_workflow() {
    let temp_dir = TempDir::new().unwrap();
    let settings = test_settings(&temp_dir);

    let state = app::setup(&settings).await.unwrap();
    let product = state
        .repo
        .create_product(CreateProductRequest {
            slug: "chair".to_string(),
            title: "Office chair".to_string(),
        })
        .await
        .unwrap();

    // Upload one image and one attachment
    let image = state
        .media
        .upload_image(&product.id, upload("seat.jpg", "image/jpeg", b"jpeg data"), None, 0)
        .await
        .unwrap();
    let attachment = state
        .media
        .upload_attachment(
            &product.id,
            upload("assembly.pdf", "application/pdf", b"%PDF-1.4"),
            Some("Assembly guide.pdf".to_string()),
            0,
        )
        .await
        .unwrap();

    // Blobs land under the configured storage root using the path convention
    assert!(settings
        .storage_path
        .join(format!("products/{}/images/{}.jpg", product.id, image.id))
        .is_file());
    assert!(settings
        .storage_path
        .join(format!("products/{}/attachments/{}.pdf", product.id, attachment.id))
        .is_file());

    // Both resolve through the shared resolver
    let resolved = state.resolver.resolve(&attachment.id).await.unwrap().unwrap();
    assert_eq!(resolved.filename, "Assembly guide.pdf");
    assert_eq!(resolved.mime.as_deref(), Some("application/pdf"));

    // Both are downloadable
    let server = TestServer::new(app::router(state.clone())).unwrap();

    let response = server.get(&format!("/api/files/{}", image.id)).await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"jpeg data");

    let response = server.get(&format!("/api/files/{}", attachment.id)).await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"%PDF-1.4");

    // Delete the image; it disappears from disk and from the API
    state.media.delete_file(&image.id).await.unwrap();
    assert!(!state.storage.exists(&image.file_path).await.unwrap());

    server
        .get(&format!("/api/files/{}", image.id))
        .await
        .assert_status_not_found();

    // Deleting the product takes the attachment with it
    state.media.delete_product(&product.id).await.unwrap();
    assert!(!state.storage.exists(&attachment.file_path).await.unwrap());
    server
        .get(&format!("/api/files/{}", attachment.id))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_storage_rejects_traversal_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let storage = LocalStorageDriver::with_base(temp_dir.path().join("storage"))
        .await
        .unwrap();

    let result = storage.save("products/../../outside.bin", b"x", None).await;

    assert!(matches!(result, Err(AppError::PathTraversal(_))));
    assert!(!temp_dir.path().join("outside.bin").exists());
}

/// Record store that only knows a single image
struct SingleImageStore {
    image: StoredImage,
}

#[async_trait]
impl FileRecordStore for SingleImageStore {
    async fn find_image_by_id(&self, id: &str) -> Result<Option<StoredImage>> {
        Ok((id == self.image.id).then(|| self.image.clone()))
    }

    async fn find_attachment_by_id(&self, _id: &str) -> Result<Option<StoredAttachment>> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_saved_image_resolves_through_custom_store() {
    let temp_dir = TempDir::new().unwrap();
    let storage: Arc<dyn StorageDriver> = Arc::new(
        LocalStorageDriver::with_base(temp_dir.path().join("storage"))
            .await
            .unwrap(),
    );

    let jpeg: [u8; 17] = [
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x00, 0x00,
        0xFF, 0xD9,
    ];
    let size = storage
        .save("products/abc/images/img1.jpg", &jpeg, Some("image/jpeg"))
        .await
        .unwrap();
    assert_eq!(size, 17);

    let resolver = FileResolver::new(Arc::new(SingleImageStore {
        image: StoredImage {
            id: "img1-uuid".to_string(),
            product_id: "abc".to_string(),
            file_path: "products/abc/images/img1.jpg".to_string(),
            alt: None,
            mime: Some("image/jpeg".to_string()),
            size_bytes: Some(17),
            sort_order: 0,
            width: None,
            height: None,
        },
    }));

    let resolved = resolver.resolve("img1-uuid").await.unwrap().unwrap();
    assert_eq!(
        resolved,
        ResolvedFile {
            relative_path: "products/abc/images/img1.jpg".to_string(),
            mime: Some("image/jpeg".to_string()),
            filename: "img1.jpg".to_string(),
        }
    );
    assert_eq!(
        storage.read(&resolved.relative_path).await.unwrap().unwrap(),
        jpeg
    );

    assert!(resolver.resolve("other-id").await.unwrap().is_none());
}
