//! File download route: `GET /api/files/{file_id}`
//!
//! Resolves the id to an image or attachment, then streams the blob from
//! storage. An unknown id and a blob missing on disk both answer 404.

use crate::app::AppState;
use crate::config::FALLBACK_MIME_TYPE;
use crate::error::{AppError, Result};
use crate::storage::local::is_missing;
use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::Response,
    routing::get,
    Router,
};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new().route("/{file_id}", get(get_file))
}

/// Stream a stored file with content headers taken from its record
pub async fn get_file(
    State(state): State<AppState>,
    Path(file_id): Path<Uuid>,
) -> Result<Response> {
    let id = file_id.to_string();

    let resolved = state
        .resolver
        .resolve(&id)
        .await?
        .ok_or_else(|| AppError::not_found("File", &id))?;

    let location = state.storage.resolve_location(&resolved.relative_path).await?;

    let file = match File::open(&location).await {
        Ok(file) => file,
        Err(e) if is_missing(&e) => {
            tracing::warn!("File {} is registered but missing from storage", id);
            return Err(AppError::not_found("File", &id));
        }
        Err(e) => return Err(e.into()),
    };

    let metadata = file.metadata().await?;
    if !metadata.is_file() {
        tracing::warn!("File {} does not point at a regular file", id);
        return Err(AppError::not_found("File", &id));
    }

    let mime = resolved.mime.as_deref().unwrap_or(FALLBACK_MIME_TYPE);

    Response::builder()
        .header(header::CONTENT_TYPE, mime)
        .header(header::CONTENT_LENGTH, metadata.len())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&resolved.filename),
        )
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::Generic(format!("Failed to build file response: {}", e)))
}

/// `Content-Disposition` value for a download named `filename`.
///
/// Plain ASCII names go in a quoted `filename`; anything else is sent
/// percent-encoded as `filename*` (RFC 6266).
fn content_disposition(filename: &str) -> String {
    let plain = filename
        .chars()
        .all(|c| c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\'));

    if plain {
        format!("attachment; filename=\"{}\"", filename)
    } else {
        format!(
            "attachment; filename*=utf-8''{}",
            urlencoding::encode(filename)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app;
    use crate::config::Settings;
    use crate::database::{memory_pool, CreateProductRequest, NewImage, Repository};
    use crate::services::{UploadPolicy, UploadedFile};
    use crate::storage::LocalStorageDriver;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct TestApp {
        server: TestServer,
        state: AppState,
        repo: Repository,
        product_id: String,
        storage_root: PathBuf,
        _temp: TempDir,
    }

    async fn create_test_app() -> TestApp {
        let repo = Repository::new(memory_pool().await.unwrap());

        let temp = TempDir::new().unwrap();
        let storage = LocalStorageDriver::with_base(temp.path().join("storage"))
            .await
            .unwrap();
        let storage_root = storage.base().to_path_buf();

        let state = AppState::new(
            repo.clone(),
            Arc::new(storage),
            UploadPolicy::from_settings(&Settings::default()),
        );

        let product = repo
            .create_product(CreateProductRequest {
                slug: "kettle".to_string(),
                title: "Kettle".to_string(),
            })
            .await
            .unwrap();

        let server = TestServer::new(app::router(state.clone())).unwrap();

        TestApp {
            server,
            state,
            repo,
            product_id: product.id,
            storage_root,
            _temp: temp,
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
    async fn test_serves_image_with_headers() {
        let app = create_test_app().await;
        let image = app
            .state
            .media
            .upload_image(&app.product_id, upload("front.png", "image/png", b"png-bytes"), None, 0)
            .await
            .unwrap();

        let response = app.server.get(&format!("/api/files/{}", image.id)).await;

        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "image/png");
        assert_eq!(response.header("content-length"), "9");
        assert_eq!(
            response.header("content-disposition"),
            format!("attachment; filename=\"{}.png\"", image.id).as_str()
        );
        assert_eq!(response.as_bytes().as_ref(), b"png-bytes");
    }

    #[tokio::test]
    async fn test_attachment_download_uses_title() {
        let app = create_test_app().await;
        let attachment = app
            .state
            .media
            .upload_attachment(
                &app.product_id,
                upload("m.pdf", "application/pdf", b"%PDF-1.7"),
                Some("Инструкция.pdf".to_string()),
                0,
            )
            .await
            .unwrap();

        let response = app.server.get(&format!("/api/files/{}", attachment.id)).await;

        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "application/pdf");
        assert_eq!(
            response.header("content-disposition"),
            format!(
                "attachment; filename*=utf-8''{}",
                urlencoding::encode("Инструкция.pdf")
            )
            .as_str()
        );
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let app = create_test_app().await;

        let response = app
            .server
            .get(&format!("/api/files/{}", Uuid::new_v4()))
            .await;

        response.assert_status_not_found();
        assert_eq!(response.text(), "File not found");
    }

    #[tokio::test]
    async fn test_missing_blob_is_not_found() {
        let app = create_test_app().await;
        let image = app
            .state
            .media
            .upload_image(&app.product_id, upload("a.jpg", "image/jpeg", b"jpg"), None, 0)
            .await
            .unwrap();
        app.state.storage.delete(&image.file_path).await.unwrap();

        let response = app.server.get(&format!("/api/files/{}", image.id)).await;

        response.assert_status_not_found();
        assert!(!response.text().contains("products/"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dangling_symlink_blob_is_not_found() {
        let app = create_test_app().await;
        let image = app
            .state
            .media
            .upload_image(&app.product_id, upload("a.jpg", "image/jpeg", b"jpg"), None, 0)
            .await
            .unwrap();

        // Swap the blob for a link to a file that was never written
        let blob = app.storage_root.join(&image.file_path);
        std::fs::remove_file(&blob).unwrap();
        std::os::unix::fs::symlink(app.storage_root.join("gone.jpg"), &blob).unwrap();

        let response = app.server.get(&format!("/api/files/{}", image.id)).await;

        response.assert_status_not_found();
        assert_eq!(response.text(), "File not found");
    }

    #[tokio::test]
    async fn test_missing_mime_falls_back_to_octet_stream() {
        let app = create_test_app().await;
        let id = Uuid::new_v4().to_string();
        let file_path = format!("products/{}/images/{}.raw", app.product_id, id);
        app.state.storage.save(&file_path, b"raw", None).await.unwrap();
        app.repo
            .create_image(NewImage {
                id: id.clone(),
                product_id: app.product_id.clone(),
                file_path,
                alt: None,
                mime: None,
                size_bytes: 3,
                sort_order: 0,
            })
            .await
            .unwrap();

        let response = app.server.get(&format!("/api/files/{}", id)).await;

        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_malformed_id_is_rejected() {
        let app = create_test_app().await;

        let response = app.server.get("/api/files/not-a-uuid").expect_failure().await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_content_disposition() {
        assert_eq!(
            content_disposition("manual v2.pdf"),
            "attachment; filename=\"manual v2.pdf\""
        );
        assert_eq!(
            content_disposition("say \"hi\".txt"),
            "attachment; filename*=utf-8''say%20%22hi%22.txt"
        );
    }
}
