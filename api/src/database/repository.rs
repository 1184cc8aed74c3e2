//! Repository layer for database operations
//!
//! CRUD for products and the image/attachment rows that reference blobs in
//! storage. The repository never touches storage itself.

use super::models::*;
use crate::error::{AppError, Result};
use crate::services::file_resolver::FileRecordStore;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new product
    pub async fn create_product(&self, req: CreateProductRequest) -> Result<Product> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (id, slug, title, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.slug)
        .bind(&req.title)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created product: {}", id);
        Ok(product)
    }

    /// Get a product by ID
    pub async fn get_product(&self, id: &str) -> Result<Product> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Product", id))
    }

    /// Delete a product; its image and attachment rows cascade
    pub async fn delete_product(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("Product", id));
        }

        tracing::debug!("Deleted product: {}", id);
        Ok(())
    }

    /// Insert an image row
    pub async fn create_image(&self, image: NewImage) -> Result<StoredImage> {
        let stored = sqlx::query_as::<_, StoredImage>(
            r#"
            INSERT INTO product_images (id, product_id, file_path, alt, mime, size_bytes, sort_order)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&image.id)
        .bind(&image.product_id)
        .bind(&image.file_path)
        .bind(&image.alt)
        .bind(&image.mime)
        .bind(image.size_bytes)
        .bind(image.sort_order)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created image: {} for product: {}", stored.id, stored.product_id);
        Ok(stored)
    }

    /// Insert an attachment row
    pub async fn create_attachment(&self, attachment: NewAttachment) -> Result<StoredAttachment> {
        let stored = sqlx::query_as::<_, StoredAttachment>(
            r#"
            INSERT INTO product_attachments (id, product_id, file_path, title, mime, size_bytes, sort_order)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&attachment.id)
        .bind(&attachment.product_id)
        .bind(&attachment.file_path)
        .bind(&attachment.title)
        .bind(&attachment.mime)
        .bind(attachment.size_bytes)
        .bind(attachment.sort_order)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(
            "Created attachment: {} for product: {}",
            stored.id,
            stored.product_id
        );
        Ok(stored)
    }

    /// List images for a product in display order
    pub async fn list_images(&self, product_id: &str) -> Result<Vec<StoredImage>> {
        let images = sqlx::query_as::<_, StoredImage>(
            r#"
            SELECT * FROM product_images WHERE product_id = ? ORDER BY sort_order, id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    /// List attachments for a product in display order
    pub async fn list_attachments(&self, product_id: &str) -> Result<Vec<StoredAttachment>> {
        let attachments = sqlx::query_as::<_, StoredAttachment>(
            r#"
            SELECT * FROM product_attachments WHERE product_id = ? ORDER BY sort_order, id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attachments)
    }

    /// Delete an image row. Returns false if no row matched.
    pub async fn delete_image(&self, id: &str) -> Result<bool> {
        let rows = sqlx::query("DELETE FROM product_images WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!("Deleted image: {} ({} rows)", id, rows);
        Ok(rows > 0)
    }

    /// Delete an attachment row. Returns false if no row matched.
    pub async fn delete_attachment(&self, id: &str) -> Result<bool> {
        let rows = sqlx::query("DELETE FROM product_attachments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!("Deleted attachment: {} ({} rows)", id, rows);
        Ok(rows > 0)
    }
}

#[async_trait]
impl FileRecordStore for Repository {
    async fn find_image_by_id(&self, id: &str) -> Result<Option<StoredImage>> {
        let image = sqlx::query_as::<_, StoredImage>("SELECT * FROM product_images WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(image)
    }

    async fn find_attachment_by_id(&self, id: &str) -> Result<Option<StoredAttachment>> {
        let attachment =
            sqlx::query_as::<_, StoredAttachment>("SELECT * FROM product_attachments WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(attachment)
    }
}
