//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are constructed here from `Settings` and shared with the
//! HTTP handlers through `AppState`.

use crate::config::Settings;
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::routes;
use crate::services::{FileResolver, MediaService, UploadPolicy};
use crate::storage::{LocalStorageDriver, StorageDriver};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub storage: Arc<dyn StorageDriver>,
    pub resolver: FileResolver,
    pub media: MediaService,
}

impl AppState {
    pub fn new(repo: Repository, storage: Arc<dyn StorageDriver>, policy: UploadPolicy) -> Self {
        Self {
            resolver: FileResolver::new(Arc::new(repo.clone())),
            media: MediaService::new(repo.clone(), storage.clone(), policy),
            repo,
            storage,
        }
    }
}

/// Application setup - called once on startup
pub async fn setup(settings: &Settings) -> Result<AppState> {
    tracing::info!("Initializing application");

    let pool = create_pool(&settings.database_url).await?;
    let storage = LocalStorageDriver::new(settings).await?;

    let state = AppState::new(
        Repository::new(pool),
        Arc::new(storage),
        UploadPolicy::from_settings(settings),
    );

    tracing::info!("Application initialized successfully");

    Ok(state)
}

/// Build the HTTP router
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/files", routes::files::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
