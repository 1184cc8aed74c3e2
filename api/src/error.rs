//! Error types for the showcase API
//!
//! All errors use thiserror for structured error handling.
//! `IntoResponse` maps them to HTTP statuses with user-safe messages;
//! filesystem paths never reach a response body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// A relative path resolved to a location outside the storage root
    #[error("Path traversal not allowed: {0}")]
    PathTraversal(String),

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::PathTraversal(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Io(_) | AppError::Config(_) | AppError::Generic(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to API clients
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotFound { resource, .. } => format!("{resource} not found"),
            AppError::Validation(message) => message.clone(),
            AppError::PathTraversal(_) => "Invalid file path".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::PathTraversal(_) => tracing::warn!("Rejected request: {}", self),
            AppError::NotFound { .. } | AppError::Validation(_) => {
                tracing::debug!("Client error: {}", self)
            }
            _ => tracing::error!("Internal service error: {:#}", self),
        }

        (self.status_code(), self.user_message()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
