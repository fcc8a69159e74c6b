//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid collection name: '{0}'")]
    InvalidCollectionName(String),
    #[error("duplicate collection: {0}")]
    DuplicateCollection(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}

/// Errors raised by a document store backend.
///
/// Backend-specific failures are classified into these variants at the store
/// boundary, so callers discriminate by matching on the variant.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document not found")]
    DocumentNotFound { collection: String, key: String },
    #[error("unique constraint violated - in index primary of type primary over '_key'; conflicting key: {key}")]
    UniqueConstraintViolated { collection: String, key: String },
    #[error("conflict, document '{key}' was modified concurrently")]
    Conflict { collection: String, key: String },
    #[error("collection or view not found: {0}")]
    CollectionNotFound(String),
    #[error("duplicate name: {0}")]
    DuplicateName(String),
    #[error("illegal document key: '{0}'")]
    IllegalKey(String),
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    #[error("database: {0}")]
    Db(sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl AppError {
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
