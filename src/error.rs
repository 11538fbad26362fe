use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use thiserror::Error;

/// Failure raised by the connection manager when a statement cannot run.
///
/// "No such row" is never a `StorageError`; repositories report absence
/// through `None`/`false`.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Database connection is closed")]
    Closed,
    #[error("Failed to prepare database location: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Dependency '{0}' not found")]
    NotFound(String),
    #[error("Dependency '{0}' has an unexpected type")]
    TypeMismatch(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors that escape a handler and become a 500 response.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error("Template rendering failed: {0}")]
    Render(#[from] askama::Error),
    #[error("Blocking task failed: {0}")]
    Blocking(#[from] actix_web::error::BlockingError),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        error!("Request failed: {}", self);
        HttpResponse::InternalServerError().body("Internal server error")
    }
}
