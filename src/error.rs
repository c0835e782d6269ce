use std::collections::HashMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    Database(sqlx::Error),
    Hash(bcrypt::BcryptError),
    Io(std::io::Error),
    Multipart(axum::extract::multipart::MultipartError),
    Validation(HashMap<String, Vec<String>>),
    Unauthorized,
    NotFound,
}

impl AppError {
    /// Validation error with a single message under one field key.
    pub fn field(name: &str, message: &str) -> Self {
        let mut errors = HashMap::new();
        errors.insert(name.to_string(), vec![message.to_string()]);
        AppError::Validation(errors)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "Not found." })),
            )
                .into_response(),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "detail": "Authentication credentials were not provided." })),
            )
                .into_response(),
            AppError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                internal_error()
            }
            AppError::Hash(e) => {
                tracing::error!("Password hashing error: {e}");
                internal_error()
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {e}");
                internal_error()
            }
            AppError::Multipart(e) => {
                tracing::error!("Multipart error: {e}");
                internal_error()
            }
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "Internal server error" })),
    )
        .into_response()
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Database(e) => write!(f, "database error: {e}"),
            AppError::Hash(e) => write!(f, "password hashing error: {e}"),
            AppError::Io(e) => write!(f, "io error: {e}"),
            AppError::Multipart(e) => write!(f, "multipart error: {e}"),
            AppError::Validation(errors) => {
                let mut fields: Vec<&str> = errors.keys().map(String::as_str).collect();
                fields.sort_unstable();
                write!(f, "validation failed: {}", fields.join(", "))
            }
            AppError::Unauthorized => write!(f, "unauthorized"),
            AppError::NotFound => write!(f, "not found"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e)
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AppError::Hash(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e)
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(e: axum::extract::multipart::MultipartError) -> Self {
        AppError::Multipart(e)
    }
}
