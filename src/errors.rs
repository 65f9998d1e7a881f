//! HTTP-facing error type and the JSON envelopes shared by every controller.
//!
//! Validation and not-found failures are detected before any write and carry
//! a message meant for staff. Everything else collapses into a 500 with a
//! generic message; the underlying error string is attached only in debug
//! builds.

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("Field wajib: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("Terjadi kesalahan server")]
    Store(#[from] StoreError),
    #[error("Terjadi kesalahan server")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::MissingFields(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            AppError::Store(e) => Some(e.to_string()),
            AppError::Internal(detail) => Some(detail.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {:?}", self);
        }

        let body = ApiError {
            success: false,
            message: self.to_string(),
            error: self.detail().filter(|_| cfg!(debug_assertions)),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Body permintaan tidak valid: {}", rejection.body_text()))
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let fields = errors.field_errors();
        let mut names: Vec<_> = fields.keys().collect();
        names.sort();
        let message = names
            .first()
            .and_then(|name| {
                let first = fields.get(*name)?.first()?;
                Some(
                    first
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{name} tidak valid")),
                )
            })
            .unwrap_or_else(|| "Data tidak valid".to_string());
        AppError::Validation(message)
    }
}

/// Identifiers arrive as text in paths and bodies; a malformed one is a
/// validation failure, not a lookup miss.
pub fn parse_id(raw: &str, what: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::Validation(format!("ID {what} tidak valid")))
}

/// `Json` extractor whose rejection goes through `AppError`, so malformed
/// bodies get the same envelope as every other failure.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Success envelope: `{"success": true, "message": ..., "data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

/// Pairs a status code with a success envelope.
pub fn respond<T: Serialize>(status: StatusCode, message: &str, data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (status, Json(ApiResponse::new(message, data)))
}
