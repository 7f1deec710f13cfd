use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::alerting::stores::StoreError;
use crate::notifications::senders::SenderError;
use crate::notifications::service::NotificationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Delivery failed: {0}")]
    Delivery(SenderError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::InvalidInput(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": msg }),
            ),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": format!("Database error: {msg}") }),
            ),
            AppError::InternalServerError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": msg }),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg })),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, serde_json::json!({ "error": msg })),
            AppError::Delivery(err) => (
                StatusCode::BAD_GATEWAY,
                serde_json::json!({
                    "error": err.to_string(),
                    "kind": err.kind(),
                    "status": err.status(),
                }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalServerError(format!("JSON serialization/deserialization error: {err}"))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => e.into(),
            StoreError::Serialization(e) => e.into(),
        }
    }
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::Store(e) => e.into(),
            NotificationError::NotFound(id) => {
                AppError::NotFound(format!("Channel {id} not found"))
            }
            NotificationError::UnusableChannel(id) => {
                AppError::Conflict(format!("Channel {id} has no usable configuration"))
            }
            NotificationError::Sender(SenderError::InvalidConfiguration(msg)) => {
                AppError::InvalidInput(msg)
            }
            NotificationError::Sender(e) => AppError::Delivery(e),
        }
    }
}
