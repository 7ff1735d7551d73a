use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use coordinator::CoordinatorError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    /// The statement is not one this service coordinates.
    NotSupported(String),
    /// The create was dispatched but did not succeed.
    Fulfillment(String),
    Coordinator(CoordinatorError),
    Database(db::DbError),
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AppError::NotSupported(msg) => (StatusCode::BAD_REQUEST, "not_supported", msg),
            AppError::Fulfillment(msg) => (StatusCode::BAD_GATEWAY, "create_failed", msg),
            AppError::Coordinator(err) => {
                let status = match &err {
                    CoordinatorError::DuplicateResource { .. } => StatusCode::CONFLICT,
                    CoordinatorError::Intent(_) => StatusCode::BAD_REQUEST,
                    CoordinatorError::HookPayload(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    CoordinatorError::Store(e) => {
                        tracing::error!("Status store error: {:?}", e);
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, err.kind(), err.to_string())
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "Database error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<CoordinatorError> for AppError {
    fn from(err: CoordinatorError) -> Self {
        AppError::Coordinator(err)
    }
}

impl From<shard_core::CoreError> for AppError {
    fn from(err: shard_core::CoreError) -> Self {
        AppError::Coordinator(err.into())
    }
}

impl From<db::DbError> for AppError {
    fn from(err: db::DbError) -> Self {
        AppError::Database(err)
    }
}
