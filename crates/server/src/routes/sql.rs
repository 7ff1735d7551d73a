use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use shard_core::{matches_request, parse_create};
use tracing::debug;
use utoipa::ToSchema;

use crate::error::{AppError, ErrorResponse};
use crate::state::AppState;

/// A statement forwarded by the upstream daemon.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SqlRequest {
    pub query: String,
    /// Error the daemon hit on its own; when present only `P03` syntax
    /// errors on `CREATE TABLE` are accepted.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SqlResponse {
    pub success: bool,
    pub result: String,
}

/// Coordinate a sharded `CREATE TABLE` and wait for the cluster to finish it.
///
/// A client that disconnects mid-wait drops this future, which cancels the
/// background wait.
#[utoipa::path(
    post,
    path = "/sql",
    request_body = SqlRequest,
    responses(
        (status = 200, description = "Resource created", body = SqlResponse),
        (status = 400, description = "Unparsable, invalid or unsupported statement", body = ErrorResponse),
        (status = 409, description = "Resource already exists", body = ErrorResponse),
        (status = 502, description = "Creation failed, timed out or was cancelled", body = ErrorResponse)
    ),
    tag = "sql"
)]
pub async fn execute_sql(
    State(state): State<AppState>,
    Json(payload): Json<SqlRequest>,
) -> Result<Json<SqlResponse>, AppError> {
    if let Some(error) = payload.error.as_deref() {
        if !matches_request(&payload.query, error) {
            return Err(AppError::NotSupported(format!(
                "Statement is not handled by the coordinator: {}",
                error
            )));
        }
    }

    let intent = parse_create(&payload.query)?;
    let handle = state.coordinator.submit(intent).await?;
    debug!(
        task_id = %handle.id(),
        resource = %handle.resource(),
        path = payload.path.as_deref().unwrap_or(""),
        "Awaiting create"
    );

    match handle.wait().await.into_result() {
        Ok(result) => Ok(Json(SqlResponse {
            success: true,
            result,
        })),
        Err(message) => Err(AppError::Fulfillment(message)),
    }
}
