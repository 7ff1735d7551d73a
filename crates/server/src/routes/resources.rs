use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shard_core::{ResourceDescriptor, StatusKey, StatusRecord};
use utoipa::ToSchema;

use crate::error::{AppError, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResourceResponse {
    pub name: String,
    pub cluster: Option<String>,
    pub structure: Option<String>,
    pub extra: String,
    pub shard_count: u32,
    pub replication_factor: u32,
    pub definition: String,
    pub created_at: DateTime<Utc>,
}

impl From<ResourceDescriptor> for ResourceResponse {
    fn from(descriptor: ResourceDescriptor) -> Self {
        Self {
            definition: descriptor.definition(),
            name: descriptor.name,
            cluster: descriptor.cluster,
            structure: descriptor.structure,
            extra: descriptor.extra,
            shard_count: descriptor.shard_count,
            replication_factor: descriptor.replication_factor,
            created_at: descriptor.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub key: String,
    pub status: String,
    pub result: String,
    pub terminal: bool,
}

#[utoipa::path(
    get,
    path = "/api/resources",
    responses(
        (status = 200, description = "Registered resources", body = Vec<ResourceResponse>)
    ),
    tag = "resources"
)]
pub async fn list_resources(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResourceResponse>>, AppError> {
    let resources = state.catalog.list().await?;
    Ok(Json(resources.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/resources/{name}",
    params(("name" = String, Path, description = "Resource name")),
    responses(
        (status = 200, description = "Catalog entry", body = ResourceResponse),
        (status = 404, description = "Resource not registered", body = ErrorResponse)
    ),
    tag = "resources"
)]
pub async fn get_resource(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ResourceResponse>, AppError> {
    match state.catalog.describe(&name).await? {
        Some(descriptor) => Ok(Json(descriptor.into())),
        None => Err(AppError::NotFound(format!("Resource not found: {}", name))),
    }
}

/// Current status record of a resource; absent records read as `processing`.
#[utoipa::path(
    get,
    path = "/api/resources/{name}/status",
    params(("name" = String, Path, description = "Resource name")),
    responses(
        (status = 200, description = "Decoded status record", body = StatusResponse)
    ),
    tag = "resources"
)]
pub async fn get_resource_status(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StatusResponse>, AppError> {
    let key = StatusKey::for_resource(&name);
    let raw = state.status_store.get(key.as_str()).await?;
    let record = StatusRecord::from_stored(raw.as_deref());

    Ok(Json(StatusResponse {
        key: key.as_str().to_string(),
        status: record.status.as_str().to_string(),
        terminal: record.is_terminal(),
        result: record.result,
    }))
}
