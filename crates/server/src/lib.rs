pub mod config;
pub mod error;
pub mod fulfiller;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shard Coordinator API",
        version = "0.1.0",
        description = "Coordinated creation of sharded, replicated resources"
    ),
    paths(
        routes::health_check,
        routes::sql::execute_sql,
        routes::resources::list_resources,
        routes::resources::get_resource,
        routes::resources::get_resource_status,
    ),
    components(schemas(
        routes::HealthResponse,
        routes::sql::SqlRequest,
        routes::sql::SqlResponse,
        routes::resources::ResourceResponse,
        routes::resources::StatusResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sql", description = "Forwarded statements"),
        (name = "resources", description = "Catalog and status inspection"),
    )
)]
pub struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
        .route("/health", get(routes::health_check))
        .route("/sql", post(routes::sql::execute_sql))
        .route("/api/resources", get(routes::resources::list_resources))
        .route("/api/resources/{name}", get(routes::resources::get_resource))
        .route(
            "/api/resources/{name}/status",
            get(routes::resources::get_resource_status),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
