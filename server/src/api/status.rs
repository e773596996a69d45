use super::{error_response, ErrorResponse, MessageResponse};
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use utoipa::OpenApi;

pub const PATH_HEALTH: &str = "/health";

/// Returns the router for the liveness and health endpoints
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route(PATH_HEALTH, get(health))
}

#[derive(OpenApi)]
#[openapi(paths(index, health))]
pub struct ApiDoc;

#[utoipa::path(
    get,
    path = "/",
    tag = "status",
    responses(
        (status = 200, description = "Service is up", body = MessageResponse)
    )
)]
pub async fn index() -> impl IntoResponse {
    Json(MessageResponse {
        message: "Recipe service is running".to_string(),
    })
}

/// Succeeds only if a database connection can be checked out and used.
#[utoipa::path(
    get,
    path = "/health",
    tag = "status",
    responses(
        (status = 200, description = "Database reachable", body = MessageResponse),
        (status = 500, description = "Database unreachable or pool exhausted", body = ErrorResponse)
    )
)]
pub async fn health(State(store): State<AppState>) -> impl IntoResponse {
    match store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "ok".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database unavailable",
                None,
            )
        }
    }
}
