pub mod recipes;
pub mod status;

use crate::store::StoreError;
use crate::AppState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

pub const NOT_FOUND_MESSAGE: &str = "No recipe found";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    /// What was wrong with the request, for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Plain acknowledgement with no payload
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

pub fn error_response(status: StatusCode, message: &str, reason: Option<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            message: message.to_string(),
            reason,
        }),
    )
        .into_response()
}

pub fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE, None)
}

/// Logs a persistence failure and hides the details from the client.
pub fn internal_error(action: &str, error: StoreError) -> Response {
    tracing::error!(error = %error, "Failed to {}", action);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE, None)
}

/// Every route the service answers, with the store injected as state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(status::router())
        .merge(recipes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi())
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    #[derive(OpenApi)]
    #[openapi(
        info(title = "recipe-server", description = "CRUD service for recipes"),
        components(schemas(ErrorResponse, MessageResponse))
    )]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    let modules: Vec<utoipa::openapi::OpenApi> =
        vec![status::ApiDoc::openapi(), recipes::ApiDoc::openapi()];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}


#[cfg(test)]
mod tests {
    use super::test_support::{app, send};
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_openapi_lists_recipe_paths() {
        let spec = super::openapi();
        assert!(spec.paths.paths.contains_key("/recipes"));
        assert!(spec.paths.paths.contains_key("/recipes/{id}"));
        assert!(spec.paths.paths.contains_key("/health"));
    }

    #[tokio::test]
    async fn test_openapi_served() {
        let (app, _store) = app();
        let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/recipes"].is_object());
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (app, _store) = app();
        let (status, _) = send(&app, Method::GET, "/does-not-exist", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
