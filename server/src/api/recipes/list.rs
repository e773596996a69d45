use crate::api::{internal_error, ErrorResponse};
use crate::models::Recipe;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListRecipesResponse {
    pub message: String,
    /// All recipes, oldest first
    pub recipes: Vec<Recipe>,
}

#[utoipa::path(
    get,
    path = "/recipes",
    tag = "recipes",
    responses(
        (status = 200, description = "All recipes, possibly none", body = ListRecipesResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    )
)]
pub async fn list_recipes(State(store): State<AppState>) -> impl IntoResponse {
    match store.list_all().await {
        Ok(recipes) => (
            StatusCode::OK,
            Json(ListRecipesResponse {
                message: "Recipes retrieved".to_string(),
                recipes,
            }),
        )
            .into_response(),
        Err(e) => internal_error("list recipes", e),
    }
}
