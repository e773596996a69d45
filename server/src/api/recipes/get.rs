use crate::api::{internal_error, not_found, ErrorResponse};
use crate::models::Recipe;
use crate::AppState;
use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

/// A single recipe with a status message
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub message: String,
    pub recipe: Recipe,
}

#[utoipa::path(
    get,
    path = "/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    )
)]
pub async fn get_recipe(
    State(store): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> impl IntoResponse {
    // A non-numeric id can't name any recipe.
    let Ok(Path(id)) = id else {
        return not_found();
    };

    match store.find_by_id(id).await {
        Ok(Some(recipe)) => (
            StatusCode::OK,
            Json(RecipeResponse {
                message: "Recipe details by id".to_string(),
                recipe,
            }),
        )
            .into_response(),
        Ok(None) => not_found(),
        Err(e) => internal_error("fetch recipe", e),
    }
}
