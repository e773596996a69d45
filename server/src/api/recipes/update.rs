use super::get::RecipeResponse;
use crate::api::{error_response, internal_error, not_found, ErrorResponse};
use crate::models::RecipePatch;
use crate::types::RecipeFields;
use crate::validation::ValidationError;
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

const FAILED: &str = "Recipe update failed!";

fn update_failed(error: ValidationError) -> Response {
    tracing::debug!(error = %error, "Rejected recipe update");
    error_response(StatusCode::BAD_REQUEST, FAILED, Some(error.to_string()))
}

/// Partial update: only the supplied fields change, `updated_at` always moves.
#[utoipa::path(
    patch,
    path = "/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    request_body = RecipeFields,
    responses(
        (status = 200, description = "Recipe updated successfully", body = RecipeResponse),
        (status = 400, description = "No recognized field, or an invalid one", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    )
)]
pub async fn update_recipe(
    State(store): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<RecipeFields>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Path(id)) = id else {
        return not_found();
    };

    let fields = match payload {
        Ok(Json(fields)) => fields,
        Err(rejection) => {
            return update_failed(ValidationError::MalformedBody(rejection.body_text()))
        }
    };

    let patch = match RecipePatch::try_from(fields) {
        Ok(p) => p,
        Err(e) => return update_failed(e),
    };

    match store.update(id, patch).await {
        Ok(Some(recipe)) => {
            tracing::info!(recipe_id = recipe.id, "Updated recipe");
            (
                StatusCode::OK,
                Json(RecipeResponse {
                    message: "Recipe successfully updated!".to_string(),
                    recipe,
                }),
            )
                .into_response()
        }
        Ok(None) => not_found(),
        Err(e) => internal_error("update recipe", e),
    }
}
