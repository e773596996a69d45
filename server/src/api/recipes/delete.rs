use crate::api::{internal_error, not_found, ErrorResponse, MessageResponse};
use crate::AppState;
use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

#[utoipa::path(
    delete,
    path = "/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe deleted", body = MessageResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    )
)]
pub async fn delete_recipe(
    State(store): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> impl IntoResponse {
    let Ok(Path(id)) = id else {
        return not_found();
    };

    match store.delete(id).await {
        Ok(true) => {
            tracing::info!(recipe_id = id, "Deleted recipe");
            (
                StatusCode::OK,
                Json(MessageResponse {
                    message: "Recipe successfully removed!".to_string(),
                }),
            )
                .into_response()
        }
        Ok(false) => not_found(),
        Err(e) => internal_error("delete recipe", e),
    }
}
