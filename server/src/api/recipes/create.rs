use super::get::RecipeResponse;
use crate::api::{error_response, internal_error, ErrorResponse};
use crate::models::NewRecipe;
use crate::types::RecipeFields;
use crate::validation::ValidationError;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

const FAILED: &str = "Recipe creation failed!";

fn creation_failed(error: ValidationError) -> Response {
    tracing::debug!(error = %error, "Rejected recipe");
    error_response(StatusCode::BAD_REQUEST, FAILED, Some(error.to_string()))
}

#[utoipa::path(
    post,
    path = "/recipes",
    tag = "recipes",
    request_body = RecipeFields,
    responses(
        (status = 201, description = "Recipe created successfully", body = RecipeResponse),
        (status = 400, description = "Missing, empty or invalid field", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    )
)]
pub async fn create_recipe(
    State(store): State<AppState>,
    payload: Result<Json<RecipeFields>, JsonRejection>,
) -> impl IntoResponse {
    let fields = match payload {
        Ok(Json(fields)) => fields,
        Err(rejection) => {
            return creation_failed(ValidationError::MalformedBody(rejection.body_text()))
        }
    };

    let new_recipe = match NewRecipe::try_from(fields) {
        Ok(r) => r,
        Err(e) => return creation_failed(e),
    };

    match store.insert(new_recipe).await {
        Ok(recipe) => {
            tracing::info!(recipe_id = recipe.id, "Created recipe");
            (
                StatusCode::CREATED,
                Json(RecipeResponse {
                    message: "Recipe successfully created!".to_string(),
                    recipe,
                }),
            )
                .into_response()
        }
        Err(e) => internal_error("create recipe", e),
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{app, send, TEA};
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_create_recipe() {
        let (app, store) = app();
        let (status, body) = send(&app, Method::POST, "/recipes", Some(TEA)).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Recipe successfully created!");
        let recipe = &body["recipe"];
        assert!(recipe["id"].as_i64().unwrap() > 0);
        assert_eq!(recipe["title"], "Tea");
        assert_eq!(recipe["making_time"], "5 min");
        assert_eq!(recipe["serves"], "1");
        assert_eq!(recipe["ingredients"], "Water, Tea Leaves, Sugar");
        assert_eq!(recipe["cost"], 100);
        assert_eq!(recipe["created_at"], recipe["updated_at"]);
        assert_eq!(store.count(), 1);
    }

    #[tokio::test]
    async fn test_create_assigns_unique_ids() {
        let (app, _store) = app();
        let (_, first) = send(&app, Method::POST, "/recipes", Some(TEA)).await;
        let (_, second) = send(&app, Method::POST, "/recipes", Some(TEA)).await;
        assert_ne!(first["recipe"]["id"], second["recipe"]["id"]);
    }

    #[tokio::test]
    async fn test_create_accepts_string_cost() {
        let (app, _store) = app();
        let body = TEA.replace("\"cost\":100", "\"cost\":\"250\"");
        let (status, body) = send(&app, Method::POST, "/recipes", Some(&body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["recipe"]["cost"], 250);
    }

    #[tokio::test]
    async fn test_create_accepts_whole_float_cost() {
        let (app, _store) = app();
        let body = TEA.replace("\"cost\":100", "\"cost\":100.0");
        let (status, body) = send(&app, Method::POST, "/recipes", Some(&body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["recipe"]["cost"], 100);
    }

    #[tokio::test]
    async fn test_create_rejects_fractional_and_oversized_cost() {
        let cases = [
            ("12.5", "cost must be an integer"),
            ("18446744073709551615", "cost is out of range"),
            ("2147483648", "cost is out of range"),
        ];

        let (app, store) = app();
        for (cost, reason) in cases {
            let body = TEA.replace("\"cost\":100", &format!("\"cost\":{cost}"));
            let (status, body) = send(&app, Method::POST, "/recipes", Some(&body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "cost: {cost}");
            assert_eq!(body["message"], "Recipe creation failed!");
            let actual = body["reason"].as_str().unwrap();
            assert!(actual.starts_with(reason), "cost: {cost}, reason: {actual}");
        }
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_payloads() {
        let payloads = [
            r#"{"title":"Tea","making_time":"5 min","serves":"1","ingredients":"Water"}"#,
            r#"{"title":"","making_time":"5 min","serves":"1","ingredients":"Water","cost":100}"#,
            r#"{"title":"Tea","making_time":"5 min","serves":"1","ingredients":"Water","cost":0}"#,
            r#"{"title":"Tea","making_time":"5 min","serves":"1","ingredients":"Water","cost":"abc"}"#,
            r#"{"title":"Tea","making_time":"5 min","serves":"1","ingredients":"Water","cost":-3}"#,
            r#"{"title":"Tea","making_time":5,"serves":"1","ingredients":"Water","cost":100}"#,
            r#"not json"#,
            r#"[]"#,
        ];

        let (app, store) = app();
        for payload in payloads {
            let (status, body) = send(&app, Method::POST, "/recipes", Some(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload: {payload}");
            assert_eq!(body["message"], "Recipe creation failed!");
            assert!(body["reason"].is_string());
        }
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn test_create_without_body() {
        let (app, store) = app();
        let (status, _) = send(&app, Method::POST, "/recipes", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn test_create_database_error() {
        let (app, store) = app();
        store.set_failing(true);
        let (status, body) = send(&app, Method::POST, "/recipes", Some(TEA)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }
}
