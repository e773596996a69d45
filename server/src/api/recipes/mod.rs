pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use crate::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

pub const PATH: &str = "/recipes";
pub const PATH_ID: &str = "/recipes/{id}";

/// Returns the router for the /recipes endpoints
pub fn router() -> Router<AppState> {
    Router::new()
        .route(PATH, get(list::list_recipes).post(create::create_recipe))
        .route(
            PATH_ID,
            get(get::get_recipe)
                .patch(update::update_recipe)
                .delete(delete::delete_recipe),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create::create_recipe,
        list::list_recipes,
        get::get_recipe,
        update::update_recipe,
        delete::delete_recipe,
    ),
    components(schemas(
        crate::models::Recipe,
        crate::types::RecipeFields,
        crate::types::CostValue,
        get::RecipeResponse,
        list::ListRecipesResponse,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use crate::api::test_support::{app, send, TEA};
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_recipe_lifecycle() {
        let (app, _store) = app();

        let (status, created) = send(&app, Method::POST, "/recipes", Some(TEA)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["recipe"]["cost"], 100);
        let uri = format!("/recipes/{}", created["recipe"]["id"]);

        let (status, fetched) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        for field in ["title", "making_time", "serves", "ingredients", "cost"] {
            assert_eq!(fetched["recipe"][field], created["recipe"][field]);
        }

        let (status, updated) = send(&app, Method::PATCH, &uri, Some(r#"{"cost":150}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["recipe"]["cost"], 150);
        assert_eq!(updated["recipe"]["title"], "Tea");

        let (status, listed) = send(&app, Method::GET, "/recipes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["recipes"][0], updated["recipe"]);

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
