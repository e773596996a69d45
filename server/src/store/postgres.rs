use super::{RecipeStore, StoreError};
use crate::db::DbPool;
use crate::models::{NewRecipe, Recipe, RecipePatch};
use crate::schema::recipes;
use async_trait::async_trait;
use diesel::dsl::now;
use diesel::prelude::*;

/// [`RecipeStore`] backed by the r2d2 pool of PostgreSQL connections.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl std::fmt::Debug for PgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.pool.state();
        f.debug_struct("PgStore")
            .field("connections", &state.connections)
            .field("idle_connections", &state.idle_connections)
            .finish()
    }
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Runs one diesel statement on a pooled connection off the async runtime.
    ///
    /// The pooled connection is dropped when the closure returns, which puts it
    /// back in the pool on success, on error, and on panic.
    async fn run<T, F>(&self, op: &'static str, query: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> QueryResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        // Created here, not on the blocking thread, so the per-request query
        // counter (a task-local) sees it.
        let span = tracing::info_span!("db.query", op);

        tokio::task::spawn_blocking(move || -> Result<T, StoreError> {
            let _entered = span.enter();
            let mut conn = pool.get()?;
            Ok(query(&mut conn)?)
        })
        .await?
    }
}

#[async_trait]
impl RecipeStore for PgStore {
    async fn insert(&self, recipe: NewRecipe) -> Result<Recipe, StoreError> {
        self.run("insert", move |conn| {
            diesel::insert_into(recipes::table)
                .values(&recipe)
                .returning(Recipe::as_returning())
                .get_result(conn)
        })
        .await
    }

    async fn list_all(&self) -> Result<Vec<Recipe>, StoreError> {
        self.run("list_all", |conn| {
            recipes::table
                .select(Recipe::as_select())
                .order(recipes::id.asc())
                .load(conn)
        })
        .await
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Recipe>, StoreError> {
        self.run("find_by_id", move |conn| {
            recipes::table
                .find(id)
                .select(Recipe::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn update(&self, id: i32, patch: RecipePatch) -> Result<Option<Recipe>, StoreError> {
        self.run("update", move |conn| {
            diesel::update(recipes::table.find(id))
                .set((&patch, recipes::updated_at.eq(now)))
                .returning(Recipe::as_returning())
                .get_result(conn)
                .optional()
        })
        .await
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let deleted = self
            .run("delete", move |conn| {
                diesel::delete(recipes::table.find(id)).execute(conn)
            })
            .await?;

        Ok(deleted > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.run("ping", |conn| {
            diesel::sql_query("SELECT 1").execute(conn).map(|_| ())
        })
        .await
    }
}
