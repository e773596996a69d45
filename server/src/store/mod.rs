//! Recipe persistence.
//!
//! Handlers only see the [`RecipeStore`] trait, so the router can run against
//! PostgreSQL in production and an in-memory store in tests.

#[cfg(test)]
pub mod memory;
mod postgres;

pub use postgres::PgStore;

use crate::models::{NewRecipe, Recipe, RecipePatch};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database connection unavailable: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("Query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Storage operations for recipes.
///
/// Each call runs a single statement on one connection, released before the
/// call returns, whatever the outcome.
#[async_trait]
pub trait RecipeStore: Send + Sync + fmt::Debug {
    /// Inserts a recipe; the store assigns the id and both timestamps.
    async fn insert(&self, recipe: NewRecipe) -> Result<Recipe, StoreError>;

    /// All recipes in insertion (id) order.
    async fn list_all(&self) -> Result<Vec<Recipe>, StoreError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Recipe>, StoreError>;

    /// Applies the supplied fields and refreshes `updated_at`.
    /// Returns `None` when no recipe has this id.
    async fn update(&self, id: i32, patch: RecipePatch) -> Result<Option<Recipe>, StoreError>;

    /// Returns whether a recipe was removed.
    async fn delete(&self, id: i32) -> Result<bool, StoreError>;

    /// Acquires and releases a connection, confirming the database answers.
    async fn ping(&self) -> Result<(), StoreError>;
}
