//! In-memory [`RecipeStore`] for handler tests.

use super::{RecipeStore, StoreError};
use crate::models::{NewRecipe, Recipe, RecipePatch};
use async_trait::async_trait;
use chrono::Utc;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Rows {
    next_id: i32,
    recipes: Vec<Recipe>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Rows>,
    /// When set, every operation fails as if the database went away.
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().recipes.len()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Query(DieselError::DatabaseError(
                DatabaseErrorKind::ClosedConnection,
                Box::new("connection closed".to_string()),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RecipeStore for MemoryStore {
    async fn insert(&self, recipe: NewRecipe) -> Result<Recipe, StoreError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        rows.next_id += 1;
        let now = Utc::now();
        let row = Recipe {
            id: rows.next_id,
            title: recipe.title,
            making_time: recipe.making_time,
            serves: recipe.serves,
            ingredients: recipe.ingredients,
            cost: recipe.cost,
            created_at: now,
            updated_at: now,
        };
        rows.recipes.push(row.clone());
        Ok(row)
    }

    async fn list_all(&self) -> Result<Vec<Recipe>, StoreError> {
        self.check()?;
        Ok(self.rows.lock().unwrap().recipes.clone())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Recipe>, StoreError> {
        self.check()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows.recipes.iter().find(|r| r.id == id).cloned())
    }

    async fn update(&self, id: i32, patch: RecipePatch) -> Result<Option<Recipe>, StoreError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.recipes.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };

        if let Some(title) = patch.title {
            row.title = title;
        }
        if let Some(making_time) = patch.making_time {
            row.making_time = making_time;
        }
        if let Some(serves) = patch.serves {
            row.serves = serves;
        }
        if let Some(ingredients) = patch.ingredients {
            row.ingredients = ingredients;
        }
        if let Some(cost) = patch.cost {
            row.cost = cost;
        }
        row.updated_at = Utc::now().max(row.updated_at);

        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let before = rows.recipes.len();
        rows.recipes.retain(|r| r.id != id);
        Ok(rows.recipes.len() < before)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }
}
