use crate::config::DbConfig;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use diesel::sql_query;
use diesel::sql_types::{Bool, Text};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use thiserror::Error;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../migrations");

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Failed to connect to {target}: {source}")]
    Connect {
        target: &'static str,
        #[source]
        source: ConnectionError,
    },

    #[error("Invalid database name {0:?}: only ASCII letters, digits and '_' are allowed")]
    InvalidDatabaseName(String),

    #[error("Database query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Failed to run database migrations: {0}")]
    Migration(String),

    #[error("Failed to create database pool: {0}")]
    Pool(#[from] r2d2::PoolError),
}

const DATABASE_EXISTS: &str =
    "SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1) AS present";

#[derive(QueryableByName)]
struct DatabaseExists {
    #[diesel(sql_type = Bool)]
    present: bool,
}

/// Makes sure the recipe database and its tables exist.
///
/// Safe to run on every start: the database is only created when
/// `pg_database` has no row for it, and migrations already recorded in
/// diesel's bookkeeping table are skipped.
pub fn ensure_schema(config: &DbConfig) -> Result<(), BootstrapError> {
    ensure_database(config)?;

    let mut conn =
        PgConnection::establish(&config.database_url()).map_err(|source| {
            BootstrapError::Connect {
                target: "recipe database",
                source,
            }
        })?;

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| BootstrapError::Migration(e.to_string()))?;

    if applied.is_empty() {
        tracing::debug!("Schema up to date, no migrations applied");
    } else {
        tracing::info!(count = applied.len(), "Applied pending migrations");
    }

    Ok(())
}

fn ensure_database(config: &DbConfig) -> Result<(), BootstrapError> {
    // CREATE DATABASE takes an identifier, which can't be a bind parameter.
    if !is_valid_database_name(&config.name) {
        return Err(BootstrapError::InvalidDatabaseName(config.name.clone()));
    }

    let mut conn = PgConnection::establish(&config.server_url()).map_err(|source| {
        BootstrapError::Connect {
            target: "database server",
            source,
        }
    })?;

    let exists: DatabaseExists = sql_query(DATABASE_EXISTS)
        .bind::<Text, _>(&config.name)
        .get_result(&mut conn)?;

    if !exists.present {
        sql_query(format!("CREATE DATABASE \"{}\"", config.name)).execute(&mut conn)?;
        tracing::info!(database = %config.name, "Created database");
    }

    Ok(())
}

fn is_valid_database_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 63
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Builds the shared connection pool. Fails if no connection can be opened
/// within the acquisition timeout.
pub fn create_pool(config: &DbConfig) -> Result<DbPool, BootstrapError> {
    let manager = ConnectionManager::<PgConnection>::new(config.database_url());
    let pool = r2d2::Pool::builder()
        .min_idle(Some(config.pool_min))
        .max_size(config.pool_max)
        .connection_timeout(config.acquire_timeout)
        .test_on_check_out(true)
        .build(manager)?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_database_names() {
        assert!(is_valid_database_name("recipe_db"));
        assert!(is_valid_database_name("Recipes2"));
    }

    #[test]
    fn test_invalid_database_names() {
        assert!(!is_valid_database_name(""));
        assert!(!is_valid_database_name("recipe-db"));
        assert!(!is_valid_database_name("x\"; DROP DATABASE postgres; --"));
        assert!(!is_valid_database_name(&"a".repeat(64)));
    }

    #[test]
    fn test_database_exists_query_binds_name() {
        let query = sql_query(DATABASE_EXISTS).bind::<Text, _>("recipe_db");
        let sql = diesel::debug_query::<diesel::pg::Pg, _>(&query).to_string();
        assert!(sql.starts_with("SELECT EXISTS"));
        assert!(sql.contains("datname = $1"));
        assert!(sql.contains("\"recipe_db\""));
    }
}
