//! Process configuration read from environment variables.
//!
//! Every setting has a default suitable for local development, so the server
//! starts against a stock local PostgreSQL without any variables set.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Database the bootstrap connects to while the target database may not exist yet.
const MAINTENANCE_DATABASE: &str = "postgres";

/// Everything but RFC 3986 unreserved characters gets escaped in URL components.
const URL_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a number, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("DB_POOL_MIN ({min}) cannot exceed DB_POOL_MAX ({max})")]
    PoolBounds { min: u32, max: u32 },

    #[error("DB_POOL_MAX must be at least 1")]
    EmptyPool,

    #[error("DB_POOL_TIMEOUT_SECS must be at least 1")]
    ZeroTimeout,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub pool_min: u32,
    pub pool_max: u32,
    pub acquire_timeout: Duration,
}

impl DbConfig {
    /// URL of the recipe database itself.
    pub fn database_url(&self) -> String {
        self.url_for(&self.name)
    }

    /// URL of the maintenance database on the same server, used to create
    /// the recipe database when it is missing.
    pub fn server_url(&self) -> String {
        self.url_for(MAINTENANCE_DATABASE)
    }

    fn url_for(&self, database: &str) -> String {
        let user = utf8_percent_encode(&self.user, URL_COMPONENT);
        let database = utf8_percent_encode(database, URL_COMPONENT);
        if self.password.is_empty() {
            format!("postgres://{}@{}:{}/{}", user, self.host, self.port, database)
        } else {
            let password = utf8_percent_encode(&self.password, URL_COMPONENT);
            format!(
                "postgres://{}:{}@{}:{}/{}",
                user, password, self.host, self.port, database
            )
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db: DbConfig,
    /// HTTP listen port.
    pub port: u16,
    /// Adds an `X-DB-Query-Count` header to every response.
    pub track_db_query_count: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, so tests don't have to
    /// touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let pool_min = parse_or(&lookup, "DB_POOL_MIN", 1u32)?;
        let pool_max = parse_or(&lookup, "DB_POOL_MAX", 20u32)?;
        if pool_max == 0 {
            return Err(ConfigError::EmptyPool);
        }
        if pool_min > pool_max {
            return Err(ConfigError::PoolBounds {
                min: pool_min,
                max: pool_max,
            });
        }

        let timeout_secs = parse_or(&lookup, "DB_POOL_TIMEOUT_SECS", 5u64)?;
        if timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let db = DbConfig {
            host: text("DB_HOST", "localhost"),
            port: parse_or(&lookup, "DB_PORT", 5432u16)?,
            user: text("DB_USER", "postgres"),
            password: text("DB_PASSWORD", ""),
            name: text("DB_NAME", "recipe_db"),
            pool_min,
            pool_max,
            acquire_timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            db,
            port: parse_or(&lookup, "PORT", 3000u16)?,
            track_db_query_count: lookup("TRACK_DB_QUERY_COUNT").is_some_and(|v| v == "1"),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
    }
}
