//! Runtime settings read from the environment (optionally seeded from a `.env` file).

use crate::config::validate;
use crate::error::ConfigError;

pub const DEFAULT_SCHEMA: &str = "doc_crud";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug)]
pub struct Settings {
    /// PostgreSQL URL. When unset the service runs on the in-memory store.
    pub database_url: Option<String>,
    /// PostgreSQL schema holding one table per collection.
    pub schema: String,
    pub bind_addr: String,
    /// Absolute base (e.g. `https://api.example.com`) for `Location` headers. Falls back to the `Host` header.
    pub public_base_url: Option<String>,
    pub body_limit_bytes: usize,
    pub db_max_connections: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: None,
            schema: DEFAULT_SCHEMA.into(),
            bind_addr: DEFAULT_BIND_ADDR.into(),
            public_base_url: None,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            db_max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl Settings {
    /// Load `.env` if present, read the environment and validate.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let settings = Self::from_lookup(|var| std::env::var(var).ok())?;
        validate(&settings)?;
        Ok(settings)
    }

    /// Build settings from a variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Settings::default();
        Ok(Settings {
            database_url: get("DATABASE_URL"),
            schema: get("DOC_CRUD_SCHEMA").unwrap_or(defaults.schema),
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            public_base_url: get("PUBLIC_BASE_URL").map(|u| u.trim_end_matches('/').to_string()),
            body_limit_bytes: parse_or(get("BODY_LIMIT_BYTES"), "BODY_LIMIT_BYTES", defaults.body_limit_bytes)?,
            db_max_connections: parse_or(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match raw {
        Some(s) => s.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            var,
            reason: format!("'{}': {}", s, e),
        }),
        None => Ok(default),
    }
}
