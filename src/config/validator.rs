//! Settings and collection-name validation.

use crate::config::Settings;
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]{0,255}$").expect("static name pattern compiles"))
}

pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    if !name_pattern().is_match(&settings.schema) {
        return Err(ConfigError::InvalidValue {
            var: "DOC_CRUD_SCHEMA",
            reason: format!("'{}' is not a valid schema name", settings.schema),
        });
    }
    if let Some(url) = &settings.public_base_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                var: "PUBLIC_BASE_URL",
                reason: format!("'{}' must start with http:// or https://", url),
            });
        }
    }
    if settings.body_limit_bytes == 0 {
        return Err(ConfigError::InvalidValue {
            var: "BODY_LIMIT_BYTES",
            reason: "must be greater than zero".into(),
        });
    }
    if settings.db_max_connections == 0 {
        return Err(ConfigError::InvalidValue {
            var: "DB_MAX_CONNECTIONS",
            reason: "must be greater than zero".into(),
        });
    }
    Ok(())
}

/// Collection names must be identifiers and unique within the list.
pub fn validate_collection_names<S: AsRef<str>>(names: &[S]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for name in names {
        let name = name.as_ref();
        if !name_pattern().is_match(name) {
            return Err(ConfigError::InvalidCollectionName(name.to_string()));
        }
        if !seen.insert(name) {
            return Err(ConfigError::DuplicateCollection(name.to_string()));
        }
    }
    Ok(())
}
