//! Process settings from environment variables (`.env` is loaded by the binary).

use crate::error::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/mfg_records";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// Descriptor file overriding the bundled resource table.
    pub resources_path: Option<PathBuf>,
    /// Create missing resource tables at startup.
    pub auto_migrate: bool,
    /// Create the database itself when missing.
    pub create_database: bool,
    pub body_limit: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Ok(Settings {
            port: parse_or(&get, "PORT", DEFAULT_PORT)?,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            resources_path: get("RESOURCES_PATH").map(PathBuf::from),
            auto_migrate: flag(&get, "AUTO_MIGRATE")?,
            create_database: flag(&get, "CREATE_DATABASE")?,
            body_limit: parse_or(&get, "BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT)?,
        })
    }
}

fn parse_or<T: FromStr>(get: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T, ConfigError> {
    match get(name) {
        Some(v) => v
            .parse()
            .map_err(|_| ConfigError::Validation(format!("{} has invalid value '{}'", name, v))),
        None => Ok(default),
    }
}

fn flag(get: &impl Fn(&str) -> Option<String>, name: &str) -> Result<bool, ConfigError> {
    match get(name).map(|v| v.to_ascii_lowercase()).as_deref() {
        None | Some("0") | Some("false") | Some("no") => Ok(false),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some(other) => Err(ConfigError::Validation(format!("{} has invalid value '{}'", name, other))),
    }
}
