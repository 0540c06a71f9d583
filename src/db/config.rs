// db/config.rs - Connection settings
//
// Settings come from environment variables, optionally loaded from a `.env`
// file first:
//
//   DATABASE_URL             sqlite::memory: | sqlite://path.db | postgres://...
//   DB_MAX_CONNECTIONS       pool size (default 10)
//   DB_ACQUIRE_TIMEOUT_SECS  how long to wait for a pooled connection (default 5)

use std::env;
use std::time::Duration;

use crate::db::Backend;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DbConfig {
    pub const DEFAULT_URL: &'static str = "sqlite::memory:";
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// A config for `database_url` with default pool settings.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Self::DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// Read the config from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key/value source. `from_env` uses the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| Self::DEFAULT_URL.to_string());

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => parse_positive("DB_MAX_CONNECTIONS", &raw)?,
            None => Self::DEFAULT_MAX_CONNECTIONS,
        };

        let acquire_timeout = match lookup("DB_ACQUIRE_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("DB_ACQUIRE_TIMEOUT_SECS", &raw)?.into()),
            None => Self::DEFAULT_ACQUIRE_TIMEOUT,
        };

        let config = Self {
            database_url,
            max_connections,
            acquire_timeout,
        };
        config.backend()?;

        Ok(config)
    }

    /// Which database the URL points at.
    pub fn backend(&self) -> Result<Backend, ConfigError> {
        let scheme = self
            .database_url
            .split_once(':')
            .map(|(scheme, _)| scheme)
            .unwrap_or_default();

        match scheme {
            "sqlite" => Ok(Backend::Sqlite),
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }

    /// True for SQLite URLs whose database only lives as long as its
    /// connection.
    pub fn is_in_memory(&self) -> bool {
        self.database_url.starts_with("sqlite:")
            && (self.database_url.contains(":memory:") || self.database_url.contains("mode=memory"))
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_URL)
    }
}

fn parse_positive(key: &'static str, raw: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}
