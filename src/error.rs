// error.rs - Error types for the database layer
//
// Library functions return these typed errors. Binaries and tests wrap them
// in `anyhow::Error` at the edges.

use thiserror::Error;

/// Problems with the connection settings read from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("unsupported database URL {0:?} (expected a sqlite: or postgres: URL)")]
    UnsupportedScheme(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A table or column name that cannot be safely spliced into SQL text.
    #[error("invalid SQL identifier {0:?}")]
    InvalidIdentifier(String),
}
