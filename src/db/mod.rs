// db/mod.rs - Connecting to the database and running statements
//
// `Database` is a thin handle around a sqlx `Any` pool. It is cheap to clone
// and is the context value handed to fixture bodies. The same code runs
// against SQLite (the default, in memory) and PostgreSQL.

pub mod config;
pub mod statement;

pub use config::DbConfig;
pub use statement::{checked_identifier, Param, Statement};

use std::fmt;
use std::time::Duration;

use sqlx::any::{install_default_drivers, AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, FromRow, Row};

use crate::error::StoreError;

/// Which SQL dialect the connection speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Sqlite => write!(f, "sqlite"),
            Backend::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Database {
    pool: AnyPool,
    backend: Backend,
}

impl Database {
    /// Open a connection pool for `config`.
    pub async fn connect(config: &DbConfig) -> Result<Self, StoreError> {
        let backend = config.backend()?;
        install_default_drivers();

        let mut options = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Duration::from_secs(60))
            .max_lifetime(Duration::from_secs(1800));

        // An in-memory SQLite database disappears with its connection, and
        // each new connection would open a separate empty one.
        if config.is_in_memory() {
            options = options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = options.connect(&config.database_url).await?;
        tracing::info!(%backend, "Connected to database");

        Ok(Self { pool, backend })
    }

    /// Connect using `DATABASE_URL` and friends from the environment.
    pub async fn connect_from_env() -> Result<Self, StoreError> {
        let config = DbConfig::from_env()?;
        Self::connect(&config).await
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Check the connection with `SELECT 1`.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.fetch_i64(&Statement::new("SELECT 1")).await?;
        Ok(())
    }

    /// Run one statement in autocommit mode and return the affected row count.
    pub async fn execute(&self, statement: &Statement) -> Result<u64, StoreError> {
        tracing::debug!(sql = statement.sql(), params = statement.params().len(), "Executing statement");
        let result = statement.query().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Run all statements in one transaction and commit.
    ///
    /// If any statement fails the transaction is rolled back (on drop) and
    /// nothing is committed.
    pub async fn execute_all(&self, statements: &[Statement]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut affected = 0;

        for statement in statements {
            tracing::debug!(sql = statement.sql(), params = statement.params().len(), "Executing statement");
            affected += statement.query().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        tracing::debug!(statements = statements.len(), affected, "Committed transaction");

        Ok(affected)
    }

    /// Run a query and map every row with `FromRow`.
    pub async fn fetch_all<T>(&self, statement: &Statement) -> Result<Vec<T>, StoreError>
    where
        T: for<'r> FromRow<'r, AnyRow>,
    {
        tracing::debug!(sql = statement.sql(), params = statement.params().len(), "Fetching rows");
        let rows = statement.query().fetch_all(&self.pool).await?;
        let items = rows
            .iter()
            .map(|row| T::from_row(row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Run a query returning a single integer, such as `COUNT(*)`.
    pub async fn fetch_i64(&self, statement: &Statement) -> Result<i64, StoreError> {
        tracing::debug!(sql = statement.sql(), params = statement.params().len(), "Fetching scalar");
        let row = statement.query().fetch_one(&self.pool).await?;
        Ok(row.try_get::<i64, _>(0)?)
    }

    /// Close the pool, waiting for connections to be released.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_db() -> Database {
        Database::connect(&DbConfig::default()).await.unwrap()
    }

    #[tokio::test]
    async fn test_connect_and_ping() {
        let db = memory_db().await;
        assert_eq!(db.backend(), Backend::Sqlite);
        db.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_in_memory_state_survives_across_calls() {
        let db = memory_db().await;
        db.execute(&Statement::new("CREATE TABLE notes (body TEXT NOT NULL)"))
            .await
            .unwrap();
        db.execute(&Statement::new("INSERT INTO notes (body) VALUES ($1)").bind("hello"))
            .await
            .unwrap();

        let count = db
            .fetch_i64(&Statement::new("SELECT COUNT(*) FROM notes"))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_execute_all_rolls_back_on_failure() {
        let db = memory_db().await;
        db.execute(&Statement::new("CREATE TABLE notes (body TEXT NOT NULL)"))
            .await
            .unwrap();

        let result = db
            .execute_all(&[
                Statement::new("INSERT INTO notes (body) VALUES ($1)").bind("kept?"),
                Statement::new("INSERT INTO notes (body) VALUES ($1)").bind(Param::Null),
            ])
            .await;
        assert!(result.is_err(), "NOT NULL violation should fail the batch");

        let count = db
            .fetch_i64(&Statement::new("SELECT COUNT(*) FROM notes"))
            .await
            .unwrap();
        assert_eq!(count, 0, "first insert must have been rolled back");
    }

    #[tokio::test]
    async fn test_integer_null_binds_into_integer_column() {
        let db = memory_db().await;
        db.execute(&Statement::new("CREATE TABLE visits (customer_id BIGINT)"))
            .await
            .unwrap();
        db.execute(&Statement::new("INSERT INTO visits (customer_id) VALUES ($1)").bind(Param::NullInt))
            .await
            .unwrap();
        db.execute(&Statement::new("INSERT INTO visits (customer_id) VALUES ($1)").bind(7_i64))
            .await
            .unwrap();

        let nulls = db
            .fetch_i64(&Statement::new("SELECT COUNT(*) FROM visits WHERE customer_id IS NULL"))
            .await
            .unwrap();
        assert_eq!(nulls, 1);
    }

    #[tokio::test]
    async fn test_connect_rejects_unknown_scheme() {
        let err = Database::connect(&DbConfig::new("mysql://localhost/db"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn test_backend_display() {
        assert_eq!(Backend::Sqlite.to_string(), "sqlite");
        assert_eq!(Backend::Postgres.to_string(), "postgres");
    }
}
