// common/mod.rs - Shared test utilities
//
// Every test gets its own in-memory SQLite database, so tests never see each
// other's rows and no database server is needed.

#![allow(dead_code)]

use db_fixtures::db::{Database, DbConfig};
use db_fixtures::fixtures::TestTable;
use db_fixtures::queries;
use db_fixtures::telemetry;

/// A fresh, empty in-memory database.
pub async fn create_test_db() -> anyhow::Result<Database> {
    telemetry::init_test_tracing();
    let db = Database::connect(&DbConfig::new("sqlite::memory:")).await?;
    Ok(db)
}

/// Rows currently in `table`.
pub async fn row_count<T: TestTable>(db: &Database, table: &T) -> anyhow::Result<i64> {
    Ok(queries::count_all(db, table.table_name()).await?)
}
