// fixtures/mod.rs - Test fixtures module
//
// What is a fixture?
// A fixture is reusable test setup code. Instead of writing the same database
// setup in every test, we write it once and reuse it - and, just as
// important, we write the cleanup once and make sure it always runs.
//
// Two layers live here:
// - `scoped`: the generic runner. Setup, then the test body, then teardown,
//   whatever the body did. Knows nothing about databases.
// - `TestTable` + `with_table`: the runner applied to a table. Setup creates
//   the table and inserts known rows, teardown deletes them again.
//
// Example:
//   with_table(&db, &CustomersTable::default(), |db| async move {
//       assert_eq!(count_by_category(&db, "customers", "premium").await?, 1);
//       Ok::<_, anyhow::Error>(())
//   }).await?;

pub mod naming;
pub mod scoped;

#[cfg(feature = "db-tools")]
pub mod tables;

pub use naming::{sanitize_identifier, unique_table_name};
pub use scoped::{run_scoped, run_scoped_async, FixtureError};

#[cfg(feature = "db-tools")]
pub use table::*;

#[cfg(feature = "db-tools")]
mod table {
    use std::future::Future;

    use tracing::Instrument;

    use super::{run_scoped_async, FixtureError};
    use crate::db::{checked_identifier, Backend, Database, Statement};
    use crate::error::StoreError;

    /// A table that tests can create, fill with known rows and empty again.
    pub trait TestTable {
        fn table_name(&self) -> &str;

        /// `CREATE TABLE IF NOT EXISTS ...` for the given dialect.
        fn create_sql(&self, backend: Backend) -> Result<String, StoreError>;

        /// Parameterized statements inserting the seed rows.
        fn seed(&self) -> Result<Vec<Statement>, StoreError>;

        fn clear_sql(&self) -> Result<String, StoreError> {
            Ok(format!("DELETE FROM {}", checked_identifier(self.table_name())?))
        }

        fn drop_sql(&self) -> Result<String, StoreError> {
            Ok(format!(
                "DROP TABLE IF EXISTS {}",
                checked_identifier(self.table_name())?
            ))
        }
    }

    /// Create the table if needed, drop leftover rows and insert the seed.
    ///
    /// Clearing and seeding happen in one committed transaction, so a failed
    /// insert leaves no partial seed behind. Can be called repeatedly.
    pub async fn setup_table<T>(db: &Database, table: &T) -> Result<(), StoreError>
    where
        T: TestTable + ?Sized,
    {
        db.execute(&Statement::new(table.create_sql(db.backend())?))
            .await?;

        let mut statements = vec![Statement::new(table.clear_sql()?)];
        statements.extend(table.seed()?);
        db.execute_all(&statements).await?;

        tracing::debug!(table = table.table_name(), "Table fixture ready");
        Ok(())
    }

    /// Delete every row from the table and commit. The table itself stays.
    pub async fn teardown_table<T>(db: &Database, table: &T) -> Result<(), StoreError>
    where
        T: TestTable + ?Sized,
    {
        let removed = db
            .execute_all(&[Statement::new(table.clear_sql()?)])
            .await?;

        tracing::debug!(table = table.table_name(), removed, "Table fixture cleared");
        Ok(())
    }

    /// Remove the table entirely. Useful for per-test tables built with
    /// `unique_table_name`.
    pub async fn drop_table<T>(db: &Database, table: &T) -> Result<(), StoreError>
    where
        T: TestTable + ?Sized,
    {
        db.execute(&Statement::new(table.drop_sql()?)).await?;
        Ok(())
    }

    /// Run `test_fn` with `table` set up, clearing it afterwards even if the
    /// test returns an error or panics.
    ///
    /// The test receives its own handle to the database.
    pub async fn with_table<T, R, F, Fut>(
        db: &Database,
        table: &T,
        test_fn: F,
    ) -> Result<R, FixtureError<anyhow::Error>>
    where
        T: TestTable + ?Sized,
        F: FnOnce(Database) -> Fut,
        Fut: Future<Output = anyhow::Result<R>>,
    {
        let span = tracing::info_span!("fixture", table = table.table_name());

        run_scoped_async(
            || async move {
                setup_table(db, table).await?;
                Ok::<_, anyhow::Error>(db.clone())
            },
            test_fn,
            |db: Database| async move {
                teardown_table(&db, table).await?;
                Ok::<_, anyhow::Error>(())
            },
        )
        .instrument(span)
        .await
    }
}
