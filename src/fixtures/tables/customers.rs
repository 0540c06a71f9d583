// fixtures/tables/customers.rs
//
// The customers table used throughout the examples: a handful of people, each
// tagged with a category label such as "premium" or "standard".
//
// The default seed is exactly one premium and one standard customer, which is
// what the "count premium customers" examples assert against.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db::{checked_identifier, Backend, Statement};
use crate::error::StoreError;
use crate::fixtures::naming::unique_table_name;
use crate::fixtures::TestTable;

pub const DEFAULT_TABLE: &str = "customers";

/// A customer row as read back from the database.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub category: String,
}

/// A customer that has not been inserted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub category: String,
}

impl NewCustomer {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            category: category.into(),
        }
    }

    /// The parameterized INSERT for this customer into `table`.
    pub fn insert_into(&self, table: &str) -> Result<Statement, StoreError> {
        let sql = format!(
            "INSERT INTO {} (first_name, last_name, category) VALUES ($1, $2, $3)",
            checked_identifier(table)?
        );
        Ok(Statement::new(sql)
            .bind(self.first_name.as_str())
            .bind(self.last_name.as_str())
            .bind(self.category.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Premium,
    Standard,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Premium => "premium",
            Category::Standard => "standard",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

/// Fixture for a customers table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomersTable {
    name: String,
    rows: Vec<NewCustomer>,
}

impl CustomersTable {
    /// A fixture for the table called `name`, seeded with [`Self::default_rows`].
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Self::default_rows(),
        }
    }

    /// A fixture with a fresh table name derived from `test_name`, so tests
    /// running in parallel don't share rows.
    pub fn unique(test_name: &str) -> Self {
        Self::named(unique_table_name(DEFAULT_TABLE, test_name))
    }

    /// Replace the seed rows.
    pub fn with_rows(mut self, rows: Vec<NewCustomer>) -> Self {
        self.rows = rows;
        self
    }

    /// One premium and one standard customer.
    pub fn default_rows() -> Vec<NewCustomer> {
        vec![
            NewCustomer::new("Ada", "Lovelace", Category::Premium),
            NewCustomer::new("Alan", "Turing", Category::Standard),
        ]
    }
}

impl Default for CustomersTable {
    fn default() -> Self {
        Self::named(DEFAULT_TABLE)
    }
}

impl TestTable for CustomersTable {
    fn table_name(&self) -> &str {
        &self.name
    }

    fn create_sql(&self, backend: Backend) -> Result<String, StoreError> {
        let name = checked_identifier(&self.name)?;
        let id_column = match backend {
            Backend::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT",
            Backend::Postgres => "id BIGSERIAL PRIMARY KEY",
        };

        Ok(format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                {},
                first_name VARCHAR(100) NOT NULL,
                last_name VARCHAR(100) NOT NULL,
                category VARCHAR(50) NOT NULL
            )
            "#,
            name, id_column
        ))
    }

    fn seed(&self) -> Result<Vec<Statement>, StoreError> {
        self.rows
            .iter()
            .map(|customer| customer.insert_into(&self.name))
            .collect()
    }
}
