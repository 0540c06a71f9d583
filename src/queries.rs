// queries.rs - The functions under test
//
// Every function here takes the table name and the values separately. The
// table name is checked as an identifier; the values are bound as parameters
// and never pasted into the SQL text.
//
// The one exception is `find_by_last_name_concatenated`, which shows what
// happens when you do paste user input into SQL.

use crate::db::{checked_identifier, Database, Statement};
use crate::error::StoreError;
use crate::fixtures::tables::{Customer, NewCustomer};

const CUSTOMER_COLUMNS: &str = "id, first_name, last_name, category";

/// Insert one customer and commit.
pub async fn insert_customer(
    db: &Database,
    table: &str,
    customer: &NewCustomer,
) -> Result<u64, StoreError> {
    db.execute_all(&[customer.insert_into(table)?]).await
}

/// How many customers carry the `category` label.
pub async fn count_by_category(db: &Database, table: &str, category: &str) -> Result<i64, StoreError> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE category = $1",
        checked_identifier(table)?
    );
    db.fetch_i64(&Statement::new(sql).bind(category)).await
}

pub async fn count_all(db: &Database, table: &str) -> Result<i64, StoreError> {
    let sql = format!("SELECT COUNT(*) FROM {}", checked_identifier(table)?);
    db.fetch_i64(&Statement::new(sql)).await
}

/// All customers, oldest first.
pub async fn list_customers(db: &Database, table: &str) -> Result<Vec<Customer>, StoreError> {
    let sql = format!(
        "SELECT {} FROM {} ORDER BY id",
        CUSTOMER_COLUMNS,
        checked_identifier(table)?
    );
    db.fetch_all(&Statement::new(sql)).await
}

/// Look customers up by last name. Safe for any input.
pub async fn find_by_last_name(
    db: &Database,
    table: &str,
    last_name: &str,
) -> Result<Vec<Customer>, StoreError> {
    let sql = format!(
        "SELECT {} FROM {} WHERE last_name = $1 ORDER BY id",
        CUSTOMER_COLUMNS,
        checked_identifier(table)?
    );
    db.fetch_all(&Statement::new(sql).bind(last_name)).await
}

/// The same lookup written the wrong way: `last_name` is pasted into the SQL
/// string between quotes.
///
/// DO NOT copy this pattern. Input such as `' OR '1'='1` closes the quote and
/// turns the WHERE clause into something that matches every row. It is kept
/// so the injection can be demonstrated next to the parameterized version.
pub async fn find_by_last_name_concatenated(
    db: &Database,
    table: &str,
    last_name: &str,
) -> Result<Vec<Customer>, StoreError> {
    let sql = format!(
        "SELECT {} FROM {} WHERE last_name = '{}' ORDER BY id",
        CUSTOMER_COLUMNS,
        checked_identifier(table)?,
        last_name
    );
    db.fetch_all(&Statement::new(sql)).await
}
