// Show the difference between pasting input into SQL and binding it.
//
//   cargo run --bin injection_demo -- "' OR '1'='1"
//
// Both lookups search the customers table for a last name. The first builds
// the SQL with string formatting, the second passes the input as a parameter.

use anyhow::Result;
use db_fixtures::db::Database;
use db_fixtures::fixtures::tables::CustomersTable;
use db_fixtures::fixtures::{with_table, TestTable};
use db_fixtures::queries;
use db_fixtures::telemetry;

const DEFAULT_PAYLOAD: &str = "' OR '1'='1";

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let payload = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_PAYLOAD.to_string());

    let db = Database::connect_from_env().await?;
    let table = CustomersTable::default();
    let name = table.table_name();

    println!("Looking up last_name = {:?}\n", payload);

    with_table(&db, &table, |db| async move {
        let concatenated = queries::find_by_last_name_concatenated(&db, name, &payload).await;
        match concatenated {
            Ok(rows) => {
                println!("String concatenation returned {} row(s):", rows.len());
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
            Err(e) => {
                println!("String concatenation failed: {}", e);
            }
        }

        let bound = queries::find_by_last_name(&db, name, &payload).await?;
        println!("\nParameterized query returned {} row(s):", bound.len());
        println!("{}", serde_json::to_string_pretty(&bound)?);

        Ok::<_, anyhow::Error>(())
    })
    .await?;

    db.close().await;
    Ok(())
}
