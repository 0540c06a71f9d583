/// SQL Injection Tests
///
/// The same last-name lookup written two ways. Pasting input into the SQL
/// string lets the input rewrite the query; binding it as a parameter keeps
/// it as plain data.

mod common;

use anyhow::Result;
use common::create_test_db;
use db_fixtures::error::StoreError;
use db_fixtures::fixtures::tables::{Category, CustomersTable, NewCustomer};
use db_fixtures::fixtures::{with_table, TestTable};
use db_fixtures::queries;

const ALWAYS_TRUE: &str = "' OR '1'='1";

#[tokio::test]
async fn test_concatenated_lookup_leaks_every_row() -> Result<()> {
    let db = create_test_db().await?;
    let table = CustomersTable::default();
    let name = table.table_name();

    with_table(&db, &table, |db| async move {
        let leaked = queries::find_by_last_name_concatenated(&db, name, ALWAYS_TRUE).await?;
        assert_eq!(leaked.len(), 2, "the payload turns the filter into 'match everything'");
        Ok::<_, anyhow::Error>(())
    })
    .await?;

    Ok(())
}

#[tokio::test]
async fn test_parameterized_lookup_treats_payload_as_data() -> Result<()> {
    let db = create_test_db().await?;
    let table = CustomersTable::default();
    let name = table.table_name();

    with_table(&db, &table, |db| async move {
        let found = queries::find_by_last_name(&db, name, ALWAYS_TRUE).await?;
        assert!(found.is_empty(), "nobody is literally called {:?}", ALWAYS_TRUE);
        Ok::<_, anyhow::Error>(())
    })
    .await?;

    Ok(())
}

#[tokio::test]
async fn test_both_lookups_agree_on_ordinary_input() -> Result<()> {
    let db = create_test_db().await?;
    let table = CustomersTable::default();
    let name = table.table_name();

    with_table(&db, &table, |db| async move {
        let bound = queries::find_by_last_name(&db, name, "Lovelace").await?;
        let concatenated = queries::find_by_last_name_concatenated(&db, name, "Lovelace").await?;

        assert_eq!(bound.len(), 1);
        assert_eq!(bound, concatenated);
        assert_eq!(bound[0].first_name, "Ada");
        assert_eq!(bound[0].category, Category::Premium.as_str());
        Ok::<_, anyhow::Error>(())
    })
    .await?;

    Ok(())
}

#[tokio::test]
async fn test_apostrophes_break_concatenation_but_not_parameters() -> Result<()> {
    let db = create_test_db().await?;
    let table = CustomersTable::default().with_rows(vec![
        NewCustomer::new("Conan", "O'Brien", Category::Standard),
        NewCustomer::new("Ada", "Lovelace", Category::Premium),
    ]);
    let name = table.table_name();

    with_table(&db, &table, |db| async move {
        let bound = queries::find_by_last_name(&db, name, "O'Brien").await?;
        assert_eq!(bound.len(), 1);
        assert_eq!(bound[0].last_name, "O'Brien");

        let concatenated = queries::find_by_last_name_concatenated(&db, name, "O'Brien").await;
        assert!(concatenated.is_err(), "the stray quote makes the SQL invalid");
        Ok::<_, anyhow::Error>(())
    })
    .await?;

    Ok(())
}

#[tokio::test]
async fn test_bound_drop_table_payload_is_harmless() -> Result<()> {
    let db = create_test_db().await?;
    let table = CustomersTable::default();
    let name = table.table_name();

    with_table(&db, &table, |db| async move {
        let payload = "x'; DROP TABLE customers; --";
        let found = queries::find_by_last_name(&db, name, payload).await?;
        assert!(found.is_empty());

        // Still there
        assert_eq!(queries::count_all(&db, name).await?, 2);
        Ok::<_, anyhow::Error>(())
    })
    .await?;

    Ok(())
}

#[tokio::test]
async fn test_table_names_are_validated_not_bound() -> Result<()> {
    let db = create_test_db().await?;

    for bad in ["customers; DROP TABLE customers", "customers --", ""] {
        let result = queries::find_by_last_name(&db, bad, "Lovelace").await;
        assert!(
            matches!(result, Err(StoreError::InvalidIdentifier(_))),
            "{:?} should be rejected before reaching the database",
            bad
        );
        let result = queries::count_by_category(&db, bad, "premium").await;
        assert!(matches!(result, Err(StoreError::InvalidIdentifier(_))));
    }

    Ok(())
}
