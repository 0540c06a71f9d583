// fixtures/tables/mod.rs
//
// Table definitions used by tests. Each one implements `TestTable`.

pub mod customers;

pub use customers::{Category, Customer, CustomersTable, NewCustomer};
