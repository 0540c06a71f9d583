// lib.rs - Root module for the db_fixtures library
//
// This library is about testing code that talks to a database:
// - `fixtures` runs a test between a setup and a guaranteed teardown
// - `db` connects to SQLite or PostgreSQL and runs parameterized statements
// - `queries` holds the functions under test, including a deliberately
//   injectable one for comparison
//
// Everything that needs a database driver sits behind the `db-tools` feature
// (enabled by default). The fixture runner itself has no such dependency.

/// Setup/teardown fixtures and the table fixtures built on them
pub mod fixtures;

#[cfg(feature = "db-tools")]
pub mod db;

#[cfg(feature = "db-tools")]
pub mod error;

#[cfg(feature = "db-tools")]
pub mod queries;

#[cfg(feature = "db-tools")]
pub mod telemetry;
