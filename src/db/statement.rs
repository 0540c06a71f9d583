// db/statement.rs - SQL text plus positional parameters
//
// The one rule that prevents SQL injection: values never go into the SQL
// string. A `Statement` keeps them apart - the SQL text holds placeholders
// ($1, $2, ...) and the values travel separately to the driver, which sends
// them to the database as data.
//
// Identifiers (table and column names) can't be bound as parameters. Those
// are checked with `checked_identifier` before they are spliced in.

use sqlx::any::AnyArguments;
use sqlx::query::Query;
use sqlx::Any;

use crate::error::StoreError;
use crate::fixtures::naming::MAX_IDENTIFIER_LEN;

/// A positional statement parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Text(String),
    Int(i64),
    /// NULL sent as a text value. PostgreSQL rejects it for integer columns;
    /// use `NullInt` there.
    Null,
    /// NULL sent as a 64-bit integer.
    NullInt,
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Text(value)
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Int(value)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        value.map_or(Param::Null, Into::into)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    params: Vec<Param>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Bind the next positional parameter.
    pub fn bind(mut self, param: impl Into<Param>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Turn this statement into a sqlx query with every parameter bound.
    pub(crate) fn query(&self) -> Query<'_, Any, AnyArguments<'_>> {
        self.params
            .iter()
            .fold(sqlx::query(&self.sql), |query, param| match param {
                Param::Text(value) => query.bind(value.as_str()),
                Param::Int(value) => query.bind(*value),
                Param::Null => query.bind(Option::<String>::None),
                Param::NullInt => query.bind(Option::<i64>::None),
            })
    }
}

/// Return `name` unchanged if it is a plain SQL identifier: an ASCII letter
/// or underscore, then ASCII letters, digits or underscores, at most 63 bytes.
pub fn checked_identifier(name: &str) -> Result<&str, StoreError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_start && valid_rest && name.len() <= MAX_IDENTIFIER_LEN {
        Ok(name)
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}
