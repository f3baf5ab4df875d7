//! Domain errors raised while cleaning and aggregating delay records.

use thiserror::Error;

/// The raw column layout cannot be turned into a delay record schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("columns '{first}' and '{second}' both normalize to '{normalized}'")]
    Collision {
        first: String,
        second: String,
        normalized: String,
    },
    #[error("required column '{0}' is missing")]
    MissingColumn(String),
}

/// An aggregation could not produce a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    #[error("no data for {table}")]
    EmptyInput { table: String },
    #[error("mode undefined for {line}: no positive delays")]
    UndefinedMode { line: String },
}

impl AggregateError {
    pub fn empty(table: impl Into<String>) -> Self {
        AggregateError::EmptyInput {
            table: table.into(),
        }
    }
}

/// Failure while turning a raw table into cleaned records.
#[derive(Error, Debug)]
pub enum CleanError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: csv::Error,
    },
}
