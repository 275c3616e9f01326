//! Error types for minidb

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MiniDbError>;

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Open,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Closed => f.write_str("closed"),
            ConnectionState::Open => f.write_str("open"),
        }
    }
}

#[derive(Error, Debug)]
pub enum MiniDbError {
    /// Invalid column/key combination, detected when the registry is built
    #[error("Schema configuration error: {0}")]
    SchemaConfiguration(String),

    #[error("The driver `{0}` is not supported")]
    DriverNotSupported(String),

    #[error("Driver is already connected")]
    AlreadyConnected,

    #[error("Invalid connection state. Expected: {expected}; actual: {actual}")]
    InvalidConnectionState {
        expected: ConnectionState,
        actual: ConnectionState,
    },

    #[error("A transaction is already open on this connection")]
    AlreadyInTransaction,

    #[error("Not in transaction")]
    NotInTransaction,

    /// One entry per offending column, never just the first
    #[error("Data validation failed for collection `{table}`:\n{}", .errors.join("\n"))]
    DataValidation {
        table: String,
        columns: Vec<String>,
        errors: Vec<String>,
    },

    #[error("Update affected 0 rows")]
    UnaffectedRows,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("SQL statement failed: {source}\nsql: {sql}")]
    Engine {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Column `{column}` not found in table `{table}`")]
    UnknownColumn { table: String, column: String },

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MiniDbError {
    /// Names of the non-nullable columns that resolved to null, if this is a
    /// validation failure
    pub fn invalid_columns(&self) -> Option<&[String]> {
        match self {
            MiniDbError::DataValidation { columns, .. } => Some(columns),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for MiniDbError {
    fn from(err: serde_json::Error) -> Self {
        MiniDbError::Serialization(err.to_string())
    }
}
