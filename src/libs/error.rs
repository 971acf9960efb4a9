use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The driver could not open a session (auth, network, unknown host)
    #[error("could not connect to the database: {source}")]
    Connection {
        #[source]
        source: sqlx::Error,
    },

    /// A statement was issued before `connect` or after `disconnect`
    #[error("not connected to the database")]
    NotConnected,

    #[error("query failed: {source}")]
    Query {
        sql: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("table {table} already exists")]
    DuplicateTable { table: String },

    #[error("table {table} already holds a record with params={}", render(.values))]
    DuplicateRecord { table: String, values: Vec<Value> },

    /// Column names and values do not pair up
    #[error("cannot match {} values against {} columns {:?} of table {table}", .values.len(), .columns.len(), .columns)]
    RowShape {
        table: String,
        columns: Vec<String>,
        values: Vec<Value>,
    },

    #[error("could not open source file {}: {source}", .path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read source file {}: {source}", .path.display())]
    MalformedSource {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl Error {
    pub fn query(sql: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Query {
            sql: sql.into(),
            source,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this is one of the idempotency outcomes (table or record
    /// already present).
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Self::DuplicateTable { .. } | Self::DuplicateRecord { .. }
        )
    }

    /// Whether this error concerns a source file rather than the database.
    pub fn is_source(&self) -> bool {
        matches!(
            self,
            Self::SourceNotFound { .. } | Self::MalformedSource { .. }
        )
    }
}

fn render(values: &[Value]) -> String {
    Value::Array(values.to_vec()).to_string()
}
