//! Error types for the rowdeck crate.

use thiserror::Error;

use crate::row::RowKey;

/// Errors that can occur while configuring or driving a table.
///
/// None of these are fatal to a [`TabularDataProcessor`](crate::TabularDataProcessor):
/// an operation that fails leaves the table in the state it had before the call.
#[derive(Debug, Error)]
pub enum TableError {
    /// Two rows in the same row set share a key.
    #[error("duplicate row key '{0}'")]
    DuplicateKey(RowKey),

    /// A row source entry was not a JSON object.
    #[error("row {index} is not an object")]
    MalformedRow { index: usize },

    /// The row source was neither a list nor a single object.
    #[error("row source must be a list or an object, got {0}")]
    MalformedRowSource(&'static str),

    /// No filter exists for the given field.
    #[error("no filter configured for field '{0}'")]
    UnknownFilter(String),

    /// The filter input does not apply to the filter's kind.
    #[error("filter '{field}' is a {kind} filter and does not accept {input}")]
    FilterKindMismatch {
        field: String,
        kind: &'static str,
        input: &'static str,
    },

    /// Filter input could not be parsed for the filter's kind.
    #[error("invalid value '{value}' for {kind} filter '{field}'")]
    InvalidFilterInput {
        field: String,
        kind: &'static str,
        value: String,
    },

    /// Page size must be at least one.
    #[error("page size must be at least 1")]
    InvalidPageSize,

    /// Requested page does not exist.
    #[error("page {index} is out of range (page count {count})")]
    PageOutOfRange { index: usize, count: usize },

    /// A selection event would select more rows than allowed.
    #[error("selection of {requested} rows exceeds the maximum of {max}")]
    SelectionLimit { requested: usize, max: usize },

    /// An edit did not carry the key field.
    #[error("edit is missing key field '{0}'")]
    MissingEditKey(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A host JSON path could not be parsed or written.
    #[error("invalid JSON path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// The persistence sink rejected an update.
    #[error("persistence sink failed: {0}")]
    Sink(String),

    /// The event bus rejected a publication.
    #[error("event publication failed: {0}")]
    Bus(String),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TableError {
    /// Create an invalid path error.
    pub fn path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for rowdeck operations.
pub type Result<T> = std::result::Result<T, TableError>;
