/// DBMAN Error Module
///
/// This module defines the error type shared by the connector, the
/// database manager, configuration loading and the command-line front end.
use thiserror::Error;

/// Error type for every fallible operation in dbman.
///
/// Read and write helpers that absorb failures (`send_query`,
/// `send_non_query`) never return these; their `try_*` counterparts do.
#[derive(Error, Debug)]
pub enum DbmanError {
    /// The initial connection (or a database switch) could not be established
    #[error("Connection error ({target}): {source}")]
    Connection {
        target: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Statement preparation or execution errors reported by the engine
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// SQL text the manager refuses to run (empty, or more than one statement)
    #[error("Query error: {0}")]
    Query(String),

    /// The operation cannot be carried out on this kind of server
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// A value group does not line up with the field list or placeholders
    #[error("Argument count error: expected {expected} values, got {actual} (row {row})")]
    ArgumentCount {
        expected: usize,
        actual: usize,
        row: usize,
    },

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors (script files, configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Result to use DbmanError as the error type.
pub type Result<T> = std::result::Result<T, DbmanError>;
