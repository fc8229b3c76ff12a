//! Error types for the auxiliary databases.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when using an auxiliary database.
#[derive(Debug, Error)]
pub enum AuxError {
    /// The database file cannot be created or opened.
    #[error("cannot open database {}: {source}", path.display())]
    Open {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// The database uses a format version this crate does not support.
    #[error("unsupported database version: {found} (expected {expected})")]
    Version {
        /// Version string stored in the database.
        found: String,
        /// Version string this crate supports.
        expected: String,
    },

    /// The database belongs to a different contigs database than the caller expects.
    #[error("the hash {stored} in the auxiliary database does not match the contigs database hash {expected}; the files probably belong to different projects")]
    HashMismatch {
        /// Owner hash stored in the database.
        stored: String,
        /// Owner hash supplied by the caller.
        expected: String,
    },

    /// A split that does not exist in the database was requested.
    #[error("the database does not know anything about split {0}")]
    UnknownSplit(String),

    /// A stored blob cannot be decoded into fixed-width elements.
    #[error("cannot decode a blob of {len} bytes into {width}-byte elements")]
    InvalidBlob {
        /// Length of the blob in bytes.
        len: usize,
        /// Width of one element in bytes.
        width: usize,
    },

    /// Any other error from the underlying SQLite database.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for auxiliary database operations.
pub type Result<T> = std::result::Result<T, AuxError>;
