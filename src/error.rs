use std::path::PathBuf;

use thiserror::Error as ThisError;

/// Errors that can occur in the logging facility
#[derive(ThisError, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A level file could not be opened.
    #[error("Failed to open log file {path}: {source}")]
    OpenLog {
        /// The file that failed to open
        path: PathBuf,
        /// The underlying error
        source: std::io::Error,
    },
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Initialization failed.
    #[error("Initialization error: {0}")]
    Init(String),
    /// The queue was full and no room could be made for the record.
    #[error("Message queue full (capacity {capacity})")]
    QueueOverflow {
        /// Capacity of the queue that overflowed
        capacity: usize,
    },
    /// A level name did not match any known category.
    #[error("Unrecognized log category: {0}")]
    UnrecognizedCategory(String),
    /// The facility has been shut down.
    #[error("Logging facility is shut down")]
    Closed,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
