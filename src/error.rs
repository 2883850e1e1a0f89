//! Error types for a sort run.
//!
//! Only these errors abort a run. Failures to move a single entry are
//! [`MoveError`](crate::file_organizer::MoveError)s and are recorded in the
//! report instead.

use crate::config::ConfigError;
use crate::logging::LoggingError;
use std::path::PathBuf;

/// Fatal errors raised while preparing or walking the directories.
#[derive(Debug, thiserror::Error)]
pub enum SortError {
    /// The source directory is missing or not a directory.
    #[error("Invalid directory: {}", .path.display())]
    InvalidSource { path: PathBuf },
    /// The destination argument is empty.
    #[error("Invalid destination: path is empty")]
    EmptyDestination,
    /// The destination exists but is not a directory.
    #[error("Destination is not a directory: {}", .path.display())]
    DestinationNotDirectory { path: PathBuf },
    /// The destination root could not be created.
    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDestination {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A directory that must be listed could not be read.
    #[error("Error reading directory {}: {source}", .path.display())]
    ReadDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Any error that ends the program with a failure exit code.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Error loading configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sort(#[from] SortError),
    #[error("Error setting up logging: {0}")]
    Logging(#[from] LoggingError),
    #[error("Error reading current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

/// Result type for sort runs.
pub type Result<T> = std::result::Result<T, Error>;
