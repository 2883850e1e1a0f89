//! Log file setup.
//!
//! Every run writes a fresh, plain-text log: directory creation, each move,
//! each failed move, each entry left in place and a final completion line.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;

/// Errors raised while installing the logger.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to create log file {}: {source}", .path.display())]
    CreateFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("A global logger is already installed")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Builds a subscriber writing plain lines to `writer`.
pub fn subscriber<W>(writer: W, verbose: bool) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_max_level(level)
        .finish()
}

/// Truncates `log_path` and installs it as the process-wide log.
///
/// # Errors
///
/// Fails if the file cannot be created or a logger is already installed.
pub fn init(log_path: &Path, verbose: bool) -> Result<(), LoggingError> {
    let file = File::create(log_path).map_err(|e| LoggingError::CreateFile {
        path: log_path.to_path_buf(),
        source: e,
    })?;
    tracing::subscriber::set_global_default(subscriber(Mutex::new(file), verbose))?;
    Ok(())
}
