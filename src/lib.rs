//! file-sorter - sort a heap of files into category folders by extension
//!
//! This library classifies file names against an extension table, moves files
//! (and, when not recursing, whole subdirectories) into category directories,
//! and removes empty directories from the destination afterwards. Behavior can
//! be tuned through TOML configuration files.

pub mod cli;
pub mod config;
pub mod error;
pub mod file_category;
pub mod file_organizer;
pub mod logging;
pub mod output;
pub mod sorter;

pub use config::{CompiledFilters, ConfigError, SorterConfig};
pub use error::{Error, SortError};
pub use file_category::{CategoryPath, CategoryTable, Classifier, ExtensionKey};
pub use file_organizer::{FileOrganizer, MoveError, Operation};
pub use sorter::{SortOptions, SortReport, SortRequest, Sorter, run_with_config};

pub use cli::{Cli, run_cli};
