//! Command-line interface module for file-sorter.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing and validation
//! - Configuration and log file setup
//! - Running the sort and reporting the outcome

use crate::config::SorterConfig;
use crate::error::{Error, Result, SortError};
use crate::logging;
use crate::output::OutputFormatter;
use crate::sorter::{SortOptions, SortReport, SortRequest, run_with_progress};
use clap::Parser;
use std::path::{Path, PathBuf};

/// Sort a heap of files into category folders by file extension.
#[derive(Debug, Clone, Parser)]
#[command(name = "file-sorter", version, about)]
pub struct Cli {
    /// [SOURCE] DESTINATION. With a single path, the current directory is sorted into it.
    #[arg(value_name = "PATHS", num_args = 1..=2, required = true)]
    pub paths: Vec<String>,

    /// Scan folders recursively. Dangerous due to the loss of information
    /// about folders hierarchy.
    #[arg(short, long)]
    pub recursive: bool,

    /// Move unrecognized files to a special directory instead of leaving them.
    #[arg(short = 'o', long = "other")]
    pub include_other: bool,

    /// Show what would be moved without changing anything.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Configuration file (defaults to .file_sorter.toml, then ~/.config/file_sorter/config.toml).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log file (defaults to file_sorter.log in the current directory).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Print the report as JSON instead of a table.
    #[arg(long)]
    pub json: bool,

    /// Log debug details.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Splits the positional paths into source and destination.
    ///
    /// # Errors
    ///
    /// Returns `Error::CurrentDir` if the source is omitted and the current
    /// directory cannot be determined.
    pub fn source_and_destination(&self) -> Result<(PathBuf, PathBuf)> {
        match self.paths.as_slice() {
            [source, destination] => Ok((PathBuf::from(source), PathBuf::from(destination))),
            [destination] => {
                let source = std::env::current_dir().map_err(Error::CurrentDir)?;
                Ok((source, PathBuf::from(destination)))
            }
            _ => Err(SortError::EmptyDestination.into()),
        }
    }

    /// Builds the sort request, marking `artifacts` as never to be moved.
    pub fn request(&self, artifacts: Vec<PathBuf>) -> Result<SortRequest> {
        let (source, destination) = self.source_and_destination()?;
        let options = SortOptions {
            recursive: self.recursive,
            include_unrecognized: self.include_other,
            dry_run: self.dry_run,
            artifacts,
        };
        Ok(SortRequest::new(source, destination, options))
    }
}

/// Runs the CLI application with already parsed arguments.
///
/// This is the main entry point for CLI operations: it loads configuration,
/// opens the log file, runs the sort and prints the outcome.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use file_sorter::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["file-sorter", "/home/me/Downloads", "/home/me/Sorted"]);
/// match run_cli(&cli) {
///     Ok(report) => println!("Moved {} entries", report.moved.len()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(cli: &Cli) -> Result<SortReport> {
    let config = SorterConfig::load(cli.config.as_deref())?;
    let log_file = cli.log_file.clone().unwrap_or_else(|| config.log_file());
    logging::init(&log_file, cli.verbose)?;

    let mut artifacts = vec![log_file];
    artifacts.extend(config.source_path.clone());
    let request = cli.request(artifacts)?;

    if !cli.json {
        announce(&request);
    }

    let spinner = if cli.json {
        indicatif::ProgressBar::hidden()
    } else {
        OutputFormatter::create_spinner()
    };
    let result = run_with_progress(&request, &config, spinner.clone());
    spinner.finish_and_clear();
    let report = result?;

    if cli.json {
        if let Err(e) = OutputFormatter::json(&report) {
            OutputFormatter::warning(&format!("Could not serialize report: {}", e));
        }
    } else {
        finish(&report, &request.destination);
    }

    Ok(report)
}

fn announce(request: &SortRequest) {
    let verb = if request.options.dry_run {
        "Analyzing"
    } else {
        "Sorting"
    };
    OutputFormatter::info(&format!(
        "{} '{}' into '{}'",
        verb,
        request.source.display(),
        request.destination.display()
    ));
}

fn finish(report: &SortReport, destination: &Path) {
    OutputFormatter::summary_table(report);
    OutputFormatter::failures(report);

    if report.dry_run {
        OutputFormatter::dry_run_notice("No files were modified.");
        return;
    }

    if report.has_failures() {
        OutputFormatter::warning("Some entries could not be sorted. See the log for details.");
    } else {
        OutputFormatter::success(&format!("Sorting complete! See {}", destination.display()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_paths_are_source_and_destination() {
        let cli = Cli::try_parse_from(["file-sorter", "in", "out", "-r", "-o"]).unwrap();
        let (source, destination) = cli.source_and_destination().unwrap();

        assert_eq!(source, PathBuf::from("in"));
        assert_eq!(destination, PathBuf::from("out"));
        assert!(cli.recursive);
        assert!(cli.include_other);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_single_path_is_destination() {
        let cli = Cli::try_parse_from(["file-sorter", "out"]).unwrap();
        let (source, destination) = cli.source_and_destination().unwrap();

        assert_eq!(source, std::env::current_dir().unwrap());
        assert_eq!(destination, PathBuf::from("out"));
    }

    #[test]
    fn test_paths_are_required_and_bounded() {
        assert!(Cli::try_parse_from(["file-sorter"]).is_err());
        assert!(Cli::try_parse_from(["file-sorter", "a", "b", "c"]).is_err());
    }

    #[test]
    fn test_empty_destination_fails_validation() {
        let cli = Cli::try_parse_from(["file-sorter", ".", ""]).unwrap();
        let request = cli.request(Vec::new()).unwrap();

        assert!(matches!(
            request.validate(),
            Err(SortError::EmptyDestination)
        ));
    }

    #[test]
    fn test_long_flags_map_to_options() {
        let cli = Cli::try_parse_from([
            "file-sorter",
            "in",
            "out",
            "--recursive",
            "--other",
            "--dry-run",
            "--json",
            "--log-file",
            "run.log",
        ])
        .unwrap();
        let request = cli.request(vec![PathBuf::from("run.log")]).unwrap();

        assert!(request.options.recursive);
        assert!(request.options.include_unrecognized);
        assert!(request.options.dry_run);
        assert!(cli.json);
        assert_eq!(cli.log_file, Some(PathBuf::from("run.log")));
        assert_eq!(request.options.artifacts, vec![PathBuf::from("run.log")]);
    }
}
