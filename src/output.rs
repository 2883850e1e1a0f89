//! Output formatting and styling module.
//!
//! Provides a centralized interface for terminal output: colored status lines,
//! the progress spinner shown while sorting, and the end-of-run summary.
//! The log file is separate, see [`crate::logging`].

use crate::sorter::SortReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use file_sorter::output::OutputFormatter;
    /// OutputFormatter::success("Sorting complete!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a spinner that shows the entry being examined.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use file_sorter::output::OutputFormatter;
    /// let spinner = OutputFormatter::create_spinner();
    /// spinner.set_message("photo.jpg");
    /// spinner.inc(1);
    /// spinner.finish_and_clear();
    /// ```
    pub fn create_spinner() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {pos} entries examined {msg}")
                .expect("Invalid progress bar template"),
        );
        pb
    }

    /// Prints the summary table for a finished run.
    ///
    /// One row per category with the number of entries moved into it,
    /// followed by totals for moved, left-in-place and failed entries.
    pub fn summary_table(report: &SortReport) {
        Self::header(if report.dry_run {
            "DRY RUN SUMMARY"
        } else {
            "SUMMARY"
        });

        let counts = report.category_counts();
        let max_category_len = counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(8); // At least "Category" width

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Entries".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 12));

        for (category, count) in &counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                entry_word(*count),
                width = max_category_len
            );
        }

        println!("{}", "-".repeat(max_category_len + 12));
        let moved = report.moved.len();
        println!(
            "{:<width$} | {} {}",
            "Moved".bold(),
            moved.to_string().green().bold(),
            entry_word(moved),
            width = max_category_len
        );
        println!(
            "{:<width$} | {} {}",
            "Left".bold(),
            report.left_in_place.len(),
            entry_word(report.left_in_place.len()),
            width = max_category_len
        );
        if report.has_failures() {
            println!(
                "{:<width$} | {} {}",
                "Failed".bold(),
                report.failures.len().to_string().red().bold(),
                entry_word(report.failures.len()),
                width = max_category_len
            );
        }
    }

    /// Prints each failure with its reason.
    pub fn failures(report: &SortReport) {
        if !report.has_failures() {
            return;
        }
        Self::header("FAILED");
        for failure in &report.failures {
            Self::error(&failure.reason);
        }
    }

    /// Prints the report as pretty JSON.
    pub fn json(report: &SortReport) -> Result<(), serde_json::Error> {
        println!("{}", serde_json::to_string_pretty(report)?);
        Ok(())
    }
}

fn entry_word(count: usize) -> &'static str {
    if count == 1 { "entry" } else { "entries" }
}
