//! The sort pass: walks the source, classifies each entry and moves it.
//!
//! A full run is `prepare destination → sort → remove empty directories`,
//! see [`run_with_config`].

use crate::config::{CompiledFilters, SorterConfig};
use crate::error::{Error, SortError};
use crate::file_category::{CategoryPath, Classifier};
use crate::file_organizer::{EntryKind, FileOrganizer, MoveError, Operation};
use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Switches for one sort run.
#[derive(Debug, Clone, Default)]
pub struct SortOptions {
    /// Descend into subdirectories instead of moving them as a whole.
    pub recursive: bool,
    /// Move files with unknown extensions to the unrecognized bucket.
    pub include_unrecognized: bool,
    /// Only report what would be moved.
    pub dry_run: bool,
    /// Files the tool itself owns (log, config); never moved.
    pub artifacts: Vec<PathBuf>,
}

/// What to sort, and where to.
#[derive(Debug, Clone)]
pub struct SortRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub options: SortOptions,
}

impl SortRequest {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>, options: SortOptions) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            options,
        }
    }

    /// Checks the paths before anything on disk is touched.
    ///
    /// # Errors
    ///
    /// Returns `SortError::EmptyDestination` or `SortError::InvalidSource`.
    pub fn validate(&self) -> Result<(), SortError> {
        if self.destination.as_os_str().is_empty() {
            return Err(SortError::EmptyDestination);
        }
        if !self.source.is_dir() {
            return Err(SortError::InvalidSource {
                path: self.source.clone(),
            });
        }
        Ok(())
    }
}

/// An entry that could not be sorted.
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a sort run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SortReport {
    /// Moves performed, or planned when `dry_run` is set.
    pub moved: Vec<Operation>,
    /// Entries deliberately not moved.
    pub left_in_place: Vec<PathBuf>,
    pub failures: Vec<Failure>,
    /// Empty directories removed from the destination afterwards.
    pub removed_directories: Vec<PathBuf>,
    pub dry_run: bool,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SortReport {
    /// Number of moved entries per category, sorted by category.
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for operation in &self.moved {
            *counts.entry(operation.category.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    fn fail(&mut self, path: &Path, reason: impl ToString) {
        self.failures.push(Failure {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        });
    }
}

/// Names skipped while listing one directory.
type ExclusionSet = HashSet<OsString>;

/// A listed entry, as far as sorting cares.
struct DirectoryEntry {
    path: PathBuf,
    name: OsString,
    kind: EntryKind,
    /// Symlinked directories are moved as a unit, never descended into.
    is_link: bool,
}

impl DirectoryEntry {
    fn from_dir_entry(entry: &fs::DirEntry) -> std::io::Result<Self> {
        let path = entry.path();
        // DirEntry::file_type does not follow symlinks
        let file_type = entry.file_type()?;
        let is_link = file_type.is_symlink();
        let is_dir = if is_link {
            path.is_dir()
        } else {
            file_type.is_dir()
        };

        Ok(Self {
            name: entry.file_name(),
            kind: if is_dir {
                EntryKind::Directory
            } else {
                EntryKind::File
            },
            path,
            is_link,
        })
    }

    fn display_name(&self) -> String {
        self.name.to_string_lossy().into_owned()
    }
}

/// Walks a source directory and sorts its entries into a destination.
pub struct Sorter<'a> {
    classifier: &'a Classifier,
    filters: &'a CompiledFilters,
    options: &'a SortOptions,
    progress: ProgressBar,
}

impl<'a> Sorter<'a> {
    pub fn new(classifier: &'a Classifier, filters: &'a CompiledFilters, options: &'a SortOptions) -> Self {
        Self {
            classifier,
            filters,
            options,
            progress: ProgressBar::hidden(),
        }
    }

    /// Ticks `progress` once per examined entry.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Sorts `source` into `destination`.
    ///
    /// Directories are processed from an explicit work stack. Only the
    /// top level of `source` uses an exclusion set; nested levels start
    /// with an empty one.
    ///
    /// # Errors
    ///
    /// Fails only if `source` itself cannot be listed. Every per-entry problem
    /// is logged and recorded in the report.
    pub fn sort(&self, source: &Path, destination: &Path) -> Result<SortReport, SortError> {
        let mut report = SortReport {
            dry_run: self.options.dry_run,
            ..Default::default()
        };

        let destination_canonical = fs::canonicalize(destination).ok();
        let in_place = destination_canonical.is_some()
            && fs::canonicalize(source).ok() == destination_canonical;
        if in_place {
            info!("Sorting in place: category folders are left alone");
        }

        let mut stack = vec![(source.to_path_buf(), self.top_level_exclusions(source, in_place))];
        while let Some((directory, exclusions)) = stack.pop() {
            let entries = match fs::read_dir(&directory) {
                Ok(entries) => entries,
                Err(e) if directory.as_path() == source => {
                    return Err(SortError::ReadDirectory {
                        path: directory,
                        source: e,
                    });
                }
                Err(e) => {
                    warn!("Can't read directory '{}': {}", directory.display(), e);
                    report.fail(&directory, e);
                    continue;
                }
            };

            for entry in entries {
                let entry = match entry.and_then(|e| DirectoryEntry::from_dir_entry(&e)) {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Can't inspect entry in '{}': {}", directory.display(), e);
                        report.fail(&directory, e);
                        continue;
                    }
                };
                self.progress.set_message(entry.display_name());
                self.progress.inc(1);

                if exclusions.contains(&entry.name) {
                    debug!("Skipping '{}'", entry.path.display());
                    continue;
                }

                let relative = entry.path.strip_prefix(source).unwrap_or(&entry.path);
                if !self.filters.should_include(relative) {
                    info!("Leaving '{}' (excluded by filter)", entry.path.display());
                    report.left_in_place.push(entry.path);
                    continue;
                }

                match entry.kind {
                    EntryKind::Directory => {
                        let canonical = fs::canonicalize(&entry.path).ok();
                        // A directory can't be moved into its own descendant
                        let holds_destination = !entry.is_link
                            && matches!(
                                (&destination_canonical, &canonical),
                                (Some(dest), Some(dir)) if dest.starts_with(dir)
                            );

                        if destination_canonical.is_some() && canonical == destination_canonical {
                            debug!("Skipping destination '{}'", entry.path.display());
                        } else if self.options.recursive && !entry.is_link {
                            stack.push((entry.path, ExclusionSet::new()));
                        } else if holds_destination {
                            info!("Leaving '{}' (holds the destination)", entry.path.display());
                            report.left_in_place.push(entry.path);
                        } else {
                            self.sort_directory(entry, destination, &mut report);
                        }
                    }
                    EntryKind::File => self.sort_file(entry, destination, &mut report),
                }
            }
        }

        Ok(report)
    }

    /// Category folders (when sorting in place) and the tool's own files.
    fn top_level_exclusions(&self, source: &Path, in_place: bool) -> ExclusionSet {
        let mut exclusions = ExclusionSet::new();
        if in_place {
            exclusions.extend(self.classifier.table().categories().map(OsString::from));
        }

        let source_canonical = fs::canonicalize(source).ok();
        for artifact in &self.options.artifacts {
            let parent = artifact
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            if fs::canonicalize(parent).ok() == source_canonical
                && let Some(name) = artifact.file_name()
            {
                exclusions.insert(name.to_os_string());
            }
        }
        exclusions
    }

    fn sort_directory(&self, entry: DirectoryEntry, destination: &Path, report: &mut SortReport) {
        let name = entry.display_name();
        if self.classifier.is_category_name(&name) {
            info!("Leaving '{}' (category folder)", entry.path.display());
            report.left_in_place.push(entry.path);
            return;
        }

        match self.classifier.directory_bucket() {
            Some(bucket) => self.move_entry(entry, bucket, destination, report),
            None => {
                info!("Leaving '{}'", entry.path.display());
                report.left_in_place.push(entry.path);
            }
        }
    }

    fn sort_file(&self, entry: DirectoryEntry, destination: &Path, report: &mut SortReport) {
        match self.classifier.classify_file(&entry.display_name()) {
            Some(category) => self.move_entry(entry, category, destination, report),
            None => {
                info!("Leaving '{}'", entry.path.display());
                report.left_in_place.push(entry.path);
            }
        }
    }

    fn move_entry(
        &self,
        entry: DirectoryEntry,
        category: &CategoryPath,
        destination: &Path,
        report: &mut SortReport,
    ) {
        let category_dir = destination.join(category.relative_path());
        let noun = match entry.kind {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
        };

        if self.options.dry_run {
            let target = category_dir.join(&entry.name);
            if target.symlink_metadata().is_ok() {
                let e = MoveError::AlreadyExists {
                    path: entry.path.clone(),
                    destination: target,
                };
                warn!("{}", e);
                report.fail(&entry.path, e);
                return;
            }
            info!(
                "Would move {} '{}' to '{}'",
                noun,
                entry.path.display(),
                category_dir.display()
            );
            report.moved.push(Operation {
                new_path: category_dir.join(&entry.name),
                original_path: entry.path,
                category: category.to_string(),
                kind: entry.kind,
            });
            return;
        }

        info!(
            "Moving {} '{}' to '{}'",
            noun,
            entry.path.display(),
            category_dir.display()
        );
        match FileOrganizer::move_into(&entry.path, &category_dir) {
            Ok(new_path) => report.moved.push(Operation {
                original_path: entry.path,
                new_path,
                category: category.to_string(),
                kind: entry.kind,
            }),
            Err(e) => {
                warn!("{}", e);
                report.fail(&entry.path, e);
            }
        }
    }
}

/// Runs a full sort: validate, prepare the destination, sort, clean up.
///
/// A dry run neither creates the destination nor removes anything.
///
/// # Errors
///
/// Returns configuration errors and fatal [`SortError`]s. Per-entry failures
/// are in the returned report.
pub fn run_with_config(request: &SortRequest, config: &SorterConfig) -> Result<SortReport, Error> {
    run_with_progress(request, config, ProgressBar::hidden())
}

/// Like [`run_with_config`], ticking `progress` per examined entry.
pub fn run_with_progress(
    request: &SortRequest,
    config: &SorterConfig,
    progress: ProgressBar,
) -> Result<SortReport, Error> {
    info!("Source directory: '{}'", request.source.display());
    info!("Destination directory: '{}'", request.destination.display());
    if let Err(e) = request.validate() {
        tracing::error!("{}", e);
        return Err(e.into());
    }

    let classifier = Classifier::new(config.category_table()?, request.options.include_unrecognized);
    let filters = config.compile_filters()?;
    let options = &request.options;

    if !options.dry_run {
        FileOrganizer::prepare_destination(&request.destination)?;
    }

    let mut report = Sorter::new(&classifier, &filters, options)
        .with_progress(progress)
        .sort(&request.source, &request.destination)?;

    if !options.dry_run {
        report.removed_directories = FileOrganizer::remove_empty_directories(&request.destination)?;
    }

    report.finished_at = Some(Utc::now());
    info!("Sorting complete!");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_category::CategoryTable;
    use tempfile::TempDir;

    fn sort_with(source: &Path, destination: &Path, options: SortOptions) -> SortReport {
        let classifier = Classifier::new(CategoryTable::default(), options.include_unrecognized);
        let filters = CompiledFilters::allow_all();
        Sorter::new(&classifier, &filters, &options)
            .sort(source, destination)
            .expect("Sort failed")
    }

    #[test]
    fn test_validate_rejects_empty_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let request = SortRequest::new(temp_dir.path(), "", SortOptions::default());
        assert!(matches!(request.validate(), Err(SortError::EmptyDestination)));
    }

    #[test]
    fn test_validate_rejects_missing_source() {
        let request = SortRequest::new("/non/existent/path", "/tmp/out", SortOptions::default());
        assert!(matches!(
            request.validate(),
            Err(SortError::InvalidSource { .. })
        ));
    }

    #[test]
    fn test_sort_missing_source_is_fatal() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let classifier = Classifier::new(CategoryTable::default(), false);
        let filters = CompiledFilters::allow_all();
        let options = SortOptions::default();

        let result = Sorter::new(&classifier, &filters, &options)
            .sort(&temp_dir.path().join("missing"), temp_dir.path());
        assert!(matches!(result, Err(SortError::ReadDirectory { .. })));
    }

    #[test]
    fn test_in_place_exclusions_cover_categories_and_artifacts() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        let classifier = Classifier::new(CategoryTable::default(), false);
        let filters = CompiledFilters::allow_all();
        let options = SortOptions {
            artifacts: vec![base.join("file_sorter.log"), PathBuf::from("/elsewhere/x.toml")],
            ..Default::default()
        };
        let sorter = Sorter::new(&classifier, &filters, &options);

        let in_place = sorter.top_level_exclusions(base, true);
        assert!(in_place.contains(&OsString::from("Documents")));
        assert!(in_place.contains(&OsString::from("Directory")));
        assert!(in_place.contains(&OsString::from("file_sorter.log")));
        assert!(!in_place.contains(&OsString::from("x.toml")));

        let elsewhere = sorter.top_level_exclusions(base, false);
        assert_eq!(elsewhere.len(), 1);
    }

    #[test]
    fn test_dry_run_reports_collisions_as_failures() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("in");
        let destination = temp_dir.path().join("out");
        fs::create_dir(&source).expect("Failed to create directory");
        fs::create_dir_all(destination.join("Text")).expect("Failed to create directory");
        fs::write(source.join("notes.txt"), "new").expect("Failed to write file");
        fs::write(source.join("todo.txt"), "new").expect("Failed to write file");
        fs::write(destination.join("Text").join("notes.txt"), "old").expect("Failed to write file");

        let report = sort_with(
            &source,
            &destination,
            SortOptions {
                dry_run: true,
                ..Default::default()
            },
        );

        assert_eq!(report.moved.len(), 1);
        assert_eq!(report.moved[0].original_path, source.join("todo.txt"));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, source.join("notes.txt"));
        assert!(report.failures[0].reason.contains("destination path already exists"));
        assert!(source.join("notes.txt").exists());
        assert!(source.join("todo.txt").exists());
    }

    #[test]
    fn test_directory_holding_destination_is_left_in_place() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("in");
        let destination = source.join("a").join("out");
        fs::create_dir_all(&destination).expect("Failed to create directory");
        fs::write(source.join("a").join("keep.txt"), "x").expect("Failed to write file");

        let report = sort_with(&source, &destination, SortOptions::default());

        assert!(!report.has_failures());
        assert_eq!(report.left_in_place, vec![source.join("a")]);
        assert!(source.join("a").join("keep.txt").exists());
        assert!(!destination.join("Directory").exists());
    }

    #[test]
    fn test_recursive_sort_descends_into_directory_holding_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("in");
        let destination = source.join("a").join("out");
        fs::create_dir_all(&destination).expect("Failed to create directory");
        fs::write(source.join("a").join("keep.txt"), "x").expect("Failed to write file");

        let report = sort_with(
            &source,
            &destination,
            SortOptions {
                recursive: true,
                ..Default::default()
            },
        );

        assert!(!report.has_failures());
        assert!(destination.join("Text").join("keep.txt").exists());
        assert!(!destination.join("Directory").exists());
    }

    #[test]
    fn test_artifacts_are_never_moved() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("in");
        fs::create_dir(&source).expect("Failed to create directory");
        fs::write(source.join("file_sorter.log"), "log").expect("Failed to write file");
        fs::write(source.join("other.log"), "log").expect("Failed to write file");

        let destination = temp_dir.path().join("out");
        let options = SortOptions {
            artifacts: vec![source.join("file_sorter.log")],
            ..Default::default()
        };
        let report = sort_with(&source, &destination, options);

        assert!(source.join("file_sorter.log").exists());
        assert!(destination.join("Logs").join("other.log").exists());
        assert_eq!(report.moved.len(), 1);
    }

    #[test]
    fn test_dry_run_plans_without_touching_disk() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("in");
        fs::create_dir_all(source.join("old")).expect("Failed to create directory");
        fs::write(source.join("a.pdf"), "pdf").expect("Failed to write file");

        let destination = temp_dir.path().join("out");
        let options = SortOptions {
            dry_run: true,
            ..Default::default()
        };
        let report = sort_with(&source, &destination, options);

        assert!(report.dry_run);
        assert_eq!(report.moved.len(), 2);
        assert!(source.join("a.pdf").exists());
        assert!(source.join("old").is_dir());
        assert!(!destination.exists());
        assert_eq!(report.category_counts().get("PDFs"), Some(&1));
        assert_eq!(report.category_counts().get("Directory"), Some(&1));
    }

    #[test]
    fn test_nested_destination_is_not_swallowed() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path();
        let destination = source.join("sorted");
        fs::create_dir(&destination).expect("Failed to create directory");
        fs::write(source.join("song.mp3"), "mp3").expect("Failed to write file");

        let report = sort_with(source, &destination, SortOptions::default());

        assert!(destination.join("Music").join("song.mp3").exists());
        assert!(!destination.join("Directory").exists());
        assert!(!report.has_failures());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_is_moved_not_followed() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let target = temp_dir.path().join("real");
        fs::create_dir(&target).expect("Failed to create directory");
        fs::write(target.join("inside.txt"), "x").expect("Failed to write file");

        let source = temp_dir.path().join("in");
        fs::create_dir(&source).expect("Failed to create directory");
        std::os::unix::fs::symlink(&target, source.join("link")).expect("Failed to symlink");

        let destination = temp_dir.path().join("out");
        let options = SortOptions {
            recursive: true,
            ..Default::default()
        };
        sort_with(&source, &destination, options);

        let moved = destination.join("Directory").join("link");
        assert!(moved.symlink_metadata().expect("link missing").file_type().is_symlink());
        assert!(target.join("inside.txt").exists());
        assert!(!destination.join("Text").exists());
    }
}
