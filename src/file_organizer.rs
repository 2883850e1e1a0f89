//! Filesystem side of sorting: preparing the destination, moving entries into
//! category directories, and removing empty directories afterwards.
//!
//! Category directories are created lazily, right before the first entry is
//! moved into them, so a run never leaves empty category folders behind.

use crate::error::SortError;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Whether a moved entry was a file or a whole directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// Records a single move (performed, or planned in a dry run).
#[derive(Debug, Clone, Serialize)]
pub struct Operation {
    /// The path of the entry before sorting.
    pub original_path: PathBuf,
    /// The path of the entry after sorting.
    pub new_path: PathBuf,
    /// The category the entry was moved to, e.g. `Documents/PDF`.
    pub category: String,
    pub kind: EntryKind,
}

/// Errors that can occur while moving one entry. None of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum MoveError {
    /// Something already exists at the target path; it is never overwritten.
    #[error(
        "Can't move '{}' to '{}': destination path already exists",
        .path.display(),
        .destination.display()
    )]
    AlreadyExists { path: PathBuf, destination: PathBuf },
    /// The OS refused the move or the directory creation.
    #[error(
        "Can't move '{}' to '{}': permission denied",
        .path.display(),
        .destination.display()
    )]
    PermissionDenied { path: PathBuf, destination: PathBuf },
    /// The category directory could not be created.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// Any other failure of the rename or the copy fallback.
    #[error("Can't move '{}' to '{}': {source}", .path.display(), .destination.display())]
    Io {
        path: PathBuf,
        destination: PathBuf,
        source: io::Error,
    },
    /// The path ends in `..` or is a root.
    #[error("Can't move '{}': path has no name component", .path.display())]
    MissingFileName { path: PathBuf },
}

impl MoveError {
    fn from_io(error: io::Error, path: &Path, destination: &Path) -> Self {
        if error.kind() == io::ErrorKind::PermissionDenied {
            Self::PermissionDenied {
                path: path.to_path_buf(),
                destination: destination.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                destination: destination.to_path_buf(),
                source: error,
            }
        }
    }

    /// True for failures caused by missing permissions.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

/// Result type for single-entry moves.
pub type MoveResult<T> = Result<T, MoveError>;

/// Moves entries into category directories and tidies the destination.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Creates the destination root if it does not exist yet.
    ///
    /// Returns `true` if the directory was created by this call.
    ///
    /// # Errors
    ///
    /// Fails if the path exists but is not a directory, or cannot be created.
    pub fn prepare_destination(destination: &Path) -> Result<bool, SortError> {
        if destination.is_dir() {
            return Ok(false);
        }
        if destination.exists() {
            return Err(SortError::DestinationNotDirectory {
                path: destination.to_path_buf(),
            });
        }

        fs::create_dir_all(destination).map_err(|e| SortError::CreateDestination {
            path: destination.to_path_buf(),
            source: e,
        })?;
        info!("Directory has been created: {}", destination.display());
        Ok(true)
    }

    /// Moves `path` (a file, directory or symlink) into `destination_dir`.
    ///
    /// `destination_dir` and any missing parents are created first. The entry
    /// keeps its name. The move is a rename when possible; across filesystems
    /// it falls back to copy-then-delete, removing any partial copy on failure.
    ///
    /// # Returns
    ///
    /// The new path of the entry.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use file_sorter::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// match FileOrganizer::move_into(Path::new("/tmp/in/photo.jpg"), Path::new("/tmp/out/Graphics")) {
    ///     Ok(new_path) => println!("Moved to {}", new_path.display()),
    ///     Err(e) => eprintln!("{}", e),
    /// }
    /// ```
    pub fn move_into(path: &Path, destination_dir: &Path) -> MoveResult<PathBuf> {
        let file_name = path.file_name().ok_or_else(|| MoveError::MissingFileName {
            path: path.to_path_buf(),
        })?;

        Self::ensure_directory(path, destination_dir)?;

        let target = destination_dir.join(file_name);
        // symlink_metadata so that a dangling link also counts as taken
        if target.symlink_metadata().is_ok() {
            return Err(MoveError::AlreadyExists {
                path: path.to_path_buf(),
                destination: target,
            });
        }

        match fs::rename(path, &target) {
            Ok(()) => Ok(target),
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                debug!(
                    "Rename across filesystems failed, copying '{}' to '{}'",
                    path.display(),
                    target.display()
                );
                copy_then_remove(path, &target)
                    .map(|()| target.clone())
                    .map_err(|e| MoveError::from_io(e, path, &target))
            }
            Err(e) => Err(MoveError::from_io(e, path, &target)),
        }
    }

    fn ensure_directory(path: &Path, directory: &Path) -> MoveResult<()> {
        if directory.is_dir() {
            return Ok(());
        }

        fs::create_dir_all(directory).map_err(|e| {
            if e.kind() == io::ErrorKind::PermissionDenied {
                MoveError::PermissionDenied {
                    path: path.to_path_buf(),
                    destination: directory.to_path_buf(),
                }
            } else {
                MoveError::DirectoryCreationFailed {
                    path: directory.to_path_buf(),
                    source: e,
                }
            }
        })?;
        info!("Directory has been created: {}", directory.display());
        Ok(())
    }

    /// Removes every empty directory directly under `destination`.
    ///
    /// Only immediate children are examined; nested directories and symlinks
    /// are left alone. A child that cannot be inspected or removed is logged
    /// and skipped.
    ///
    /// # Returns
    ///
    /// The directories that were removed.
    ///
    /// # Errors
    ///
    /// Fails only if `destination` itself cannot be listed.
    pub fn remove_empty_directories(destination: &Path) -> Result<Vec<PathBuf>, SortError> {
        let entries = fs::read_dir(destination).map_err(|e| SortError::ReadDirectory {
            path: destination.to_path_buf(),
            source: e,
        })?;

        let mut removed = Vec::new();
        for entry in entries.flatten() {
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }

            let path = entry.path();
            match is_empty_dir(&path) {
                Ok(true) => match fs::remove_dir(&path) {
                    Ok(()) => {
                        info!("Directory has been removed: {}", path.display());
                        removed.push(path);
                    }
                    Err(e) => warn!("Can't remove directory '{}': {}", path.display(), e),
                },
                Ok(false) => {}
                Err(e) => warn!("Can't read directory '{}': {}", path.display(), e),
            }
        }

        Ok(removed)
    }
}

fn is_empty_dir(path: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Copies `path` to `target` and deletes the original.
///
/// Either the whole copy lands and the original is gone, or the partial copy
/// is removed and the original stays.
fn copy_then_remove(path: &Path, target: &Path) -> io::Result<()> {
    let file_type = fs::symlink_metadata(path)?.file_type();

    let copied = if file_type.is_dir() {
        copy_dir(path, target)
    } else if file_type.is_symlink() {
        copy_symlink(path, target)
    } else {
        fs::copy(path, target).map(|_| ())
    };

    if let Err(e) = copied {
        let cleanup = if file_type.is_dir() {
            fs::remove_dir_all(target)
        } else {
            fs::remove_file(target)
        };
        if let Err(cleanup_error) = cleanup
            && cleanup_error.kind() != io::ErrorKind::NotFound
        {
            warn!(
                "Can't remove partial copy '{}': {}",
                target.display(),
                cleanup_error
            );
        }
        return Err(e);
    }

    if file_type.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

fn copy_dir(source_dir: &Path, target: &Path) -> io::Result<()> {
    for entry in WalkDir::new(source_dir).follow_links(false) {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(io::Error::other)?;
        let destination = target.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&destination)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &destination)?;
        } else {
            fs::copy(entry.path(), &destination)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(link)?, target)
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, _target: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("cannot copy symlink {} across filesystems", link.display()),
    ))
}
