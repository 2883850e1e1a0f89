//! Extension-based file classification.
//!
//! This module maps file extensions to category directories. A [`CategoryTable`]
//! holds the mapping (built in, or authored in TOML), and a [`Classifier`]
//! resolves file names against it using longest-suffix matching.
//!
//! # Examples
//!
//! ```
//! use file_sorter::file_category::{CategoryTable, Classifier};
//!
//! let classifier = Classifier::new(CategoryTable::default(), false);
//! let category = |name: &str| classifier.classify_file(name).map(|c| c.to_string());
//!
//! assert_eq!(category("report.PDF"), Some("PDFs".to_string()));
//! assert_eq!(category("backup.tar.gz"), Some("Databases".to_string()));
//! assert_eq!(category("mystery.xyz"), None);
//! ```

use crate::config::ConfigError;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Key of a [`CategoryTable`] entry.
///
/// Real extensions are stored lower-cased with a leading dot. The remaining
/// variants are sentinels that can never collide with a real extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExtensionKey {
    /// A file suffix such as `.pdf` or `.tar.gz`.
    Suffix(String),
    /// Files without any extension (authored as `""`).
    NoExtension,
    /// Subdirectories met while sorting non-recursively (authored as `"directory"`).
    Directory,
    /// Files no other key matches (authored as `"other"`).
    Unrecognized,
}

impl ExtensionKey {
    /// Authored spelling of [`ExtensionKey::Directory`].
    pub const DIRECTORY: &'static str = "directory";
    /// Authored spelling of [`ExtensionKey::Unrecognized`].
    pub const UNRECOGNIZED: &'static str = "other";

    /// Parses an authored extension string.
    ///
    /// Input is case-folded, and a missing leading dot is added to suffixes,
    /// so `"PDF"` and `".pdf"` produce the same key.
    ///
    /// # Examples
    ///
    /// ```
    /// use file_sorter::file_category::ExtensionKey;
    ///
    /// assert_eq!(ExtensionKey::parse(".PDF"), ExtensionKey::Suffix(".pdf".to_string()));
    /// assert_eq!(ExtensionKey::parse("pdf"), ExtensionKey::Suffix(".pdf".to_string()));
    /// assert_eq!(ExtensionKey::parse(""), ExtensionKey::NoExtension);
    /// assert_eq!(ExtensionKey::parse("directory"), ExtensionKey::Directory);
    /// ```
    pub fn parse(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        match lower.as_str() {
            "" => Self::NoExtension,
            Self::DIRECTORY => Self::Directory,
            Self::UNRECOGNIZED => Self::Unrecognized,
            suffix if suffix.starts_with('.') => Self::Suffix(suffix.to_string()),
            suffix => Self::Suffix(format!(".{suffix}")),
        }
    }
}

/// A category directory, one or two segments deep (`Graphics` or `Documents/PDF`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryPath {
    category: String,
    subcategory: Option<String>,
}

impl CategoryPath {
    /// A top-level category.
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subcategory: None,
        }
    }

    /// A subcategory nested under `category`.
    pub fn nested(category: impl Into<String>, subcategory: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subcategory: Some(subcategory.into()),
        }
    }

    /// The top-level category name.
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn subcategory(&self) -> Option<&str> {
        self.subcategory.as_deref()
    }

    /// The directory for this category, relative to the destination root.
    pub fn relative_path(&self) -> PathBuf {
        let mut path = PathBuf::from(&self.category);
        if let Some(sub) = &self.subcategory {
            path.push(sub);
        }
        path
    }
}

impl fmt::Display for CategoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subcategory {
            Some(sub) => write!(f, "{}/{}", self.category, sub),
            None => write!(f, "{}", self.category),
        }
    }
}

/// Maps extension keys to category paths.
///
/// The table is authored as a two-level structure: a category holds either a
/// flat list of extensions, or subcategories that each hold a list. Adding an
/// extension that is already mapped replaces the earlier mapping, so the last
/// write in authoring order wins.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    entries: HashMap<ExtensionKey, CategoryPath>,
    categories: Vec<String>,
}

impl CategoryTable {
    /// Creates a table with no mappings.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            categories: Vec::new(),
        }
    }

    /// Creates the built-in table.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        table.populate_builtin();
        table
    }

    fn populate_builtin(&mut self) {
        // Buckets addressed by sentinel keys
        self.group("Directory", &["directory"]);
        self.group("Unrecognized", &["other"]);
        self.group("Text", &["", ".txt", ".mht"]);

        self.group("Android", &[".apk"]);
        self.group(
            "Software",
            &[
                ".iso", ".application", ".bin", ".exe", ".air", ".msi", ".deb", ".rpm", ".patch",
                ".dmg",
            ],
        );
        self.group(
            "Databases",
            &[".sql", ".odb", ".mwb", ".csv", ".sql.gz", ".tar.gz"],
        );
        self.group(
            "Graphics",
            &[
                ".svg", ".dia", ".jpg", ".jpeg", ".png", ".gif", ".tiff", ".raw", ".eps", ".bmp",
            ],
        );
        self.group("Java", &[".jnlp"]);
        self.group(
            "Scripts",
            &[
                ".aspx", ".pl", ".pm", ".js", ".c", ".sh", ".py", ".conf", ".phtml", ".php",
            ],
        );
        self.group(
            "Documents",
            &[
                ".xlsx", ".xls", ".rtf", ".dotx", ".doc", ".docx", ".htm", ".html", ".odt", ".ods",
                ".ppt", ".pptx", ".odp", ".wbk", ".xml",
            ],
        );
        self.group("Flash", &[".swf"]);
        self.group("Latex", &[".bib", ".bibtex", ".aux", ".dvi", ".tex"]);
        self.group("Zipped", &[".tgz", ".zip", ".rar", ".tar", ".gz", ".7z", ".bz2"]);
        self.group("PDFs", &[".pdf"]);
        self.group("Libraries", &[".jar"]);
        self.group("Photoshop", &[".xcf", ".psd"]);
        self.group("Logs", &[".log"]);
        self.group("Music", &[".mp3", ".ogg", ".wav"]);
        self.group("Movies", &[".mp4", ".mkv", ".flv", ".avi"]);
        self.group("Bk", &[".bak", ".bk"]);
        self.group("Books", &[".epub", ".fb2", ".mobi", ".djvu"]);
        self.group("Windows DLLs", &[".dll"]);
        self.group("Torrents", &[".torrent"]);
    }

    /// Built-in names are known to be valid, so this skips validation.
    fn group(&mut self, category: &str, extensions: &[&str]) {
        let path = CategoryPath::new(category);
        self.register_category(category);
        for ext in extensions {
            self.entries.insert(ExtensionKey::parse(ext), path.clone());
        }
    }

    fn register_category(&mut self, category: &str) {
        if !self.categories.iter().any(|name| name == category) {
            self.categories.push(category.to_string());
        }
    }

    /// Maps every extension in `extensions` to the top-level `category`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidCategoryName` if the name cannot be used as
    /// a single directory name.
    pub fn add_extensions(
        &mut self,
        category: &str,
        extensions: &[&str],
    ) -> Result<&mut Self, ConfigError> {
        validate_name(category)?;
        self.group(category, extensions);
        Ok(self)
    }

    /// Maps every extension in `extensions` to `category/subcategory`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidCategoryName` if either name is invalid.
    pub fn add_subcategory_extensions(
        &mut self,
        category: &str,
        subcategory: &str,
        extensions: &[&str],
    ) -> Result<&mut Self, ConfigError> {
        validate_name(category)?;
        validate_name(subcategory)?;
        let path = CategoryPath::nested(category, subcategory);
        self.register_category(category);
        for ext in extensions {
            self.entries.insert(ExtensionKey::parse(ext), path.clone());
        }
        Ok(self)
    }

    /// Builds a table from an authored TOML `[categories]` table.
    ///
    /// # Errors
    ///
    /// Returns an error if a category holds anything but a list of strings or
    /// a table of such lists, or if a name is invalid.
    pub fn from_toml(categories: &toml::Table) -> Result<Self, ConfigError> {
        let mut table = Self::empty();
        table.merge_toml(categories)?;
        Ok(table)
    }

    /// Applies an authored TOML `[categories]` table on top of this one.
    ///
    /// Entries are applied in file order.
    pub fn merge_toml(&mut self, categories: &toml::Table) -> Result<(), ConfigError> {
        for (category, group) in categories {
            match group {
                toml::Value::Array(items) => {
                    let extensions = string_list(category, items)?;
                    self.add_extensions(category, &extensions)?;
                }
                toml::Value::Table(subcategories) => {
                    for (subcategory, items) in subcategories {
                        let label = format!("{category}/{subcategory}");
                        let toml::Value::Array(items) = items else {
                            return Err(ConfigError::InvalidCategoryGroup(label));
                        };
                        let extensions = string_list(&label, items)?;
                        self.add_subcategory_extensions(category, subcategory, &extensions)?;
                    }
                }
                _ => return Err(ConfigError::InvalidCategoryGroup(category.clone())),
            }
        }
        Ok(())
    }

    /// Looks up a key.
    pub fn get(&self, key: &ExtensionKey) -> Option<&CategoryPath> {
        self.entries.get(key)
    }

    /// Top-level category names, in the order they were first added.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    pub fn is_category_name(&self, name: &str) -> bool {
        self.categories.iter().any(|category| category == name)
    }

    /// Number of mapped keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn string_list<'a>(label: &str, items: &'a [toml::Value]) -> Result<Vec<&'a str>, ConfigError> {
    items
        .iter()
        .map(|item| {
            item.as_str().ok_or_else(|| ConfigError::InvalidExtension {
                category: label.to_string(),
                value: item.to_string(),
            })
        })
        .collect()
}

/// A category name becomes exactly one directory, and must never look like an extension.
fn validate_name(name: &str) -> Result<(), ConfigError> {
    let reason = if name.trim().is_empty() {
        Some("name is empty")
    } else if name.starts_with('.') {
        Some("name must not start with '.'")
    } else if name.contains('/') || name.contains('\\') {
        Some("name must not contain path separators")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ConfigError::InvalidCategoryName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Returns every dotted suffix of `file_name`, longest first, lower-cased.
///
/// Leading dots are not extension separators, so `.bashrc` has no suffix.
///
/// # Examples
///
/// ```
/// use file_sorter::file_category::suffix_candidates;
///
/// assert_eq!(suffix_candidates("Archive.TAR.gz"), vec![".tar.gz", ".gz"]);
/// assert!(suffix_candidates(".bashrc").is_empty());
/// assert!(suffix_candidates("Makefile").is_empty());
/// ```
pub fn suffix_candidates(file_name: &str) -> Vec<String> {
    let trimmed = file_name.trim_start_matches('.');
    trimmed
        .match_indices('.')
        .map(|(index, _)| trimmed[index..].to_lowercase())
        .collect()
}

/// Resolves file names and extensions to categories.
#[derive(Debug, Clone)]
pub struct Classifier {
    table: CategoryTable,
    include_unrecognized: bool,
}

impl Classifier {
    /// Creates a classifier over `table`.
    ///
    /// With `include_unrecognized`, lookups that miss fall back to the bucket
    /// mapped from the `"other"` sentinel instead of returning `None`.
    pub fn new(table: CategoryTable, include_unrecognized: bool) -> Self {
        Self {
            table,
            include_unrecognized,
        }
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    /// Resolves a single extension (`".pdf"`, `"PDF"`, `""`).
    ///
    /// # Examples
    ///
    /// ```
    /// use file_sorter::file_category::{CategoryTable, Classifier};
    ///
    /// let classifier = Classifier::new(CategoryTable::default(), true);
    /// assert_eq!(classifier.resolve(".JPG").unwrap().category(), "Graphics");
    /// assert_eq!(classifier.resolve("").unwrap().category(), "Text");
    /// assert_eq!(classifier.resolve(".xyz").unwrap().category(), "Unrecognized");
    /// ```
    pub fn resolve(&self, extension: &str) -> Option<&CategoryPath> {
        self.table
            .get(&ExtensionKey::parse(extension))
            .or_else(|| self.unrecognized())
    }

    /// Resolves a file name, preferring the longest known suffix.
    ///
    /// `archive.tar.gz` tries `.tar.gz` before `.gz`. A name without an
    /// extension resolves through the no-extension bucket.
    pub fn classify_file(&self, file_name: &str) -> Option<&CategoryPath> {
        let candidates = suffix_candidates(file_name);
        if candidates.is_empty() {
            return self
                .table
                .get(&ExtensionKey::NoExtension)
                .or_else(|| self.unrecognized());
        }

        candidates
            .into_iter()
            .find_map(|suffix| self.table.get(&ExtensionKey::Suffix(suffix)))
            .or_else(|| self.unrecognized())
    }

    /// The bucket for subdirectories moved as a whole.
    pub fn directory_bucket(&self) -> Option<&CategoryPath> {
        self.table.get(&ExtensionKey::Directory)
    }

    pub fn is_category_name(&self, name: &str) -> bool {
        self.table.is_category_name(name)
    }

    fn unrecognized(&self) -> Option<&CategoryPath> {
        if self.include_unrecognized {
            self.table.get(&ExtensionKey::Unrecognized)
        } else {
            None
        }
    }
}
