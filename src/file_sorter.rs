/// Recursive sorting of a directory tree into category directories.
///
/// Every file is renamed to its normalized form and moved into a
/// subdirectory, named after its category, of the directory it was found
/// in. Subdirectories are sorted first and removed if the walk leaves them
/// empty.
use crate::config::CompiledFilters;
use crate::file_category::{ARCHIVES_CATEGORY, CategoryTable};
use crate::normalize::{normalize, split_name};
use crate::output::{EventSink, SortEvent};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A single file move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    /// The path of the file before sorting.
    pub original_path: PathBuf,
    /// The path of the file after sorting.
    pub new_path: PathBuf,
    /// The category the file was sorted into.
    pub category: String,
}

/// An entry that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// The file or directory concerned.
    pub path: PathBuf,
    /// Human-readable reason.
    pub reason: String,
}

/// Outcome of one sort run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SortSummary {
    /// Files moved (or planned, in a dry run), in processing order.
    pub moved: Vec<Operation>,
    /// Directories removed because the walk left them empty.
    pub removed_dirs: Vec<PathBuf>,
    /// Entries that failed. Each failure concerns only that entry.
    pub failures: Vec<Failure>,
}

impl SortSummary {
    /// Returns true if no entry failed.
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns the number of entries the run acted on or failed on.
    pub fn total_processed(&self) -> usize {
        self.moved.len() + self.removed_dirs.len() + self.failures.len()
    }

    fn record_failure(&mut self, sink: &mut dyn EventSink, error: SortError) {
        sink.emit(&SortEvent::EntryFailed(&error));
        self.failures.push(Failure {
            path: error.path().to_path_buf(),
            reason: error.to_string(),
        });
    }
}

/// Errors that can occur while sorting.
#[derive(Debug)]
pub enum SortError {
    /// The root path does not exist or is not a directory.
    InvalidRootPath {
        path: PathBuf,
        source: io::Error,
    },
    /// A directory's entries could not be listed.
    ReadDirFailed {
        path: PathBuf,
        source: io::Error,
    },
    /// Failed to create a category directory.
    DirectoryCreationFailed {
        path: PathBuf,
        source: io::Error,
    },
    /// Failed to move a file to its category directory.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: io::Error,
    },
    /// Something already exists at the destination of a move.
    DestinationExists {
        source: PathBuf,
        destination: PathBuf,
    },
    /// Failed to remove a directory left empty.
    DirectoryRemovalFailed {
        path: PathBuf,
        source: io::Error,
    },
    /// The file name is not valid UTF-8 and cannot be normalized.
    NonUtf8Name { path: PathBuf },
}

impl SortError {
    /// Returns the path of the entry this error concerns.
    pub fn path(&self) -> &Path {
        match self {
            Self::InvalidRootPath { path, .. }
            | Self::ReadDirFailed { path, .. }
            | Self::DirectoryCreationFailed { path, .. }
            | Self::DirectoryRemovalFailed { path, .. }
            | Self::NonUtf8Name { path } => path,
            Self::FileMoveFailure { source, .. } | Self::DestinationExists { source, .. } => source,
        }
    }
}

impl std::fmt::Display for SortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRootPath { path, source } => {
                write!(f, "Invalid root path {}: {}", path.display(), source)
            }
            Self::ReadDirFailed { path, source } => {
                write!(f, "Failed to read directory {}: {}", path.display(), source)
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::DestinationExists {
                source,
                destination,
            } => {
                write!(
                    f,
                    "Cannot move {}: {} already exists",
                    source.display(),
                    destination.display()
                )
            }
            Self::DirectoryRemovalFailed { path, source } => {
                write!(
                    f,
                    "Failed to remove directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::NonUtf8Name { path } => {
                write!(f, "File name is not valid UTF-8: {}", path.display())
            }
        }
    }
}

impl std::error::Error for SortError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRootPath { source, .. }
            | Self::ReadDirFailed { source, .. }
            | Self::DirectoryCreationFailed { source, .. }
            | Self::DirectoryRemovalFailed { source, .. } => Some(source),
            Self::FileMoveFailure { source_error, .. } => Some(source_error),
            Self::DestinationExists { .. } | Self::NonUtf8Name { .. } => None,
        }
    }
}

/// Result type for sort operations.
pub type SortResult<T> = Result<T, SortError>;

/// Fails unless `root` is an existing directory.
pub fn check_root(root: &Path) -> SortResult<()> {
    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(SortError::InvalidRootPath {
            path: root.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        }),
        Err(source) => Err(SortError::InvalidRootPath {
            path: root.to_path_buf(),
            source,
        }),
    }
}

/// One directory entry, captured before the directory is modified.
#[derive(Debug, Clone)]
pub(crate) struct DirItem {
    pub(crate) path: PathBuf,
    pub(crate) is_dir: bool,
}

impl DirItem {
    pub(crate) fn name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// Lists a directory, sorted by name. Symbolic links are never reported as directories.
pub(crate) fn list_dir(dir: &Path) -> SortResult<Vec<DirItem>> {
    let read_failed = |source| SortError::ReadDirFailed {
        path: dir.to_path_buf(),
        source,
    };

    let mut items = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_failed)? {
        let entry = entry.map_err(read_failed)?;
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        items.push(DirItem {
            path: entry.path(),
            is_dir,
        });
    }
    items.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(items)
}

fn is_dir_empty(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

/// Sorts directory trees according to a category table.
///
/// # Examples
///
/// ```no_run
/// use filesort::config::CompiledFilters;
/// use filesort::file_category::CategoryTable;
/// use filesort::file_sorter::FileSorter;
/// use filesort::output::SilentSink;
/// use std::path::Path;
///
/// let table = CategoryTable::default();
/// let filters = CompiledFilters::default();
/// let summary = FileSorter::new(&table, &filters)
///     .sort(Path::new("/path/to/Downloads"), &mut SilentSink)
///     .expect("root exists");
/// println!("moved {} files", summary.moved.len());
/// ```
pub struct FileSorter<'a> {
    table: &'a CategoryTable,
    filters: &'a CompiledFilters,
    dry_run: bool,
}

impl<'a> FileSorter<'a> {
    /// Creates a sorter using the given table and filters.
    pub fn new(table: &'a CategoryTable, filters: &'a CompiledFilters) -> Self {
        Self {
            table,
            filters,
            dry_run: false,
        }
    }

    /// In a dry run nothing on disk is changed; planned moves are still reported.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sorts the tree rooted at `root`.
    ///
    /// Each directory is listed once before any of its entries is touched,
    /// so category directories created during the run are not walked again.
    /// Per-entry failures are emitted to `sink`, recorded in the summary,
    /// and do not stop the walk.
    ///
    /// # Errors
    ///
    /// Returns `SortError::InvalidRootPath` if `root` is not an existing directory.
    pub fn sort(&self, root: &Path, sink: &mut dyn EventSink) -> SortResult<SortSummary> {
        check_root(root)?;

        let mut summary = SortSummary::default();
        self.sort_dir(root, root, sink, &mut summary);
        Ok(summary)
    }

    fn sort_dir(
        &self,
        root: &Path,
        dir: &Path,
        sink: &mut dyn EventSink,
        summary: &mut SortSummary,
    ) {
        let items = match list_dir(dir) {
            Ok(items) => items,
            Err(e) => {
                summary.record_failure(sink, e);
                return;
            }
        };

        for item in &items {
            if item.is_dir {
                if is_extraction_dir(root, dir, item, &items) {
                    continue;
                }

                self.sort_dir(root, &item.path, sink, summary);

                if !self.dry_run && is_dir_empty(&item.path) {
                    match fs::remove_dir(&item.path) {
                        Ok(()) => {
                            sink.emit(&SortEvent::DirectoryRemoved(&item.path));
                            summary.removed_dirs.push(item.path.clone());
                        }
                        Err(source) => summary.record_failure(
                            sink,
                            SortError::DirectoryRemovalFailed {
                                path: item.path.clone(),
                                source,
                            },
                        ),
                    }
                }
            } else {
                let rel_path = item.path.strip_prefix(root).unwrap_or(&item.path);
                if !self.filters.should_include(rel_path) {
                    continue;
                }

                match self.sort_file(root, dir, &item.path, &summary.moved) {
                    Ok(Some(operation)) => {
                        sink.emit(&SortEvent::FileMoved {
                            operation: &operation,
                            dry_run: self.dry_run,
                        });
                        summary.moved.push(operation);
                    }
                    Ok(None) => {}
                    Err(e) => summary.record_failure(sink, e),
                }
            }
        }
    }

    /// Moves one file into its category directory under `dir`.
    ///
    /// Returns `None` if the file is already where it belongs. In a dry run,
    /// destinations claimed by earlier planned moves count as taken.
    fn sort_file(
        &self,
        root: &Path,
        dir: &Path,
        file_path: &Path,
        planned: &[Operation],
    ) -> SortResult<Option<Operation>> {
        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SortError::NonUtf8Name {
                path: file_path.to_path_buf(),
            })?;

        let (stem, suffix) = split_name(file_name);
        let new_name = normalize(stem, suffix);
        let category = self.table.classify(suffix);

        // A file inside a directory named after its own category stays there.
        let already_categorized = dir != root && dir.file_name().is_some_and(|n| n == category);
        let category_path = if already_categorized {
            dir.to_path_buf()
        } else {
            dir.join(category)
        };
        let destination_path = category_path.join(&new_name);

        if destination_path == file_path {
            return Ok(None);
        }

        let planned_clash =
            self.dry_run && planned.iter().any(|op| op.new_path == destination_path);
        if planned_clash || destination_path.symlink_metadata().is_ok() {
            return Err(SortError::DestinationExists {
                source: file_path.to_path_buf(),
                destination: destination_path,
            });
        }

        if !self.dry_run {
            if !category_path.exists() {
                fs::create_dir(&category_path).map_err(|e| {
                    SortError::DirectoryCreationFailed {
                        path: category_path.clone(),
                        source: e,
                    }
                })?;
            }

            fs::rename(file_path, &destination_path).map_err(|e| SortError::FileMoveFailure {
                source: file_path.to_path_buf(),
                destination: destination_path.clone(),
                source_error: e,
            })?;
        }

        Ok(Some(Operation {
            original_path: file_path.to_path_buf(),
            new_path: destination_path,
            category: category.to_string(),
        }))
    }
}

/// True for `<root>/archives/<stem>` when a sibling archive named `<stem>.*` exists.
///
/// Those directories hold extracted archive contents and are left alone.
fn is_extraction_dir(root: &Path, dir: &Path, item: &DirItem, siblings: &[DirItem]) -> bool {
    if dir != root.join(ARCHIVES_CATEGORY) {
        return false;
    }
    let Some(dir_name) = item.name() else {
        return false;
    };
    siblings.iter().any(|sibling| {
        !sibling.is_dir
            && sibling
                .name()
                .is_some_and(|name| split_name(name).0 == dir_name)
    })
}
