//! Output formatting and event reporting.
//!
//! The sorter, unpacker and reporter never print directly. They emit
//! [`SortEvent`]s into an [`EventSink`]; [`ConsoleSink`] renders them with
//! consistent styling through [`OutputFormatter`] and can mirror them into an
//! activity log.

use crate::activity_log::ActivityLog;
use crate::file_sorter::{Operation, SortError};
use crate::unpack::{ArchiveFormat, UnpackError};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Something that happened to a single entry during a run.
#[derive(Debug)]
pub enum SortEvent<'a> {
    /// A file was moved (or, in a dry run, would be moved).
    FileMoved {
        /// The move that was performed or planned.
        operation: &'a Operation,
        /// True if nothing was changed on disk.
        dry_run: bool,
    },
    /// A directory left empty by the walk was removed.
    DirectoryRemoved(&'a Path),
    /// An entry could not be processed. The walk carries on.
    EntryFailed(&'a SortError),
    /// An archive was extracted.
    ArchiveUnpacked {
        /// The archive file.
        archive: &'a Path,
        /// Directory it was extracted into.
        destination: &'a Path,
        /// Detected container format.
        format: ArchiveFormat,
    },
    /// An archive was not extracted.
    ArchiveSkipped {
        /// The archive file.
        archive: &'a Path,
        /// Why it was skipped.
        reason: &'a UnpackError,
    },
}

impl fmt::Display for SortEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortEvent::FileMoved { operation, dry_run } => write!(
                f,
                "{} {} to {}",
                if *dry_run { "would move" } else { "moved" },
                operation.original_path.display(),
                operation.new_path.display()
            ),
            SortEvent::DirectoryRemoved(path) => {
                write!(f, "directory {} removed", path.display())
            }
            SortEvent::EntryFailed(error) => write!(f, "error: {}", error),
            SortEvent::ArchiveUnpacked {
                archive,
                destination,
                format,
            } => write!(
                f,
                "unpacked {} archive {} into {}",
                format,
                archive.display(),
                destination.display()
            ),
            SortEvent::ArchiveSkipped { archive, reason } => {
                write!(f, "skipped archive {}: {}", archive.display(), reason)
            }
        }
    }
}

/// Receiver of per-entry events.
///
/// Events are delivered as soon as the entry has been handled.
pub trait EventSink {
    /// Handles one event.
    fn emit(&mut self, event: &SortEvent<'_>);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl EventSink for SilentSink {
    fn emit(&mut self, _event: &SortEvent<'_>) {}
}

/// How much the console sink prints.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Moves, removals, unpacked archives and errors.
    #[default]
    Normal,
    /// Everything, including skipped archives.
    Verbose,
}

/// Prints events to the terminal and optionally appends them to a log file.
pub struct ConsoleSink {
    verbosity: Verbosity,
    progress: ProgressBar,
    log: Option<ActivityLog>,
    log_failed: bool,
}

impl ConsoleSink {
    /// Creates a console sink.
    pub fn new(verbosity: Verbosity, log: Option<ActivityLog>) -> Self {
        Self {
            verbosity,
            progress: ProgressBar::hidden(),
            log,
            log_failed: false,
        }
    }

    /// Returns the configured verbosity.
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Shows `progress` while the next phase runs. Lines are printed above it.
    pub fn start_phase(&mut self, progress: ProgressBar) {
        self.progress = progress;
    }

    /// Clears the current progress indicator.
    pub fn finish_phase(&mut self) {
        self.progress.finish_and_clear();
        self.progress = ProgressBar::hidden();
    }

    /// Writes a line to the activity log only.
    pub fn note(&mut self, message: &str) {
        let Some(log) = &self.log else {
            return;
        };
        if let Err(e) = log.append(message)
            && !self.log_failed
        {
            self.log_failed = true;
            let warning = format!(
                "Could not write activity log {}: {}",
                log.path().display(),
                e
            );
            self.progress.suspend(|| OutputFormatter::warning(&warning));
        }
    }

    fn print(&self, f: impl FnOnce()) {
        self.progress.suspend(f);
    }
}

impl EventSink for ConsoleSink {
    fn emit(&mut self, event: &SortEvent<'_>) {
        self.note(&event.to_string());
        self.progress.inc(1);

        let quiet = self.verbosity == Verbosity::Quiet;
        match event {
            SortEvent::FileMoved { operation, dry_run } if !quiet => {
                let name = operation
                    .new_path
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_default();
                let message = if *dry_run {
                    format!("{} → would move to {}/", name, operation.category)
                } else {
                    format!("{} moved to {}/", name, operation.category)
                };
                self.print(|| OutputFormatter::success(&message));
            }
            SortEvent::DirectoryRemoved(path) if !quiet => {
                let message = format!("directory {} removed", path.display());
                self.print(|| OutputFormatter::plain(&message));
            }
            SortEvent::EntryFailed(error) => {
                let message = error.to_string();
                self.print(|| OutputFormatter::error(&message));
            }
            SortEvent::ArchiveUnpacked { archive, .. } if !quiet => {
                let message = format!("unpacked archive: {}", archive.display());
                self.print(|| OutputFormatter::info(&message));
            }
            SortEvent::ArchiveSkipped { .. } if self.verbosity == Verbosity::Verbose => {
                let message = event.to_string();
                self.print(|| OutputFormatter::warning(&message));
            }
            _ => {}
        }
    }
}

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress indicators for sort phases
/// - Summary tables with statistics
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use filesort::output::OutputFormatter;
    /// OutputFormatter::success("report.docx moved to documents/");
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

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a spinner for phases with an unknown number of entries.
    pub fn create_spinner(message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg} ({pos} entries)")
                .expect("Invalid spinner template"),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Creates and returns a progress bar for a known number of items.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use filesort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(3);
    /// pb.inc(1);
    /// pb.finish_with_message("Completed!");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints a summary table with file counts by category.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use filesort::output::OutputFormatter;
    /// use std::collections::BTreeMap;
    ///
    /// let mut counts = BTreeMap::new();
    /// counts.insert("documents".to_string(), 15);
    /// counts.insert("images".to_string(), 8);
    /// OutputFormatter::summary_table(&counts);
    /// ```
    pub fn summary_table(category_counts: &BTreeMap<String, usize>) {
        Self::header("SUMMARY");

        let total_files: usize = category_counts.values().sum();
        let width = category_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!("{:<width$} | {}", "Category".bold(), "Files".bold());
        println!("{}", "-".repeat(width + 10));

        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural_files(*count)
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural_files(total_files)
        );
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}

fn plural_files(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
