//! Command-line interface module for filesort.
//!
//! This module drives a run end to end:
//! - Root path validation
//! - Configuration loading and compilation
//! - Sorting, archive unpacking and reporting, in that order
//! - Console, activity log and JSON output

use crate::activity_log::ActivityLog;
use crate::config::SortConfig;
use crate::file_sorter::{FileSorter, SortSummary, check_root};
use crate::output::{ConsoleSink, OutputFormatter, Verbosity};
use crate::report::{CategoryReport, category_counts, collect_report};
use crate::unpack::{UnpackSummary, count_archives, unpack_archives};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortCommand {
    /// Sort a directory tree, unpack archives and report.
    Sort {
        /// If true, simulate the operation without making changes.
        dry_run: bool,
    },
    /// Only list the current category directories.
    Report,
}

/// Options that shape a run but not what it does to the tree.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Explicit configuration file. Otherwise the usual lookup applies.
    pub config_path: Option<PathBuf>,
    /// Skip archive unpacking even if the configuration enables it.
    pub no_unpack: bool,
    /// Print a JSON report instead of console lines.
    pub json: bool,
    /// How much to print.
    pub verbosity: Verbosity,
    /// Activity log file. Overrides the configured one.
    pub log_file: Option<PathBuf>,
}

/// Everything a run did, as printed with `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// When the run started.
    pub started_at: DateTime<Local>,
    /// The sorted directory.
    pub root: PathBuf,
    /// Result of the sort phase, if it ran.
    pub sort: Option<SortSummary>,
    /// Result of the unpack phase, if it ran.
    pub unpack: Option<UnpackSummary>,
    /// Category listing after the run.
    pub categories: Vec<CategoryReport>,
}

/// Runs the CLI application with the given command and directory path.
///
/// # Examples
///
/// ```no_run
/// use filesort::cli::{run_cli, SortCommand};
/// use std::path::Path;
///
/// let result = run_cli(SortCommand::Sort { dry_run: false }, Path::new("/path/to/Downloads"));
/// match result {
///     Ok(report) => println!("{} files moved", report.sort.map_or(0, |s| s.moved.len())),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(command: SortCommand, dir_path: &Path) -> Result<RunReport, String> {
    run_cli_with_options(command, dir_path, &RunOptions::default())
}

/// Runs the CLI application with explicit options.
///
/// Per-entry failures are printed and recorded in the returned report; only
/// an invalid root path or an unusable configuration fails the run.
///
/// # Errors
///
/// Returns a message describing why the run could not start.
pub fn run_cli_with_options(
    command: SortCommand,
    dir_path: &Path,
    options: &RunOptions,
) -> Result<RunReport, String> {
    let started_at = Local::now();
    check_root(dir_path).map_err(|e| e.to_string())?;

    let config = SortConfig::load(options.config_path.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?
        .compile()
        .map_err(|e| format!("Error compiling configuration: {}", e))?;

    let log = options
        .log_file
        .as_ref()
        .or(config.log_file.as_ref())
        .map(ActivityLog::new);
    let verbosity = if options.json {
        Verbosity::Quiet
    } else {
        options.verbosity
    };
    let mut sink = ConsoleSink::new(verbosity, log);
    let show_progress = verbosity != Verbosity::Quiet;

    let mut report = RunReport {
        started_at,
        root: dir_path.to_path_buf(),
        sort: None,
        unpack: None,
        categories: Vec::new(),
    };

    if let SortCommand::Sort { dry_run } = command {
        if show_progress {
            if dry_run {
                OutputFormatter::dry_run_notice(&format!(
                    "Analyzing contents of: {}",
                    dir_path.display()
                ));
            } else {
                OutputFormatter::info(&format!("Sorting contents of: {}", dir_path.display()));
            }
            sink.start_phase(OutputFormatter::create_spinner("sorting"));
        }

        let summary = FileSorter::new(&config.table, &config.filters)
            .dry_run(dry_run)
            .sort(dir_path, &mut sink)
            .map_err(|e| e.to_string())?;
        sink.finish_phase();

        if config.unpack_archives && !options.no_unpack && !dry_run {
            if show_progress {
                sink.start_phase(OutputFormatter::create_progress_bar(
                    count_archives(dir_path) as u64,
                ));
            }
            let unpacked = unpack_archives(dir_path, &mut sink).map_err(|e| e.to_string())?;
            sink.finish_phase();
            report.unpack = Some(unpacked);
        }

        if show_progress && dry_run {
            print_planned(&summary);
        }
        report.sort = Some(summary);
    }

    report.categories = collect_report(dir_path).map_err(|e| e.to_string())?;

    if options.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Error serializing report: {}", e))?;
        println!("{}", json);
    } else if verbosity != Verbosity::Quiet && command != (SortCommand::Sort { dry_run: true }) {
        print_report(&report);
    }

    match command {
        SortCommand::Sort { dry_run: false } => sink.note("sorting completed successfully"),
        SortCommand::Sort { dry_run: true } => sink.note("dry run completed, nothing was changed"),
        SortCommand::Report => {}
    }

    Ok(report)
}

fn print_report(report: &RunReport) {
    if report.categories.is_empty() {
        OutputFormatter::plain("No category directories found.");
        return;
    }

    OutputFormatter::header("CATEGORIES");
    for category in &report.categories {
        OutputFormatter::plain(&category.display_line());
    }
    OutputFormatter::summary_table(&category_counts(&report.categories));

    if let Some(summary) = &report.sort
        && !summary.is_complete_success()
    {
        OutputFormatter::warning(&format!(
            "{} entries could not be sorted. Please review errors above.",
            summary.failures.len()
        ));
    }
    if let Some(unpacked) = &report.unpack
        && !unpacked.skipped.is_empty()
    {
        OutputFormatter::warning(&format!(
            "{} archives were not unpacked.",
            unpacked.skipped.len()
        ));
    }
}

fn print_planned(summary: &SortSummary) {
    if summary.moved.is_empty() {
        OutputFormatter::dry_run_notice("No files to sort.");
        return;
    }

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for operation in &summary.moved {
        *counts.entry(operation.category.clone()).or_insert(0) += 1;
    }
    OutputFormatter::summary_table(&counts);
    OutputFormatter::dry_run_notice("Dry run complete. No files were modified.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn quiet() -> RunOptions {
        RunOptions {
            verbosity: Verbosity::Quiet,
            no_unpack: true,
            ..RunOptions::default()
        }
    }

    #[test]
    fn test_run_rejects_missing_root() {
        let result = run_cli_with_options(
            SortCommand::Sort { dry_run: false },
            Path::new("/non/existent/path"),
            &quiet(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_run_rejects_missing_config() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let options = RunOptions {
            config_path: Some(temp_dir.path().join("missing.toml")),
            ..quiet()
        };

        let result = run_cli_with_options(SortCommand::Report, temp_dir.path(), &options);
        assert!(result.unwrap_err().contains("configuration"));
    }

    #[test]
    fn test_report_command_leaves_tree_alone() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("loose.txt"), "").unwrap();

        let report =
            run_cli_with_options(SortCommand::Report, temp_dir.path(), &quiet()).unwrap();

        assert!(report.sort.is_none());
        assert!(report.unpack.is_none());
        assert!(report.categories.is_empty());
        assert!(temp_dir.path().join("loose.txt").is_file());
    }

    #[test]
    fn test_log_file_option_records_completion() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("inbox");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("song.mp3"), "").unwrap();
        let log_path = temp_dir.path().join("logs.txt");

        let options = RunOptions {
            log_file: Some(log_path.clone()),
            ..quiet()
        };
        run_cli_with_options(SortCommand::Sort { dry_run: false }, &root, &options).unwrap();

        let content = fs::read_to_string(&log_path).expect("Failed to read log");
        assert!(content.contains("moved"));
        assert!(
            content
                .lines()
                .last()
                .unwrap()
                .ends_with(" - sorting completed successfully")
        );
    }
}
