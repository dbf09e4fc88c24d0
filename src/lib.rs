//! filesort - sort a directory tree into category folders
//!
//! This library classifies files by extension, normalizes their names
//! (Cyrillic transliteration, non-word characters to `_`), moves them into
//! category subdirectories, removes directories left empty, unpacks
//! collected archives and reports the result. Behaviour can be tuned with a
//! TOML configuration file.

pub mod activity_log;
pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_sorter;
pub mod normalize;
pub mod output;
pub mod report;
pub mod unpack;

pub use config::{CompiledConfig, CompiledFilters, ConfigError, SortConfig};
pub use file_category::{CategoryRule, CategoryTable};
pub use file_sorter::{FileSorter, SortError, SortSummary};
pub use normalize::normalize;
pub use report::{CategoryReport, collect_report};
pub use unpack::{UnpackError, UnpackSummary, unpack_archives};

pub use cli::{RunOptions, RunReport, SortCommand, run_cli, run_cli_with_options};
