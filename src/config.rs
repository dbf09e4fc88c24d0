//! Sorting configuration.
//!
//! This module loads the category table and file filtering rules from TOML
//! configuration files. It supports:
//! - Replacing the built-in category table (order is kept)
//! - Case-sensitive or case-insensitive extension matching
//! - Turning archive unpacking off
//! - An activity log file
//! - Exclude rules by filename, glob, extension and regex, with include
//!   (whitelist) rules that override them
//!
//! # Configuration File Format
//!
//! ```toml
//! unpack_archives = true
//! case_sensitive = false
//! log_file = "logs.txt"
//!
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["*.tmp", "node_modules/**"]
//! extensions = ["part"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//!
//! [[categories]]
//! name = "images"
//! extensions = [".jpg", ".png"]
//! ```

use crate::file_category::{CategoryRule, CategoryTable, UNKNOWN_CATEGORY};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".filesortrc.toml";

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// A category entry cannot be used as a directory or has a bad extension.
    InvalidCategory {
        /// The category name as written in the configuration.
        name: String,
        /// What is wrong with it.
        reason: String,
    },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(
                    f,
                    "Invalid glob pattern '{}': expected *.ext or dir/**",
                    pattern
                )
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::InvalidCategory { name, reason } => {
                write!(f, "Invalid category '{}': {}", name, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level configuration, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortConfig {
    /// Whether to unpack archives after sorting. Defaults to true.
    #[serde(default = "default_unpack_archives")]
    pub unpack_archives: bool,

    /// Whether extension matching is case-sensitive. Defaults to false.
    #[serde(default)]
    pub case_sensitive: bool,

    /// File that sort events are appended to, if any.
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// File filtering rules.
    #[serde(default)]
    pub filters: FilterRules,

    /// Replacement category table. The built-in table is used when absent.
    #[serde(default)]
    pub categories: Option<Vec<CategoryEntry>>,
}

fn default_unpack_archives() -> bool {
    true
}

/// A category as written in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEntry {
    /// Category (and directory) name.
    pub name: String,
    /// Extensions, each starting with `.`.
    #[serde(default)]
    pub extensions: Vec<String>,
}

/// Root-level filter rules configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to sort hidden files (starting with "."). Defaults to true.
    #[serde(default = "default_enable_hidden_files")]
    pub enable_hidden_files: bool,

    /// Rules for excluding files.
    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Rules for including files (whitelist, overrides exclude rules).
    #[serde(default)]
    pub include: IncludeRules,
}

fn default_enable_hidden_files() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_enable_hidden_files(),
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

/// Rules for leaving files where they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to exclude, matched against the path relative to the root.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude, without the dot (e.g., "part", "tmp").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for including files, overriding exclude rules (whitelist).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    /// Glob patterns that override exclude rules.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl SortConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.filesortrc.toml` in the current directory
    /// 3. Look for `~/.config/filesort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is found but cannot be read or parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("filesort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Validate the configuration and build the structures used while sorting.
    ///
    /// # Errors
    ///
    /// Returns an error if a category entry is unusable or a filter pattern is invalid.
    pub fn compile(self) -> Result<CompiledConfig, ConfigError> {
        let table = match self.categories {
            Some(entries) => CategoryTable::new(compile_categories(entries)?, self.case_sensitive),
            None => CategoryTable::default().with_case_sensitivity(self.case_sensitive),
        };

        Ok(CompiledConfig {
            table,
            filters: CompiledFilters::new(self.filters)?,
            unpack_archives: self.unpack_archives,
            log_file: self.log_file,
        })
    }
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            unpack_archives: default_unpack_archives(),
            case_sensitive: false,
            log_file: None,
            filters: FilterRules::default(),
            categories: None,
        }
    }
}

/// Checks configured categories and turns them into table rules.
fn compile_categories(entries: Vec<CategoryEntry>) -> Result<Vec<CategoryRule>, ConfigError> {
    let mut seen = HashSet::new();
    let mut rules = Vec::with_capacity(entries.len());

    for entry in entries {
        let invalid = |reason: &str| ConfigError::InvalidCategory {
            name: entry.name.clone(),
            reason: reason.to_string(),
        };

        if entry.name.is_empty() {
            return Err(invalid("name is empty"));
        }
        if entry.name == "." || entry.name == ".." {
            return Err(invalid("name is not a valid directory name"));
        }
        if entry.name.contains(['/', '\\']) {
            return Err(invalid("name contains a path separator"));
        }
        if entry.name == UNKNOWN_CATEGORY {
            return Err(invalid("name is reserved for unmatched files"));
        }
        if !seen.insert(entry.name.clone()) {
            return Err(invalid("name is declared more than once"));
        }
        if let Some(ext) = entry.extensions.iter().find(|ext| !ext.starts_with('.')) {
            return Err(invalid(&format!("extension '{}' must start with '.'", ext)));
        }

        rules.push(CategoryRule {
            name: entry.name,
            extensions: entry.extensions,
        });
    }

    Ok(rules)
}

/// Everything a sort run needs from the configuration.
#[derive(Debug)]
pub struct CompiledConfig {
    /// Extension to category lookup table.
    pub table: CategoryTable,
    /// File filters.
    pub filters: CompiledFilters,
    /// Whether to unpack archives after sorting.
    pub unpack_archives: bool,
    /// Activity log file, if any.
    pub log_file: Option<PathBuf>,
}

impl Default for CompiledConfig {
    fn default() -> Self {
        Self {
            table: CategoryTable::default(),
            filters: CompiledFilters::default(),
            unpack_archives: true,
            log_file: None,
        }
    }
}

/// Compiled filter structures for file matching.
///
/// Glob and regex patterns are compiled once so each file check only
/// runs the matchers.
#[derive(Debug)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    /// Create compiled filters from filter rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex patterns are invalid.
    pub fn new(rules: FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.into_iter().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
        })
    }

    /// Check if a file should be sorted.
    ///
    /// `rel_path` is the file's path relative to the sort root. Checks run
    /// in this order, stopping at the first decision:
    /// 1. Include patterns (whitelist) - if matched, always include
    /// 2. Hidden file filter - if hidden and disabled, exclude
    /// 3. Exact filename match - if matched, exclude
    /// 4. File extension match - if matched, exclude
    /// 5. Glob pattern match - if matched, exclude
    /// 6. Regex pattern match - if matched, exclude
    /// 7. Default: include
    pub fn should_include(&self, rel_path: &Path) -> bool {
        let file_name = rel_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.matches_any(&self.include_patterns, rel_path) {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = rel_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self.matches_any(&self.exclude_patterns, rel_path) {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }

    fn matches_any(&self, patterns: &[Pattern], rel_path: &Path) -> bool {
        patterns.iter().any(|pattern| pattern.matches_path(rel_path))
    }
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_enable_hidden_files(),
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}
