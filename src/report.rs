//! Listing of the sorted tree, one entry per first-level directory.

use crate::file_sorter::{SortResult, check_root, list_dir};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Files found directly inside one category directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryReport {
    /// Name of the first-level directory.
    pub category: String,
    /// Names of the files it holds, sorted. Subdirectories are not listed.
    pub files: Vec<String>,
}

impl CategoryReport {
    /// Renders the console line, e.g. `files in category images: a.png, b.jpg`.
    pub fn display_line(&self) -> String {
        format!(
            "files in category {}: {}",
            self.category,
            self.files.join(", ")
        )
    }
}

/// Lists the immediate files of every first-level subdirectory of `root`.
///
/// Directories come out sorted by name. A subdirectory that cannot be read
/// is reported with no files.
///
/// # Errors
///
/// Returns `SortError::InvalidRootPath` if `root` is not an existing
/// directory, and `SortError::ReadDirFailed` if it cannot be listed.
pub fn collect_report(root: &Path) -> SortResult<Vec<CategoryReport>> {
    check_root(root)?;

    let mut reports = Vec::new();
    for dir in list_dir(root)?.into_iter().filter(|item| item.is_dir) {
        let Some(category) = dir.name() else {
            continue;
        };

        let files = list_dir(&dir.path)
            .unwrap_or_default()
            .iter()
            .filter(|item| !item.is_dir)
            .filter_map(|item| item.name().map(str::to_string))
            .collect();

        reports.push(CategoryReport {
            category: category.to_string(),
            files,
        });
    }

    Ok(reports)
}

/// Counts files per category, for the summary table.
pub fn category_counts(reports: &[CategoryReport]) -> BTreeMap<String, usize> {
    reports
        .iter()
        .map(|report| (report.category.clone(), report.files.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_report() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("images")).unwrap();
        fs::create_dir_all(root.join("archives/bundle")).unwrap();
        fs::write(root.join("images/b.png"), "").unwrap();
        fs::write(root.join("images/a.jpg"), "").unwrap();
        fs::write(root.join("archives/bundle.zip"), "").unwrap();
        fs::write(root.join("archives/bundle/inner.txt"), "").unwrap();
        fs::write(root.join("stray.txt"), "").unwrap();

        let reports = collect_report(root).unwrap();

        assert_eq!(
            reports,
            vec![
                CategoryReport {
                    category: "archives".to_string(),
                    files: vec!["bundle.zip".to_string()],
                },
                CategoryReport {
                    category: "images".to_string(),
                    files: vec!["a.jpg".to_string(), "b.png".to_string()],
                },
            ]
        );
        assert_eq!(
            reports[1].display_line(),
            "files in category images: a.jpg, b.png"
        );
    }

    #[test]
    fn test_category_counts() {
        let reports = vec![
            CategoryReport {
                category: "audio".to_string(),
                files: vec!["song.mp3".to_string()],
            },
            CategoryReport {
                category: "empty".to_string(),
                files: Vec::new(),
            },
        ];

        let counts = category_counts(&reports);
        assert_eq!(counts.get("audio"), Some(&1));
        assert_eq!(counts.get("empty"), Some(&0));
    }

    #[test]
    fn test_collect_report_invalid_root() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "").unwrap();

        assert!(collect_report(&file).is_err());
        assert!(collect_report(&temp_dir.path().join("missing")).is_err());
    }
}
