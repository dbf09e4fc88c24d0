/// File categorization by extension.
///
/// This module maps file extensions (with their leading dot) to category names.
/// The table is ordered: an extension listed under more than one category
/// belongs to the first one declared.
///
/// # Examples
///
/// ```
/// use filesort::file_category::CategoryTable;
///
/// let table = CategoryTable::default();
/// assert_eq!(table.classify(".png"), "images");
/// assert_eq!(table.classify(".csv"), "documents");
/// assert_eq!(table.classify(".xyz"), "unknown");
/// ```
use crate::normalize::split_name;
use std::path::Path;

/// Category name for files whose extension matches no table entry.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Category whose directory the archive unpacker works on.
pub const ARCHIVES_CATEGORY: &str = "archives";

/// Built-in table, in lookup order.
///
/// `.xml` and `.csv` appear under both `documents` and `data`; they sort
/// into `documents`.
const DEFAULT_TABLE: &[(&str, &[&str])] = &[
    (
        "images",
        &[
            ".jpg", ".jpeg", ".png", ".gif", ".tiff", ".ico", ".bmp", ".webp", ".svg",
        ],
    ),
    (
        "documents",
        &[
            ".md", ".epub", ".txt", ".docx", ".doc", ".ods", ".odt", ".dotx", ".docm", ".dox",
            ".rvg", ".rtf", ".rtfd", ".wpd", ".xls", ".xlsx", ".ppt", ".pptx", ".csv", ".xml",
        ],
    ),
    ("archives", &[".tar", ".gz", ".zip", ".rar"]),
    (
        "audio",
        &[".aac", ".m4a", ".mp3", ".ogg", ".raw", ".wav", ".wma"],
    ),
    (
        "video",
        &[
            ".avi", ".flv", ".wmv", ".mov", ".mp4", ".webm", ".vob", ".mpg", ".mpeg", ".3gp",
        ],
    ),
    ("pdf", &[".pdf"]),
    ("html", &[".html", ".htm", ".xhtml"]),
    ("exe_msi", &[".exe", ".msi"]),
    ("scripts", &[".sh", ".bat", ".ps1"]),
    ("fonts", &[".ttf", ".otf", ".woff", ".woff2"]),
    ("data", &[".json", ".xml", ".yaml", ".csv"]),
    (
        "programming_lang",
        &[".java", ".c", ".cpp", ".cs", ".php", ".js", ".py"],
    ),
    ("compressed", &[".7z", ".tar.gz", ".bz2", ".xz"]),
    ("presentation", &[".key", ".odp"]),
    ("cad", &[".dwg", ".dxf"]),
    ("backup", &[".bak", ".backup"]),
];

/// A named bucket of file extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    /// Directory name files of this category are moved into.
    pub name: String,
    /// Recognized extensions, each starting with `.`.
    pub extensions: Vec<String>,
}

impl CategoryRule {
    /// Creates a rule from a name and its extensions.
    pub fn new<S: Into<String>>(name: S, extensions: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    fn matches(&self, ext: &str, case_sensitive: bool) -> bool {
        self.extensions.iter().any(|candidate| {
            if case_sensitive {
                candidate == ext
            } else {
                candidate.eq_ignore_ascii_case(ext)
            }
        })
    }
}

/// Ordered mapping from category names to extensions.
///
/// Lookups walk the rules in declaration order and stop at the first match,
/// so overlapping extensions resolve deterministically.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    rules: Vec<CategoryRule>,
    case_sensitive: bool,
}

impl CategoryTable {
    /// Creates a table from rules in lookup order.
    ///
    /// Extension matching ignores ASCII case unless `case_sensitive` is set.
    pub fn new(rules: Vec<CategoryRule>, case_sensitive: bool) -> Self {
        Self {
            rules,
            case_sensitive,
        }
    }

    /// Returns the rules in lookup order.
    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Returns true if extension lookups are case-sensitive.
    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Returns a copy of this table with a different case sensitivity.
    pub fn with_case_sensitivity(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Maps an extension (with its leading dot) to a category name.
    ///
    /// Returns [`UNKNOWN_CATEGORY`] when no rule lists the extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use filesort::file_category::CategoryTable;
    ///
    /// let table = CategoryTable::default();
    /// assert_eq!(table.classify(".mp3"), "audio");
    /// assert_eq!(table.classify(".JPG"), "images");
    /// assert_eq!(table.classify(""), "unknown");
    /// ```
    pub fn classify(&self, ext: &str) -> &str {
        self.rules
            .iter()
            .find(|rule| rule.matches(ext, self.case_sensitive))
            .map(|rule| rule.name.as_str())
            .unwrap_or(UNKNOWN_CATEGORY)
    }

    /// Classifies a path by the suffix of its file name.
    pub fn classify_path(&self, path: &Path) -> &str {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        let (_, suffix) = split_name(&file_name);
        self.classify(suffix)
    }

    /// Returns true if `name` is a category directory name, `unknown` included.
    pub fn is_category_name(&self, name: &str) -> bool {
        name == UNKNOWN_CATEGORY || self.rules.iter().any(|rule| rule.name == name)
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        let rules = DEFAULT_TABLE
            .iter()
            .map(|(name, extensions)| CategoryRule::new(*name, extensions.iter().copied()))
            .collect();
        Self::new(rules, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_order() {
        let table = CategoryTable::default();
        let names: Vec<&str> = table.rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "images",
                "documents",
                "archives",
                "audio",
                "video",
                "pdf",
                "html",
                "exe_msi",
                "scripts",
                "fonts",
                "data",
                "programming_lang",
                "compressed",
                "presentation",
                "cad",
                "backup",
            ]
        );
    }

    #[test]
    fn test_classify_single_category_extensions() {
        let table = CategoryTable::default();
        assert_eq!(table.classify(".jpg"), "images");
        assert_eq!(table.classify(".docx"), "documents");
        assert_eq!(table.classify(".zip"), "archives");
        assert_eq!(table.classify(".mp3"), "audio");
        assert_eq!(table.classify(".mp4"), "video");
        assert_eq!(table.classify(".pdf"), "pdf");
        assert_eq!(table.classify(".htm"), "html");
        assert_eq!(table.classify(".msi"), "exe_msi");
        assert_eq!(table.classify(".ps1"), "scripts");
        assert_eq!(table.classify(".woff2"), "fonts");
        assert_eq!(table.classify(".json"), "data");
        assert_eq!(table.classify(".py"), "programming_lang");
        assert_eq!(table.classify(".7z"), "compressed");
        assert_eq!(table.classify(".odp"), "presentation");
        assert_eq!(table.classify(".dwg"), "cad");
        assert_eq!(table.classify(".bak"), "backup");
    }

    #[test]
    fn test_classify_overlapping_extensions_first_match_wins() {
        let table = CategoryTable::default();
        for _ in 0..3 {
            assert_eq!(table.classify(".csv"), "documents");
            assert_eq!(table.classify(".xml"), "documents");
        }
    }

    #[test]
    fn test_classify_unknown() {
        let table = CategoryTable::default();
        assert_eq!(table.classify(".xyz"), UNKNOWN_CATEGORY);
        assert_eq!(table.classify(""), UNKNOWN_CATEGORY);
        assert_eq!(table.classify("jpg"), UNKNOWN_CATEGORY);
    }

    #[test]
    fn test_classify_case_insensitive_by_default() {
        let table = CategoryTable::default();
        assert_eq!(table.classify(".JPG"), "images");
        assert_eq!(table.classify(".Mp3"), "audio");
    }

    #[test]
    fn test_classify_case_sensitive() {
        let table = CategoryTable::default().with_case_sensitivity(true);
        assert_eq!(table.classify(".jpg"), "images");
        assert_eq!(table.classify(".JPG"), UNKNOWN_CATEGORY);
    }

    #[test]
    fn test_classify_path_uses_last_suffix() {
        let table = CategoryTable::default();
        assert_eq!(table.classify_path(Path::new("dir/a.tar.gz")), "archives");
        assert_eq!(table.classify_path(Path::new(".bashrc")), UNKNOWN_CATEGORY);
        assert_eq!(table.classify_path(Path::new("notes.txt")), "documents");
    }

    #[test]
    fn test_custom_table() {
        let table = CategoryTable::new(
            vec![
                CategoryRule::new("logs", vec![".log"]),
                CategoryRule::new("text", vec![".log", ".txt"]),
            ],
            false,
        );
        assert_eq!(table.classify(".log"), "logs");
        assert_eq!(table.classify(".txt"), "text");
        assert_eq!(table.classify(".png"), UNKNOWN_CATEGORY);
    }

    #[test]
    fn test_is_category_name() {
        let table = CategoryTable::default();
        assert!(table.is_category_name("images"));
        assert!(table.is_category_name(UNKNOWN_CATEGORY));
        assert!(!table.is_category_name("photos"));
    }
}
