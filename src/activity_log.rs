/// Append-only activity log.
///
/// Each line carries a local timestamp, e.g.
/// `[2024-05-01] [13:04:05] - directory old removed`.
use chrono::NaiveDateTime;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A log file that sort events are appended to.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    /// Creates a log writing to `path`. The file is created on first append.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one timestamped line.
    pub fn append(&self, message: &str) -> io::Result<()> {
        let line = format_line(&chrono::Local::now().naive_local(), message);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)
    }
}

/// Formats a log line for the given time.
pub fn format_line(time: &NaiveDateTime, message: &str) -> String {
    format!("{} - {}", time.format("[%Y-%m-%d] [%H:%M:%S]"), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn test_format_line() {
        let time = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(13, 4, 5)
            .unwrap();
        assert_eq!(
            format_line(&time, "path 'x' is not found"),
            "[2024-05-01] [13:04:05] - path 'x' is not found"
        );
    }

    #[test]
    fn test_append_creates_and_appends() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let log = ActivityLog::new(temp_dir.path().join("logs.txt"));

        log.append("first").expect("Failed to append");
        log.append("second").expect("Failed to append");

        let content = std::fs::read_to_string(log.path()).expect("Failed to read log");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with(" - first"));
        assert!(lines[1].ends_with(" - second"));
    }

    #[test]
    fn test_append_to_missing_directory_fails() {
        let log = ActivityLog::new("/non/existent/dir/logs.txt");
        assert!(log.append("message").is_err());
    }
}
