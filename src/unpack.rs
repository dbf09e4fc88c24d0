//! Archive unpacking.
//!
//! After sorting, every archive in the top-level `archives` directory is
//! extracted into `archives/<stem>/`. The container format is sniffed from
//! the file header with `infer`, so a misnamed archive is still handled and
//! a file that merely ends in `.zip` is not.
//!
//! # Supported
//! - zip
//! - tar
//! - gzip: extracted as tar when the payload is a tar stream, otherwise the
//!   payload is written out as a single file.
//!
//! Anything else is skipped. A corrupt archive is skipped as well, and the
//! extraction directory created for it is removed again.

use crate::file_category::ARCHIVES_CATEGORY;
use crate::file_sorter::{Failure, SortResult, check_root, list_dir};
use crate::normalize::split_name;
use crate::output::{EventSink, SortEvent};
use flate2::read::MultiGzDecoder;
use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Bytes read from the start of a file to sniff its format.
const SNIFF_LEN: u64 = 8192;

/// Size of a tar header block.
const TAR_BLOCK_LEN: u64 = 512;

/// Container formats the unpacker can extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    Zip,
    Tar,
    Gzip,
}

impl ArchiveFormat {
    /// Detects the format from the first bytes of a file.
    ///
    /// # Examples
    ///
    /// ```
    /// use filesort::unpack::ArchiveFormat;
    ///
    /// assert_eq!(ArchiveFormat::sniff(b"PK\x03\x04rest"), Some(ArchiveFormat::Zip));
    /// assert_eq!(ArchiveFormat::sniff(&[0x1f, 0x8b, 0x08, 0x00]), Some(ArchiveFormat::Gzip));
    /// assert_eq!(ArchiveFormat::sniff(b"plain text"), None);
    /// ```
    pub fn sniff(header: &[u8]) -> Option<Self> {
        if infer::archive::is_zip(header) {
            Some(Self::Zip)
        } else if infer::archive::is_gz(header) {
            Some(Self::Gzip)
        } else if infer::archive::is_tar(header) {
            Some(Self::Tar)
        } else {
            None
        }
    }

    /// Reads the start of `path` and detects its format.
    pub fn detect(path: &Path) -> io::Result<Option<Self>> {
        let mut header = Vec::new();
        File::open(path)?.take(SNIFF_LEN).read_to_end(&mut header)?;
        Ok(Self::sniff(&header))
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::Gzip => "gzip",
        })
    }
}

/// Why an archive was not extracted.
#[derive(Debug)]
pub enum UnpackError {
    /// The file is not in a supported archive format.
    UnsupportedFormat,
    /// The archive could not be read to the end.
    Corrupt(String),
    /// The archive or its destination could not be accessed.
    Io(io::Error),
}

impl fmt::Display for UnpackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat => write!(f, "unsupported archive format"),
            Self::Corrupt(reason) => write!(f, "corrupt archive: {}", reason),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for UnpackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for UnpackError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

fn corrupt(e: impl fmt::Display) -> UnpackError {
    UnpackError::Corrupt(e.to_string())
}

/// An archive that was extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnpackedArchive {
    /// The archive file.
    pub archive: PathBuf,
    /// Directory it was extracted into.
    pub destination: PathBuf,
    /// Detected container format.
    pub format: ArchiveFormat,
}

/// Outcome of one unpack pass.
#[derive(Debug, Default, Clone, Serialize)]
pub struct UnpackSummary {
    /// Archives extracted, in processing order.
    pub unpacked: Vec<UnpackedArchive>,
    /// Entries of the archives directory that were not extracted.
    pub skipped: Vec<Failure>,
}

/// Returns the number of files waiting in `<root>/archives`.
pub fn count_archives(root: &Path) -> usize {
    list_dir(&root.join(ARCHIVES_CATEGORY))
        .map(|items| items.iter().filter(|item| !item.is_dir).count())
        .unwrap_or(0)
}

/// Extracts every archive in `<root>/archives` into `<root>/archives/<stem>`.
///
/// Destinations are created if missing and merged into if present.
/// Unsupported and corrupt archives are emitted as skipped and left as they
/// are. If the archives directory cannot be listed, the failure is emitted
/// and the pass ends.
///
/// # Errors
///
/// Returns `SortError::InvalidRootPath` if `root` is not an existing directory.
pub fn unpack_archives(root: &Path, sink: &mut dyn EventSink) -> SortResult<UnpackSummary> {
    check_root(root)?;

    let mut summary = UnpackSummary::default();
    let archives_dir = root.join(ARCHIVES_CATEGORY);
    if !archives_dir.is_dir() {
        return Ok(summary);
    }

    let items = match list_dir(&archives_dir) {
        Ok(items) => items,
        Err(e) => {
            sink.emit(&SortEvent::EntryFailed(&e));
            return Ok(summary);
        }
    };

    for item in items.iter().filter(|item| !item.is_dir) {
        let Some(name) = item.name() else {
            continue;
        };
        let (stem, _) = split_name(name);
        let destination = archives_dir.join(stem);

        match unpack_archive(&item.path, &destination) {
            Ok(format) => {
                sink.emit(&SortEvent::ArchiveUnpacked {
                    archive: &item.path,
                    destination: &destination,
                    format,
                });
                summary.unpacked.push(UnpackedArchive {
                    archive: item.path.clone(),
                    destination,
                    format,
                });
            }
            Err(reason) => {
                sink.emit(&SortEvent::ArchiveSkipped {
                    archive: &item.path,
                    reason: &reason,
                });
                summary.skipped.push(Failure {
                    path: item.path.clone(),
                    reason: reason.to_string(),
                });
            }
        }
    }

    Ok(summary)
}

/// Extracts one archive into `destination`.
///
/// Nothing is created for files that are not archives. If extraction
/// fails and `destination` did not exist before, it is removed again.
pub fn unpack_archive(archive: &Path, destination: &Path) -> Result<ArchiveFormat, UnpackError> {
    let format = ArchiveFormat::detect(archive)?.ok_or(UnpackError::UnsupportedFormat)?;

    let created = !destination.exists();
    fs::create_dir_all(destination)?;

    let result = match format {
        ArchiveFormat::Zip => extract_zip(archive, destination),
        ArchiveFormat::Tar => extract_tar(File::open(archive)?, destination),
        ArchiveFormat::Gzip => extract_gzip(archive, destination),
    };

    if let Err(e) = result {
        if created {
            // Best effort; the archive itself is untouched either way.
            let _ = fs::remove_dir_all(destination);
        }
        return Err(e);
    }

    Ok(format)
}

fn extract_zip(archive: &Path, destination: &Path) -> Result<(), UnpackError> {
    let mut zip = zip::ZipArchive::new(File::open(archive)?).map_err(corrupt)?;
    zip.extract(destination).map_err(corrupt)
}

fn extract_tar<R: Read>(reader: R, destination: &Path) -> Result<(), UnpackError> {
    tar::Archive::new(reader)
        .unpack(destination)
        .map_err(corrupt)
}

fn extract_gzip(archive: &Path, destination: &Path) -> Result<(), UnpackError> {
    let mut decoder = MultiGzDecoder::new(File::open(archive)?);

    let mut head = Vec::new();
    decoder
        .by_ref()
        .take(TAR_BLOCK_LEN)
        .read_to_end(&mut head)
        .map_err(corrupt)?;
    let is_tar = infer::archive::is_tar(&head);
    let mut payload = io::Cursor::new(head).chain(decoder);

    if is_tar {
        return extract_tar(payload, destination);
    }

    let payload_name = archive
        .file_stem()
        .ok_or_else(|| UnpackError::Corrupt("archive has no file name".to_string()))?;
    let mut out = File::create(destination.join(payload_name))?;
    io::copy(&mut payload, &mut out).map_err(corrupt)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::SilentSink;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, files: &[(&str, &str)]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, content) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    fn tar_bytes(files: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn gzip_bytes(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_sniff_tar_header() {
        let bytes = tar_bytes(&[("a.txt", "a")]);
        assert_eq!(ArchiveFormat::sniff(&bytes), Some(ArchiveFormat::Tar));
    }

    #[test]
    fn test_unpack_zip() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let archive = temp_dir.path().join("bundle.zip");
        write_zip(&archive, &[("a.txt", "alpha"), ("sub/b.txt", "beta")]);

        let destination = temp_dir.path().join("bundle");
        let format = unpack_archive(&archive, &destination).unwrap();

        assert_eq!(format, ArchiveFormat::Zip);
        assert_eq!(
            fs::read_to_string(destination.join("a.txt")).unwrap(),
            "alpha"
        );
        assert_eq!(
            fs::read_to_string(destination.join("sub/b.txt")).unwrap(),
            "beta"
        );
    }

    #[test]
    fn test_unpack_tar_gz() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let archive = temp_dir.path().join("backup_tar.gz");
        fs::write(&archive, gzip_bytes(&tar_bytes(&[("notes.md", "# notes")]))).unwrap();

        let destination = temp_dir.path().join("backup_tar");
        let format = unpack_archive(&archive, &destination).unwrap();

        assert_eq!(format, ArchiveFormat::Gzip);
        assert_eq!(
            fs::read_to_string(destination.join("notes.md")).unwrap(),
            "# notes"
        );
    }

    #[test]
    fn test_unpack_plain_gzip() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let archive = temp_dir.path().join("server_log.gz");
        fs::write(&archive, gzip_bytes(b"line one\nline two\n")).unwrap();

        let destination = temp_dir.path().join("server_log");
        unpack_archive(&archive, &destination).unwrap();

        assert_eq!(
            fs::read_to_string(destination.join("server_log")).unwrap(),
            "line one\nline two\n"
        );
    }

    #[test]
    fn test_unsupported_format_creates_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let archive = temp_dir.path().join("fake.zip");
        fs::write(&archive, "definitely not a zip").unwrap();

        let destination = temp_dir.path().join("fake");
        let result = unpack_archive(&archive, &destination);

        assert!(matches!(result, Err(UnpackError::UnsupportedFormat)));
        assert!(!destination.exists());
        assert!(archive.is_file());
    }

    #[test]
    fn test_corrupt_zip_is_cleaned_up() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let archive = temp_dir.path().join("broken.zip");
        fs::write(&archive, b"PK\x03\x04 truncated garbage").unwrap();

        let destination = temp_dir.path().join("broken");
        let result = unpack_archive(&archive, &destination);

        assert!(matches!(result, Err(UnpackError::Corrupt(_))));
        assert!(!destination.exists());
        assert!(archive.is_file());
    }

    #[test]
    fn test_unpack_merges_into_existing_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let archive = temp_dir.path().join("bundle.zip");
        write_zip(&archive, &[("a.txt", "alpha")]);

        let destination = temp_dir.path().join("bundle");
        fs::create_dir(&destination).unwrap();
        fs::write(destination.join("keep.txt"), "keep").unwrap();

        unpack_archive(&archive, &destination).unwrap();

        assert!(destination.join("keep.txt").is_file());
        assert!(destination.join("a.txt").is_file());
    }

    #[test]
    fn test_unpack_archives_without_archives_dir() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let summary = unpack_archives(temp_dir.path(), &mut SilentSink).unwrap();
        assert!(summary.unpacked.is_empty());
        assert!(summary.skipped.is_empty());
    }

    #[test]
    fn test_unpack_archives_skips_bad_entries() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let archives = temp_dir.path().join("archives");
        fs::create_dir(&archives).unwrap();
        write_zip(&archives.join("good.zip"), &[("a.txt", "alpha")]);
        fs::write(archives.join("bad.zip"), "not an archive").unwrap();
        fs::write(archives.join("music.rar"), b"Rar!\x1a\x07\x00").unwrap();

        let summary = unpack_archives(temp_dir.path(), &mut SilentSink).unwrap();

        assert_eq!(summary.unpacked.len(), 1);
        assert_eq!(summary.unpacked[0].destination, archives.join("good"));
        assert_eq!(summary.skipped.len(), 2);
        assert!(archives.join("good/a.txt").is_file());
        assert!(!archives.join("bad").exists());
        assert!(!archives.join("music").exists());
        assert!(archives.join("bad.zip").is_file());
        assert_eq!(count_archives(temp_dir.path()), 3);
    }

    #[test]
    fn test_unpack_archives_invalid_root() {
        let result = unpack_archives(Path::new("/non/existent/path"), &mut SilentSink);
        assert!(result.is_err());
    }
}
