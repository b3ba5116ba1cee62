//! File relocation primitive
//!
//! Copy, move or leave a file in place. Per-file problems (missing source,
//! existing destination, bad path) are reported as [`RenameOutcome::Skipped`]
//! with one warning; problems with the environment itself (permissions,
//! unsupported operations, overlong paths) are returned as fatal errors.

use crate::error::{Error, Result};
use crate::os;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{Level, Span, debug, span, warn};

pub use crate::config::RenameType;

/// Why a rename was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    SourceNotFound,
    DestinationDirectoryNotFound,
    DestinationExists,
    EmptyPath,
    InvalidPath,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::SourceNotFound => "source file not found",
            SkipReason::DestinationDirectoryNotFound => "destination directory not found",
            SkipReason::DestinationExists => "destination already exists",
            SkipReason::EmptyPath => "empty path",
            SkipReason::InvalidPath => "invalid characters in path",
        };
        f.write_str(text)
    }
}

/// Result of one rename request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    /// The file was copied or moved
    Done,
    /// Nothing happened because of a recoverable per-file problem
    Skipped(SkipReason),
    /// The rename type is `None`
    Disabled,
}

/// Something that can relocate a file
pub trait Rename {
    fn rename_file(&self, source: &Path, dest: &Path, mode: RenameType) -> Result<RenameOutcome>;
}

/// Filesystem-backed [`Rename`]
#[derive(Debug)]
pub struct Renamer {
    span: Span,
}

impl Renamer {
    pub fn new() -> Self {
        Self {
            span: span!(Level::DEBUG, "renamer"),
        }
    }
}

impl Default for Renamer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rename for Renamer {
    fn rename_file(&self, source: &Path, dest: &Path, mode: RenameType) -> Result<RenameOutcome> {
        let _enter = self.span.enter();

        if mode == RenameType::None {
            return Ok(RenameOutcome::Disabled);
        }

        if source.as_os_str().is_empty() || dest.as_os_str().is_empty() {
            return Ok(skipped(source, dest, SkipReason::EmptyPath));
        }

        let result = match mode {
            RenameType::Copy => copy_file(source, dest),
            RenameType::Move => move_file(source, dest),
            RenameType::None => Ok(()),
        };

        match result {
            Ok(()) => {
                debug!(?source, ?dest, ?mode, "Renamed file");
                Ok(RenameOutcome::Done)
            }
            Err(e) => classify(e, source, dest),
        }
    }
}

fn skipped(source: &Path, dest: &Path, reason: SkipReason) -> RenameOutcome {
    warn!(?source, ?dest, %reason, "Skipping file");
    RenameOutcome::Skipped(reason)
}

/// Split an I/O failure into a skip or a fatal error
fn classify(err: io::Error, source: &Path, dest: &Path) -> Result<RenameOutcome> {
    if os::is_path_too_long(&err) {
        return Err(Error::PathTooLong {
            path: dest.to_path_buf(),
        });
    }

    let reason = match err.kind() {
        io::ErrorKind::PermissionDenied => {
            return Err(Error::PermissionDenied {
                path: dest.to_path_buf(),
                source: err,
            });
        }
        io::ErrorKind::Unsupported => {
            return Err(Error::Unsupported {
                path: dest.to_path_buf(),
                source: err,
            });
        }
        io::ErrorKind::NotFound if !source.exists() => SkipReason::SourceNotFound,
        io::ErrorKind::NotFound => SkipReason::DestinationDirectoryNotFound,
        io::ErrorKind::AlreadyExists => SkipReason::DestinationExists,
        _ if os::is_invalid_name(&err) => SkipReason::InvalidPath,
        _ => return Err(Error::Io(err)),
    };

    Ok(skipped(source, dest, reason))
}

/// Copy without overwriting, keeping the source modification time
fn copy_file(source: &Path, dest: &Path) -> io::Result<()> {
    let src_file = File::open(source)?;
    let dest_file = OpenOptions::new().write(true).create_new(true).open(dest)?;

    if let Err(e) = copy_contents(src_file, dest_file) {
        let _ = fs::remove_file(dest);
        return Err(e);
    }

    if let Ok(metadata) = fs::metadata(source)
        && let Ok(mtime) = metadata.modified()
    {
        let _ = filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(mtime));
    }

    Ok(())
}

fn copy_contents(src_file: File, dest_file: File) -> io::Result<()> {
    let mut reader = BufReader::with_capacity(256 * 1024, src_file);
    let mut writer = BufWriter::with_capacity(256 * 1024, dest_file);

    let mut buffer = vec![0u8; 256 * 1024];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        writer.write_all(&buffer[..bytes_read])?;
    }

    writer.flush()
}

/// Move without overwriting, falling back to copy + delete across filesystems
fn move_file(source: &Path, dest: &Path) -> io::Result<()> {
    fs::symlink_metadata(source)?;
    if fs::symlink_metadata(dest).is_ok() {
        return Err(io::Error::from(io::ErrorKind::AlreadyExists));
    }

    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(?source, ?dest, "Cross-device move, copying instead");
            copy_file(source, dest)?;
            fs::remove_file(source)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn setup() -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("IMG_0001.jpg");
        fs::write(&source, b"pixels").unwrap();
        (dir, source)
    }

    #[test]
    fn test_copy_keeps_source_and_mtime() {
        let (dir, source) = setup();
        let old = SystemTime::now() - Duration::from_secs(86_400 * 30);
        filetime::set_file_mtime(&source, filetime::FileTime::from_system_time(old)).unwrap();

        let dest = dir.path().join("copy.jpg");
        let outcome = Renamer::new()
            .rename_file(&source, &dest, RenameType::Copy)
            .unwrap();

        assert_eq!(outcome, RenameOutcome::Done);
        assert!(source.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"pixels");
        let copied = fs::metadata(&dest).unwrap().modified().unwrap();
        let delta = copied
            .duration_since(old)
            .unwrap_or_else(|e| e.duration());
        assert!(delta < Duration::from_secs(2));
    }

    #[test]
    fn test_move_removes_source() {
        let (dir, source) = setup();
        let dest = dir.path().join("moved.jpg");
        let outcome = Renamer::new()
            .rename_file(&source, &dest, RenameType::Move)
            .unwrap();

        assert_eq!(outcome, RenameOutcome::Done);
        assert!(!source.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"pixels");
    }

    #[test]
    fn test_none_is_a_no_op() {
        let (dir, source) = setup();
        let dest = dir.path().join("never.jpg");
        let outcome = Renamer::new()
            .rename_file(&source, &dest, RenameType::None)
            .unwrap();

        assert_eq!(outcome, RenameOutcome::Disabled);
        assert!(source.exists());
        assert!(!dest.exists());
    }

    #[test]
    fn test_existing_destination_is_not_overwritten() {
        let (dir, source) = setup();
        let dest = dir.path().join("taken.jpg");
        fs::write(&dest, b"original").unwrap();

        for mode in [RenameType::Copy, RenameType::Move] {
            let outcome = Renamer::new().rename_file(&source, &dest, mode).unwrap();
            assert_eq!(outcome, RenameOutcome::Skipped(SkipReason::DestinationExists));
            assert_eq!(fs::read(&dest).unwrap(), b"original");
            assert!(source.exists());
        }
    }

    #[test]
    fn test_missing_source_and_directory() {
        let (dir, source) = setup();
        let renamer = Renamer::new();

        let missing = dir.path().join("missing.jpg");
        for mode in [RenameType::Copy, RenameType::Move] {
            let outcome = renamer
                .rename_file(&missing, &dir.path().join("out.jpg"), mode)
                .unwrap();
            assert_eq!(outcome, RenameOutcome::Skipped(SkipReason::SourceNotFound));
        }

        let no_dir = dir.path().join("2020").join("01").join("a.jpg");
        for mode in [RenameType::Copy, RenameType::Move] {
            let outcome = renamer.rename_file(&source, &no_dir, mode).unwrap();
            assert_eq!(
                outcome,
                RenameOutcome::Skipped(SkipReason::DestinationDirectoryNotFound)
            );
        }
    }

    #[test]
    fn test_empty_and_invalid_paths_are_skipped() {
        let (dir, source) = setup();
        let renamer = Renamer::new();

        assert_eq!(
            renamer
                .rename_file(Path::new(""), &dir.path().join("a.jpg"), RenameType::Copy)
                .unwrap(),
            RenameOutcome::Skipped(SkipReason::EmptyPath)
        );
        assert_eq!(
            renamer
                .rename_file(&source, &dir.path().join("bad\0name.jpg"), RenameType::Copy)
                .unwrap(),
            RenameOutcome::Skipped(SkipReason::InvalidPath)
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_path_too_long_is_fatal() {
        let (dir, source) = setup();
        let dest = dir.path().join("x".repeat(4096));
        let err = Renamer::new()
            .rename_file(&source, &dest, RenameType::Copy)
            .unwrap_err();
        assert!(matches!(err, Error::PathTooLong { .. }));
        assert!(err.is_fatal());
    }
}
