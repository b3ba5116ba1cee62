//! Error types for the photo organizer

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for photo organizer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the photo organizer
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input directory {path} does not exist")]
    InputNotFound { path: PathBuf },

    #[error("Output directory {path} cannot be established: {source}")]
    OutputRoot {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read metadata from {path}: {message}")]
    MetadataRead { path: PathBuf, message: String },

    #[error("Invalid GPS reference '{0}', expected one of N, E, S, W")]
    InvalidGpsReference(String),

    #[error("Checksum computation failed for {path}: {message}")]
    Checksum { path: PathBuf, message: String },

    #[error("Invalid date/time format string '{format}'")]
    InvalidDateTimeFormat { format: String },

    #[error("Permission denied for {path}: {source}")]
    PermissionDenied {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unsupported path operation on {path}: {source}")]
    Unsupported {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Path is too long: {path}")]
    PathTooLong { path: PathBuf },

    #[error("Record store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

impl Error {
    /// Whether the error should abort the whole run rather than skip one file
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::InputNotFound { .. }
                | Error::OutputRoot { .. }
                | Error::InvalidDateTimeFormat { .. }
                | Error::PermissionDenied { .. }
                | Error::Unsupported { .. }
                | Error::PathTooLong { .. }
                | Error::Store(_)
                | Error::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let denied = Error::PermissionDenied {
            path: PathBuf::from("/root/x"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(denied.is_fatal());
        assert!(
            Error::InvalidDateTimeFormat {
                format: "%Q".into()
            }
            .is_fatal()
        );

        assert!(!Error::InvalidGpsReference("A".into()).is_fatal());
        assert!(
            !Error::Checksum {
                path: PathBuf::from("a.jpg"),
                message: "unreadable".into()
            }
            .is_fatal()
        );
    }
}
