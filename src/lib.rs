//! Photo Organizer - sorts photos into a year/month archive
//!
//! This library provides:
//! - A decoder for raw EXIF/TIFF tag buffers and GPS coordinates
//! - Metadata extraction into a flat per-photo record
//! - Content checksums (MD5, SHA family, xxHash3)
//! - Breadth-first photo discovery by content sniffing
//! - Sorting into `YYYY/MM` buckets with an `unknown` fallback
//! - A JSON record store keyed by file name

pub mod cli;
pub mod config;
pub mod discover;
pub mod error;
pub mod hash;
pub mod metadata;
pub mod os;
pub mod photo;
pub mod process;
pub mod rename;
pub mod sort;
pub mod store;
pub mod time;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use cli::Cli;
pub use config::{Config, ConfigError, HashAlgorithm, RenameType};
pub use error::{Error, Result};
pub use photo::PhotoRecord;
pub use process::{Organizer, ProcessingStats};
pub use sort::{OutputDirectoryIndex, SortOutcome, Sorter};
pub use store::RecordStore;
