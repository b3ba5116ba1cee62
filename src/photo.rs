//! The per-file record built up during a run

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything known about one discovered photo.
///
/// Metadata fields are filled at most once: the first group that supplies a
/// value wins and later values for the same field are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    /// File name, used as the record store key
    pub name: String,
    /// Directory containing the file
    pub directory_path: PathBuf,
    /// Lowercase hex digest, empty when checksums are disabled
    #[serde(default)]
    pub checksum: String,
    /// Name of the algorithm behind `checksum`
    #[serde(default)]
    pub checksum_algorithm: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude_reference: Option<String>,
    pub altitude: Option<f64>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub date_time: Option<NaiveDateTime>,
    pub date_time_original: Option<NaiveDateTime>,
    pub f_number: Option<f32>,
    pub iso: Option<u16>,
    pub shutter_speed: Option<String>,
    pub focal_length: Option<f32>,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

impl PhotoRecord {
    /// Create an empty record for the file at `path`
    pub fn new(path: &Path) -> Self {
        Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            directory_path: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Full path to the file
    pub fn file_path(&self) -> PathBuf {
        self.directory_path.join(&self.name)
    }
}

/// Store `value` in `slot` unless it already holds one
pub(crate) fn fill<T>(slot: &mut Option<T>, value: T) {
    if slot.is_none() {
        *slot = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_splits_path() {
        let record = PhotoRecord::new(Path::new("/photos/2020/IMG_0001.jpg"));
        assert_eq!(record.name, "IMG_0001.jpg");
        assert_eq!(record.directory_path, PathBuf::from("/photos/2020"));
        assert_eq!(record.file_path(), PathBuf::from("/photos/2020/IMG_0001.jpg"));
        assert!(record.date_time_original.is_none());
    }

    #[test]
    fn test_fill_first_writer_wins() {
        let mut slot = None;
        fill(&mut slot, "Canon");
        fill(&mut slot, "Nikon");
        assert_eq!(slot, Some("Canon"));
    }
}
