//! Photo discovery
//!
//! Breadth-first walk over the input tree. Directories are expanded one at a
//! time from a work queue and every regular file is sniffed by content, so a
//! photo with a wrong or missing extension is still found.

use crate::photo::PhotoRecord;
use std::collections::VecDeque;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// Bytes read from each file to recognise its container
const SNIFF_LEN: u64 = 32;

/// Lazily enumerate the photos below `root`.
///
/// A missing root gives an empty sequence.
pub fn find_photos(root: &Path) -> PhotoFinder {
    let mut queue = VecDeque::new();
    if root.is_dir() {
        queue.push_back(root.to_path_buf());
    } else {
        debug!(?root, "Input root is not a directory, nothing to discover");
    }
    PhotoFinder {
        queue,
        files: VecDeque::new(),
    }
}

/// Iterator returned by [`find_photos`]
#[derive(Debug)]
pub struct PhotoFinder {
    queue: VecDeque<PathBuf>,
    files: VecDeque<PathBuf>,
}

impl PhotoFinder {
    fn expand(&mut self, dir: &Path) {
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_dir() => {
                    self.queue.push_back(entry.into_path());
                }
                Ok(entry) if entry.file_type().is_file() => {
                    self.files.push_back(entry.into_path());
                }
                Ok(entry) => trace!(path = ?entry.path(), "Skipping non-regular entry"),
                Err(e) => warn!(?dir, error = %e, "Failed to read directory entry"),
            }
        }
    }
}

impl Iterator for PhotoFinder {
    type Item = PhotoRecord;

    fn next(&mut self) -> Option<PhotoRecord> {
        loop {
            if let Some(path) = self.files.pop_front() {
                if is_photo(&path) {
                    return Some(PhotoRecord::new(&path));
                }
                trace!(?path, "Not a recognised image, skipping");
                continue;
            }

            let dir = self.queue.pop_front()?;
            self.expand(&dir);
        }
    }
}

/// Whether the file content starts with a known image signature
pub fn is_photo(path: &Path) -> bool {
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    let read = File::open(path).and_then(|file| file.take(SNIFF_LEN).read_to_end(&mut head));
    if let Err(e) = read {
        debug!(?path, error = %e, "Could not read file header");
        return false;
    }
    image::guess_format(&head).is_ok()
}
