//! Sorting photos into the `year/month` output tree
//!
//! The output root is scanned once for existing buckets. A photo whose
//! capture time parses against the configured format goes to
//! `<root>/<YYYY>/<MM>/<timestamp><ext>`; anything else goes to
//! `<root>/unknown/<original name>`.

use crate::config::RenameType;
use crate::error::{Error, Result};
use crate::photo::PhotoRecord;
use crate::rename::{Rename, RenameOutcome, Renamer};
use crate::time;
use chrono::Datelike;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, Span, debug, info, span, trace, warn};
use walkdir::WalkDir;

/// Bucket for photos without a usable capture time
pub const UNKNOWN_DIR: &str = "unknown";

/// Year/month directories known to exist under the output root.
///
/// A pair present here exists on disk. A missing pair may still exist if it
/// was created behind our back, so creation must treat "already there" as
/// success.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OutputDirectoryIndex {
    buckets: BTreeMap<String, BTreeSet<String>>,
}

impl OutputDirectoryIndex {
    /// Build the index from the directories under `root`
    pub fn scan(root: &Path) -> Self {
        let mut index = Self::default();

        for year_dir in subdirectories(root) {
            let Some(year) = dir_name(&year_dir).filter(|name| is_year(name)) else {
                continue;
            };
            for month_dir in subdirectories(&year_dir) {
                let Some(name) = dir_name(&month_dir) else {
                    continue;
                };
                match month_key(&name) {
                    Some(month) if month == name => {
                        index.insert(&year, &month);
                    }
                    Some(_) => debug!(path = ?month_dir, "Ignoring non-canonical month directory"),
                    None => {}
                }
            }
        }

        trace!(?root, years = index.buckets.len(), "Scanned output directory");
        index
    }

    pub fn contains(&self, year: &str, month: &str) -> bool {
        self.buckets
            .get(year)
            .is_some_and(|months| months.contains(month))
    }

    /// Record a bucket, returning whether it was new
    pub fn insert(&mut self, year: &str, month: &str) -> bool {
        self.buckets
            .entry(year.to_string())
            .or_default()
            .insert(month.to_string())
    }

    /// Number of year/month pairs
    pub fn len(&self) -> usize {
        self.buckets.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Months known for `year`
    #[cfg(test)]
    pub(crate) fn months(&self, year: &str) -> impl Iterator<Item = &str> {
        self.buckets
            .get(year)
            .into_iter()
            .flat_map(|months| months.iter().map(String::as_str))
    }
}

fn subdirectories(dir: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .map(walkdir::DirEntry::into_path)
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name()?.to_str().map(str::to_string)
}

/// Four digits naming a year chrono can represent
fn is_year(name: &str) -> bool {
    name.len() == 4 && name.parse::<u16>().is_ok_and(|year| (1..=9999).contains(&year))
}

/// Zero-padded index key for a month directory name
fn month_key(name: &str) -> Option<String> {
    name.parse::<u8>()
        .ok()
        .filter(|month| (1..=12).contains(month))
        .map(|month| format!("{:02}", month))
}

/// What happened to one photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortOutcome {
    /// Sent to its year/month bucket
    Sorted {
        destination: PathBuf,
        rename: RenameOutcome,
    },
    /// Sent to the unknown bucket
    Unknown {
        destination: PathBuf,
        rename: RenameOutcome,
    },
    /// Left where it was because no destination could be prepared
    Untouched,
    /// The rename type is `None`
    Disabled,
}

/// Sort/rename engine for one output root
#[derive(Debug)]
pub struct Sorter<R: Rename = Renamer> {
    output_root: PathBuf,
    rename_type: RenameType,
    renamer: R,
    index: OutputDirectoryIndex,
    unknown_dir: Option<PathBuf>,
    span: Span,
}

impl Sorter<Renamer> {
    pub fn new(output_root: &Path, rename_type: RenameType) -> Result<Self> {
        Self::with_renamer(output_root, rename_type, Renamer::new())
    }
}

impl<R: Rename> Sorter<R> {
    /// Prepare the output root and scan it for existing buckets.
    ///
    /// Fails only when the output root itself cannot be created. The unknown
    /// bucket is created unless renaming is disabled; if that fails, undated
    /// photos are left untouched.
    pub fn with_renamer(output_root: &Path, rename_type: RenameType, renamer: R) -> Result<Self> {
        let span = span!(Level::INFO, "sorter", output = ?output_root);
        let _enter = span.enter();

        fs::create_dir_all(output_root).map_err(|e| Error::OutputRoot {
            path: output_root.to_path_buf(),
            source: e,
        })?;

        let index = OutputDirectoryIndex::scan(output_root);

        let unknown_dir = if rename_type == RenameType::None {
            None
        } else {
            let dir = output_root.join(UNKNOWN_DIR);
            match fs::create_dir_all(&dir) {
                Ok(()) => Some(dir),
                Err(e) => {
                    warn!(?dir, error = %e, "Cannot create unknown directory, undated photos stay in place");
                    None
                }
            }
        };

        info!(buckets = index.len(), ?rename_type, "Sorter ready");
        drop(_enter);

        Ok(Self {
            output_root: output_root.to_path_buf(),
            rename_type,
            renamer,
            index,
            unknown_dir,
            span,
        })
    }

    pub fn index(&self) -> &OutputDirectoryIndex {
        &self.index
    }

    pub fn unknown_dir(&self) -> Option<&Path> {
        self.unknown_dir.as_deref()
    }

    pub fn renamer(&self) -> &R {
        &self.renamer
    }

    /// Sort a photo by its original capture time.
    ///
    /// A photo without one is sorted with an empty timestamp, which never
    /// parses and so lands in the unknown bucket.
    pub fn sort_photo(&mut self, record: &PhotoRecord, format: &str) -> Result<SortOutcome> {
        let timestamp = match &record.date_time_original {
            Some(taken) => time::format_datetime(taken, format)?,
            None => String::new(),
        };
        self.sort_date_time(&record.file_path(), &timestamp, format)
    }

    /// Sort `source` using `date_time`, a timestamp rendered with `format`
    pub fn sort_date_time(
        &mut self,
        source: &Path,
        date_time: &str,
        format: &str,
    ) -> Result<SortOutcome> {
        let span = self.span.clone();
        let _enter = span.enter();

        if self.rename_type == RenameType::None {
            return Ok(SortOutcome::Disabled);
        }

        let Some(taken) = time::parse_exact(date_time, format)? else {
            return self.sort_unknown(source);
        };

        let year = format!("{:04}", taken.year());
        let month = format!("{:02}", taken.month());
        let bucket = self.output_root.join(&year).join(&month);

        if !self.index.contains(&year, &month) {
            if let Err(e) = fs::create_dir_all(&bucket) {
                warn!(?source, ?bucket, error = %e, "Cannot create bucket, leaving file untouched");
                return Ok(SortOutcome::Untouched);
            }
            debug!(?bucket, "Created bucket");
            self.index.insert(&year, &month);
        }

        let mut name = date_time.to_string();
        if let Some(ext) = source.extension() {
            name.push('.');
            name.push_str(&ext.to_string_lossy());
        }
        let destination = bucket.join(name);

        let rename = self
            .renamer
            .rename_file(source, &destination, self.rename_type)?;
        Ok(SortOutcome::Sorted {
            destination,
            rename,
        })
    }

    fn sort_unknown(&self, source: &Path) -> Result<SortOutcome> {
        let (Some(dir), Some(name)) = (&self.unknown_dir, source.file_name()) else {
            warn!(?source, "No capture time and no unknown directory, leaving file untouched");
            return Ok(SortOutcome::Untouched);
        };

        let destination = dir.join(name);
        let rename = self
            .renamer
            .rename_file(source, &destination, self.rename_type)?;
        Ok(SortOutcome::Unknown {
            destination,
            rename,
        })
    }
}
