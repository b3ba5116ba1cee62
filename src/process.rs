//! The organizer pipeline
//!
//! Runs sequentially over the discovered photos: checksum, metadata, sort,
//! then the record store. A file's handle is closed before it is renamed.

use crate::config::Config;
use crate::discover::find_photos;
use crate::error::{Error, Result};
use crate::hash::Checksum;
use crate::metadata::{parse, read_groups};
use crate::photo::PhotoRecord;
use crate::rename::RenameOutcome;
use crate::sort::{SortOutcome, Sorter};
use crate::store::RecordStore;
use crate::time;
use std::fs::File;
use std::io::BufReader;
use tracing::{Level, debug, error, info, span, warn};

/// Processing statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    /// Photos taken from discovery
    pub processed: usize,
    /// Placed in a year/month bucket
    pub sorted: usize,
    /// Placed in the unknown bucket
    pub unknown: usize,
    /// Left in place by a skipped rename or missing bucket
    pub untouched: usize,
    /// Abandoned because of a per-file error
    pub failed: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> String {
        format!(
            "Processed: {}, Sorted: {}, Unknown: {}, Untouched: {}, Failed: {}",
            self.processed, self.sorted, self.unknown, self.untouched, self.failed
        )
    }

    fn record(&mut self, outcome: &SortOutcome) {
        match outcome {
            SortOutcome::Sorted {
                rename: RenameOutcome::Done,
                ..
            } => self.sorted += 1,
            SortOutcome::Unknown {
                rename: RenameOutcome::Done,
                ..
            } => self.unknown += 1,
            SortOutcome::Disabled => {}
            _ => self.untouched += 1,
        }
    }
}

/// Sorts one input tree into one output tree
pub struct Organizer {
    config: Config,
    checksum: Checksum,
    sorter: Sorter,
    store: Option<RecordStore>,
    stats: ProcessingStats,
}

impl Organizer {
    /// Create an organizer for the given configuration.
    ///
    /// Checks the date-time format, prepares the output root and loads the
    /// record store, any of which aborts the run on failure.
    pub fn new(config: Config) -> Result<Self> {
        time::validate_format(&config.datetime_format)?;

        let sorter = Sorter::new(&config.output_dir, config.rename_type)?;

        let store = if config.no_database {
            debug!("Record store disabled");
            None
        } else {
            Some(RecordStore::load(&config.get_database())?)
        };

        Ok(Self {
            checksum: Checksum::new(config.hash_algorithm),
            config,
            sorter,
            store,
            stats: ProcessingStats::new(),
        })
    }

    /// Process every photo under the input directory.
    ///
    /// Per-file failures are logged and counted; a fatal error stops the run
    /// after saving the records gathered so far.
    pub fn run(&mut self) -> Result<&ProcessingStats> {
        let _span = span!(Level::INFO, "organizer_run").entered();

        let input = self.config.input_dir.clone();
        if !input.is_dir() {
            return Err(Error::InputNotFound { path: input });
        }

        info!(?input, output = ?self.config.output_dir, "Organizing photos");

        for record in find_photos(&input) {
            self.stats.processed += 1;
            let path = record.file_path();

            match self.process_file(record) {
                Ok(outcome) => {
                    debug!(?path, ?outcome, "Processed file");
                    self.stats.record(&outcome);
                }
                Err(e) if e.is_fatal() => {
                    error!(?path, error = %e, "Aborting run");
                    if let Err(save_error) = self.save_store() {
                        warn!(error = %save_error, "Failed to save record store");
                    }
                    return Err(e);
                }
                Err(e) => {
                    warn!(?path, error = %e, "Failed to process file");
                    self.stats.failed += 1;
                }
            }
        }

        self.save_store()?;
        info!(summary = %self.stats.summary(), "Run complete");
        Ok(&self.stats)
    }

    fn process_file(&mut self, mut record: PhotoRecord) -> Result<SortOutcome> {
        let path = record.file_path();
        let _file_span = span!(Level::DEBUG, "process_file", ?path).entered();

        {
            let mut reader = BufReader::new(File::open(&path)?);

            let checksum = self
                .checksum
                .compute(&mut reader)
                .map_err(|e| Error::Checksum {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
            if let Some(checksum) = checksum {
                record.checksum = checksum;
                record.checksum_algorithm = self.checksum.algorithm().name().to_string();
            }

            let groups = read_groups(&mut reader, &path)?;
            parse(&mut record, &groups)?;
        }

        let outcome = self
            .sorter
            .sort_photo(&record, &self.config.datetime_format)?;

        if let Some(store) = &mut self.store
            && store.upsert(record)
        {
            debug!(?path, "Added record");
        }

        Ok(outcome)
    }

    fn save_store(&mut self) -> Result<()> {
        match &mut self.store {
            Some(store) => store.save(&self.config.get_database()),
            None => Ok(()),
        }
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    pub fn store(&self) -> Option<&RecordStore> {
        self.store.as_ref()
    }

    pub fn sorter(&self) -> &Sorter {
        &self.sorter
    }
}
