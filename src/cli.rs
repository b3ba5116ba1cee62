//! CLI argument parsing with clap

use crate::config::{Config, HashAlgorithm, RenameType};
use clap::Parser;
use std::path::PathBuf;

/// Photo Organizer - sort photos into year/month folders
///
/// Reads the capture time, camera and GPS data embedded in each photo,
/// checksums it, and copies or moves it to OUTPUT/YYYY/MM/. Photos without
/// a capture time go to OUTPUT/unknown/.
#[derive(Parser, Debug)]
#[command(name = "photo-organizer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file (TOML format)
    ///
    /// When specified, settings from the config file are used as defaults.
    /// CLI arguments will override config file settings.
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Write a commented sample configuration file and exit
    #[arg(long, value_name = "PATH")]
    pub init_config: Option<PathBuf>,

    /// Directory to scan for photos
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output directory for sorted photos
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// How photos reach the output directory
    #[arg(short, long, value_enum)]
    pub rename_type: Option<RenameType>,

    /// Checksum algorithm
    #[arg(short = 'H', long, value_enum)]
    pub hash_algorithm: Option<HashAlgorithm>,

    /// File name format for sorted photos (strftime syntax)
    #[arg(short = 'f', long)]
    pub datetime_format: Option<String>,

    /// Record store path (default: OUTPUT/photos.json)
    #[arg(short, long, env = "PHOTO_ORGANIZER_DATABASE")]
    pub database: Option<PathBuf>,

    /// Do not read or write the record store
    #[arg(long)]
    pub no_database: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output log format as JSON
    #[arg(long)]
    pub json_log: bool,

    /// Also write the log to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if let Some(ref input) = self.input {
            config.input_dir = input.clone();
        }
        if let Some(ref output) = self.output {
            config.output_dir = output.clone();
        }
        if let Some(rename_type) = self.rename_type {
            config.rename_type = rename_type;
        }
        if let Some(hash_algorithm) = self.hash_algorithm {
            config.hash_algorithm = hash_algorithm;
        }
        if let Some(ref format) = self.datetime_format {
            config.datetime_format = format.clone();
        }
        if let Some(ref database) = self.database {
            config.database = Some(database.clone());
        }
        if self.no_database {
            config.no_database = true;
        }
        if self.verbose {
            config.verbose = true;
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}
