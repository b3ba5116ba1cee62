//! Configuration types for the photo organizer

use crate::time::DEFAULT_DATETIME_FORMAT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Digest used for the content checksum of each photo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Do not compute checksums
    None,
    #[default]
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
    /// 64-bit xxHash3, fast but not cryptographic
    Xxh3,
}

impl HashAlgorithm {
    /// Name stored alongside each checksum
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::None => "none",
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Xxh3 => "xxh3",
        }
    }

    /// Length of the hex digest, 0 for `None`
    pub fn hex_len(&self) -> usize {
        match self {
            HashAlgorithm::None => 0,
            HashAlgorithm::Md5 => 32,
            HashAlgorithm::Sha1 => 40,
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha384 => 96,
            HashAlgorithm::Sha512 => 128,
            HashAlgorithm::Xxh3 => 16,
        }
    }
}

/// How sorted files reach the output tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RenameType {
    /// Copy files, leaving the input untouched
    #[default]
    Copy,
    /// Move files out of the input tree
    Move,
    /// Only read metadata, never touch the files
    None,
}

/// Configuration for the photo organizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory scanned for photos
    #[serde(default)]
    pub input_dir: PathBuf,

    /// Root of the sorted `year/month` tree
    pub output_dir: PathBuf,

    pub hash_algorithm: HashAlgorithm,

    pub rename_type: RenameType,

    /// strftime-style format used for sorted file names
    pub datetime_format: String,

    /// Record store path
    pub database: Option<PathBuf>,

    /// Do not read or write the record store
    #[serde(default)]
    pub no_database: bool,

    /// Verbose output
    #[serde(default)]
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            output_dir: PathBuf::from("."),
            hash_algorithm: HashAlgorithm::default(),
            rename_type: RenameType::default(),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            database: None,
            no_database: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Get the record store path, using default if not specified
    pub fn get_database(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| self.output_dir.join("photos.json"))
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError { source: e })?;

        fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# Photo Organizer Configuration File
# This file uses TOML format (https://toml.io)

# Directory scanned (recursively) for photos
input_dir = "D:/Camera"

# Output directory; photos land in <output_dir>/YYYY/MM/
# and photos without a capture date in <output_dir>/unknown/
output_dir = "D:/Sorted"

# Checksum: "none", "md5", "sha1", "sha256", "sha384", "sha512" or "xxh3"
hash_algorithm = "md5"

# How files reach the output tree: "copy", "move" or "none"
# - none: only read metadata and fill the record store
rename_type = "copy"

# Name of sorted files, strftime syntax
# Default gives names like 20240115_143000.jpg
datetime_format = "%Y%m%d_%H%M%S"

# Record store (JSON), defaults to <output_dir>/photos.json
# database = "D:/Sorted/photos.json"

# Skip the record store entirely
no_database = false

# Verbose output
verbose = false
"#
        .to_string()
    }
}

/// Errors that can occur when loading or saving configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read configuration file
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse configuration file
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Failed to write configuration file
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to serialize configuration
    SerializeError { source: toml::ser::Error },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path.display(), source)
            }
            ConfigError::ParseError { path, source } => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), source)
            }
            ConfigError::WriteError { path, source } => {
                write!(f, "Failed to write config file '{}': {}", path.display(), source)
            }
            ConfigError::SerializeError { source } => {
                write!(f, "Failed to serialize config: {}", source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::WriteError { source, .. } => Some(source),
            ConfigError::SerializeError { source } => Some(source),
        }
    }
}
