//! Typed errors for the store and configuration boundaries.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a backing store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store file could not be read or written.
    #[error("Store I/O failed for {path}: {source}")]
    Io {
        /// Store file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The store file exists but does not contain a valid store.
    #[error("Store file {path} is corrupt: {source}")]
    Corrupt {
        /// Store file path.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory state could not be serialized.
    #[error("Failed to serialize store: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors raised while loading settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Home directory could not be determined.
    #[error("Failed to determine home directory")]
    HomeDirNotFound,

    /// Settings file could not be read.
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        /// Settings file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Settings file could not be parsed.
    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        /// Settings file path.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A profile entry is invalid.
    #[error("Invalid profile '{id}': {reason}")]
    InvalidProfile {
        /// Profile identifier.
        id: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A numeric setting is out of range.
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting {
        /// Setting key as written in the file.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}
