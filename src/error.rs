//! Error types for the revision registry

use std::path::PathBuf;

use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Revision registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Extraction failed for {path}: {reason}")]
    Extraction { path: PathBuf, reason: String },

    #[error("{path}:{line}: {reason}")]
    Declaration {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
