use std::path::PathBuf;

use thiserror::Error;

/// Error type for every provisioning, scanning and harvesting operation
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Invalid or inconsistent configuration, detected before any service call
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure talking to the analysis service
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The analysis service answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The scanner process could not be started
    #[error("Scan error: {0}")]
    Scan(String),

    /// The scanner process ran but exited unsuccessfully
    #[error("Scan failed with exit code {code:?}: {stderr}")]
    ScanFailed { code: Option<i32>, stderr: String },

    /// The source path handed to the scanner does not exist
    #[error("Invalid path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// File read error
    #[error("File read error: {0}")]
    FileRead(String),

    /// File write error
    #[error("File write error: {0}")]
    FileWrite(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HarvestError {
    /// Errors raised by the analysis service or the scanner process.
    pub fn is_collaborator(&self) -> bool {
        matches!(
            self,
            HarvestError::Http(_)
                | HarvestError::Api { .. }
                | HarvestError::Scan(_)
                | HarvestError::ScanFailed { .. }
        )
    }

    /// Whether the error must abort the whole run.
    ///
    /// Only a missing source path is recoverable: the scan for that project
    /// is skipped and processing continues.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, HarvestError::InvalidPath(_))
    }
}

/// Result type for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;
