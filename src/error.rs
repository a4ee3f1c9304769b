use std::path::PathBuf;
use thiserror::Error;

use crate::uploader::UploadOutcome;

/// Errors that can occur while uploading to S3
#[derive(Error, Debug)]
pub enum UploadError {
    /// Source path does not exist or cannot be read
    #[error("Cannot read {}: {source}", .path.display())]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The transfer primitive failed. The failure has already been written to the upload log.
    #[error("Failed to upload {} to s3://{bucket}/{key}", .outcome.path.display())]
    Transfer {
        outcome: Box<UploadOutcome>,
        bucket: String,
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Required options missing or config file unusable
    #[error("{0}")]
    Config(String),

    /// Pre-signed URL generation failed
    #[error("Failed to generate pre-signed URL for s3://{bucket}/{key}")]
    Presign {
        bucket: String,
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Appending to the upload log failed
    #[error("Failed to write upload log {}: {source}", .path.display())]
    Log {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl UploadError {
    /// Create a path error from an IO error
    pub fn path(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Path {
            path: path.into(),
            source,
        }
    }

    /// The outcome recorded for a failed transfer, if this is one
    pub fn outcome(&self) -> Option<&UploadOutcome> {
        match self {
            Self::Transfer { outcome, .. } => Some(outcome.as_ref()),
            _ => None,
        }
    }
}

/// Result type for upload operations
pub type Result<T> = std::result::Result<T, UploadError>;
