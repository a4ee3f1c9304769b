use chrono::{DateTime, Local};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

use crate::config::ResolvedConfig;
use crate::error::{Result, UploadError};
use crate::s3::ObjectStore;
use crate::strategy::{select_strategy, UploadStrategy, MULTIPART_THRESHOLD};
use crate::upload_log::UploadLog;
use crate::walk::{derive_key, walk};

/// What to upload and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub source_path: PathBuf,
    pub bucket: String,
    /// Object key for a single file, key prefix for a directory
    pub destination: String,
    pub presign_requested: bool,
    pub is_directory: bool,
}

impl UploadRequest {
    /// Build a request from resolved options, probing the source path
    ///
    /// A file defaults to its base name as key, a directory to an empty prefix.
    pub fn from_config(config: &ResolvedConfig) -> Result<Self> {
        let metadata = std::fs::metadata(&config.file)
            .map_err(|e| UploadError::path(&config.file, e))?;
        let is_directory = metadata.is_dir();

        let destination = match (&config.key, is_directory) {
            (Some(key), _) => key.clone(),
            (None, true) => String::new(),
            (None, false) => config
                .file
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .ok_or_else(|| {
                    UploadError::path(
                        &config.file,
                        std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"),
                    )
                })?,
        };

        Ok(Self {
            source_path: config.file.clone(),
            bucket: config.bucket.clone(),
            destination,
            presign_requested: config.presign && !is_directory,
            is_directory,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Success,
    Failure,
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// Record of one upload attempt
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub strategy: UploadStrategy,
    pub status: UploadStatus,
    /// Human readable status, embeds the error on failure
    pub detail: String,
    pub timestamp: DateTime<Local>,
}

impl UploadOutcome {
    fn success(path: &Path, size_bytes: u64, strategy: UploadStrategy) -> Self {
        let detail = match strategy {
            UploadStrategy::Simple => "Upload Successful".to_string(),
            UploadStrategy::Multipart => "Multipart Upload Successful".to_string(),
        };
        Self::new(path, size_bytes, strategy, UploadStatus::Success, detail)
    }

    fn failure(path: &Path, size_bytes: u64, strategy: UploadStrategy, err: &anyhow::Error) -> Self {
        let detail = match strategy {
            UploadStrategy::Simple => format!("Upload Failed: {:#}", err),
            UploadStrategy::Multipart => format!("Multipart Upload Failed: {:#}", err),
        };
        Self::new(path, size_bytes, strategy, UploadStatus::Failure, detail)
    }

    fn new(
        path: &Path,
        size_bytes: u64,
        strategy: UploadStrategy,
        status: UploadStatus,
        detail: String,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            size_bytes,
            strategy,
            status,
            detail,
            timestamp: Local::now(),
        }
    }
}

/// Drives uploads against an [`ObjectStore`], recording every attempt in an [`UploadLog`]
pub struct Uploader<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    log: &'a UploadLog,
}

impl<'a, S: ObjectStore + ?Sized> Uploader<'a, S> {
    pub fn new(store: &'a S, log: &'a UploadLog) -> Self {
        Self { store, log }
    }

    /// Upload one file, choosing simple or multipart upload by size
    ///
    /// Exactly one outcome line is logged per transfer attempt. A failed
    /// transfer is logged first and then returned as [`UploadError::Transfer`].
    pub async fn upload_single(&self, path: &Path, bucket: &str, key: &str) -> Result<UploadOutcome> {
        let size_bytes = tokio::fs::metadata(path)
            .await
            .map_err(|e| UploadError::path(path, e))?
            .len();
        let strategy = select_strategy(size_bytes);

        info!(
            "Uploading {} ({} bytes, {}) -> s3://{}/{}",
            path.display(),
            size_bytes,
            strategy,
            bucket,
            key
        );

        let result = match strategy {
            UploadStrategy::Simple => self.store.put_object(path, bucket, key).await,
            UploadStrategy::Multipart => {
                self.store
                    .put_object_multipart(path, bucket, key, MULTIPART_THRESHOLD)
                    .await
            }
        };

        match result {
            Ok(()) => {
                let outcome = UploadOutcome::success(path, size_bytes, strategy);
                self.log.record(&outcome)?;
                info!("{} {}: {}", outcome.status, path.display(), outcome.detail);
                Ok(outcome)
            }
            Err(source) => {
                let outcome = UploadOutcome::failure(path, size_bytes, strategy, &source);
                self.log.record(&outcome)?;
                error!("{} {}: {}", outcome.status, path.display(), outcome.detail);
                Err(UploadError::Transfer {
                    outcome: Box::new(outcome),
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    source,
                })
            }
        }
    }

    /// Upload every regular file under `root`, one at a time in walk order
    ///
    /// Keys are `prefix` joined with each file's path relative to `root`.
    /// Stops at the first failure; files after it are not attempted.
    pub async fn upload_directory(
        &self,
        root: &Path,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<UploadOutcome>> {
        let mut outcomes = Vec::new();

        for file in walk(root)? {
            let file = file?;
            let key = derive_key(root, &file, prefix)?;
            outcomes.push(self.upload_single(&file, bucket, &key).await?);
        }

        info!(
            "Uploaded {} file(s) from {} to s3://{}/{}",
            outcomes.len(),
            root.display(),
            bucket,
            prefix
        );

        Ok(outcomes)
    }

    /// Create a pre-signed download URL for an uploaded object
    pub async fn presign_download(&self, bucket: &str, key: &str, expires_in: Duration) -> Result<String> {
        self.store
            .presign_get(bucket, key, expires_in)
            .await
            .map_err(|source| UploadError::Presign {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source,
            })
    }

    /// Run a whole request: directory or single file upload
    pub async fn run(&self, request: &UploadRequest) -> Result<Vec<UploadOutcome>> {
        if request.is_directory {
            self.upload_directory(&request.source_path, &request.bucket, &request.destination)
                .await
        } else {
            let outcome = self
                .upload_single(&request.source_path, &request.bucket, &request.destination)
                .await?;
            Ok(vec![outcome])
        }
    }
}
