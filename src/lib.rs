//! Upload files and directory trees to S3.
//!
//! Files larger than [`strategy::MULTIPART_THRESHOLD`] are sent with a multipart
//! upload, everything else with a single PUT. Each attempt is recorded in an
//! append-only [`upload_log::UploadLog`].

pub mod config;
pub mod error;
pub mod s3;
pub mod strategy;
pub mod upload_log;
pub mod uploader;
pub mod walk;

pub use config::{merge, ResolvedConfig, UploadOptions};
pub use error::UploadError;
pub use s3::{ObjectStore, S3Client};
pub use strategy::{select_strategy, UploadStrategy, MULTIPART_THRESHOLD};
pub use upload_log::UploadLog;
pub use uploader::{UploadOutcome, UploadRequest, UploadStatus, Uploader};
pub use walk::{derive_key, walk};
