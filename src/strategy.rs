use std::fmt;

// Threshold for using multipart upload (100MB)
pub const MULTIPART_THRESHOLD: u64 = 100 * 1024 * 1024;

/// How a file of a given size is sent to S3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStrategy {
    /// Single PutObject request
    Simple,
    /// S3 multipart upload
    Multipart,
}

impl fmt::Display for UploadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::Multipart => write!(f, "multipart"),
        }
    }
}

/// Pick the upload strategy for a file of `size_bytes` bytes
///
/// Files strictly larger than [`MULTIPART_THRESHOLD`] go multipart.
pub fn select_strategy(size_bytes: u64) -> UploadStrategy {
    if size_bytes > MULTIPART_THRESHOLD {
        UploadStrategy::Multipart
    } else {
        UploadStrategy::Simple
    }
}
