use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Storage primitives the uploader is built on
///
/// Implemented by [`super::S3Client`] for AWS S3, and by in-memory doubles in tests.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload the whole file in a single request
    async fn put_object(&self, local_path: &Path, bucket: &str, key: &str) -> Result<()>;

    /// Upload the file with a multipart upload when it is larger than `threshold`
    async fn put_object_multipart(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
        threshold: u64,
    ) -> Result<()>;

    /// Create a pre-signed GET URL valid for `expires_in`
    async fn presign_get(&self, bucket: &str, key: &str, expires_in: Duration) -> Result<String>;
}
