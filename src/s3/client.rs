use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{primitives::ByteStream, Client};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::{multipart, presign, ObjectStore};

/// Whether a file of `file_size` bytes is sent as one PUT under a multipart `threshold`
pub fn fits_single_put(file_size: u64, threshold: u64) -> bool {
    file_size <= threshold
}

pub struct S3Client {
    client: Client,
    progress: bool,
}

impl S3Client {
    /// Load AWS configuration from the environment, optionally pinning a
    /// named profile and a region
    pub async fn new(profile: Option<&str>, region: Option<&str>, progress: bool) -> Result<Self> {
        let mut aws_config = aws_config::defaults(BehaviorVersion::latest());

        if let Some(profile) = profile {
            debug!("Using AWS profile {}", profile);
            aws_config = aws_config.profile_name(profile);
        }

        if let Some(region) = region {
            aws_config = aws_config.region(aws_config::Region::new(region.to_string()));
        }

        let sdk_config = aws_config.load().await;
        let client = Client::new(&sdk_config);

        Ok(Self { client, progress })
    }

    fn progress_bar(&self) -> Option<ProgressBar> {
        if !self.progress {
            return None;
        }

        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn put_object(&self, local_path: &Path, bucket: &str, key: &str) -> Result<()> {
        let file_size = tokio::fs::metadata(local_path)
            .await
            .context("Failed to get file metadata")?
            .len();

        let pb = self.progress_bar();
        if let Some(pb) = &pb {
            pb.set_length(file_size);
            pb.set_message(format!("Uploading {}", local_path.display()));
        }

        debug!(
            "PutObject {} ({} bytes) -> s3://{}/{}",
            local_path.display(),
            file_size,
            bucket,
            key
        );

        let body = ByteStream::from_path(local_path)
            .await
            .context("Failed to create byte stream from file")?;

        let result = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_length(file_size as i64)
            .send()
            .await
            .context("Failed to upload file to S3");

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        result.map(|_| ())
    }

    async fn put_object_multipart(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
        threshold: u64,
    ) -> Result<()> {
        let file_size = tokio::fs::metadata(local_path)
            .await
            .context("Failed to get file metadata")?
            .len();

        if fits_single_put(file_size, threshold) {
            debug!(
                "{} is {} bytes, not above {} - using a single PUT",
                local_path.display(),
                file_size,
                threshold
            );
            return self.put_object(local_path, bucket, key).await;
        }

        let pb = self.progress_bar();
        let result =
            multipart::upload_multipart(&self.client, bucket, key, local_path, pb.as_ref()).await;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        result
    }

    async fn presign_get(&self, bucket: &str, key: &str, expires_in: Duration) -> Result<String> {
        presign::generate_presigned_url(&self.client, bucket, key, expires_in).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::MULTIPART_THRESHOLD;

    #[test]
    fn test_single_put_at_or_below_threshold() {
        assert!(fits_single_put(0, MULTIPART_THRESHOLD));
        assert!(fits_single_put(MULTIPART_THRESHOLD, MULTIPART_THRESHOLD));
        assert!(!fits_single_put(MULTIPART_THRESHOLD + 1, MULTIPART_THRESHOLD));
    }

    #[test]
    fn test_single_put_with_custom_threshold() {
        assert!(fits_single_put(5, 8));
        assert!(!fits_single_put(9, 8));
    }
}
