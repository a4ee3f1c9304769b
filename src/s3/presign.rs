use anyhow::Result;
use aws_sdk_s3::{presigning::PresigningConfig, Client};
use std::time::Duration;
use tracing::warn;

/// Default lifetime of a pre-signed URL (1 hour)
pub const DEFAULT_PRESIGN_TTL: Duration = Duration::from_secs(3600);

/// AWS presigned URL max is 7 days
pub const MAX_PRESIGN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Generate a pre-signed GET URL with custom expiration
///
/// # Notes
///
/// Expirations longer than 7 days are capped at 7 days. A zero expiration is an error.
pub async fn generate_presigned_url(
    client: &Client,
    bucket: &str,
    s3_key: &str,
    expires_in: Duration,
) -> Result<String> {
    if expires_in.is_zero() {
        anyhow::bail!("Pre-signed URL expiration must be greater than zero");
    }

    let expires_in = if expires_in > MAX_PRESIGN_TTL {
        warn!(
            "Pre-signed URL expiration of {}s exceeds the AWS limit, capping at {}s",
            expires_in.as_secs(),
            MAX_PRESIGN_TTL.as_secs()
        );
        MAX_PRESIGN_TTL
    } else {
        expires_in
    };

    let presigning_config = PresigningConfig::expires_in(expires_in)?;

    let presigned_request = client
        .get_object()
        .bucket(bucket)
        .key(s3_key)
        .presigned(presigning_config)
        .await?;

    Ok(presigned_request.uri().to_string())
}
