use anyhow::{Context, Result};
use aws_sdk_s3::{
    primitives::ByteStream,
    types::{CompletedMultipartUpload, CompletedPart},
    Client,
};
use indicatif::ProgressBar;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

// Size of each part (10MB) - AWS minimum is 5MB
const PART_SIZE: u64 = 10 * 1024 * 1024;

// AWS allows at most 10,000 parts per upload
const MAX_PARTS: u64 = 10_000;

/// Part size for a file of `file_size` bytes, grown so the upload fits in [`MAX_PARTS`]
pub fn part_size_for(file_size: u64) -> u64 {
    PART_SIZE.max(file_size.div_ceil(MAX_PARTS))
}

/// Upload a large file using S3 multipart upload
///
/// The upload is aborted on S3 if any part or the completion fails, so no
/// orphaned parts are left behind.
///
/// # Arguments
///
/// * `client` - AWS S3 client
/// * `bucket` - S3 bucket name
/// * `s3_key` - S3 object key (path)
/// * `local_path` - Path to local file
/// * `pb` - Optional progress bar
pub async fn upload_multipart(
    client: &Client,
    bucket: &str,
    s3_key: &str,
    local_path: &Path,
    pb: Option<&ProgressBar>,
) -> Result<()> {
    let metadata = tokio::fs::metadata(local_path)
        .await
        .context("Failed to get file metadata")?;
    let file_size = metadata.len();
    let part_size = part_size_for(file_size);

    info!(
        "Starting multipart upload for {} ({} bytes, {} parts)",
        local_path.display(),
        file_size,
        file_size.div_ceil(part_size)
    );

    let multipart = client
        .create_multipart_upload()
        .bucket(bucket)
        .key(s3_key)
        .send()
        .await
        .context("Failed to initiate multipart upload")?;

    let upload_id = multipart
        .upload_id()
        .context("No upload ID returned from S3")?;

    debug!("Multipart upload initiated with ID: {}", upload_id);

    if let Some(pb) = pb {
        pb.set_length(file_size);
        pb.set_position(0);
        pb.set_message(format!("Multipart upload {}", local_path.display()));
    }

    let result = upload_parts(client, bucket, s3_key, upload_id, local_path, part_size, pb).await;

    if let Err(e) = result {
        if let Err(abort_err) = abort_multipart_upload(client, bucket, s3_key, upload_id).await {
            warn!(
                "Could not abort multipart upload {} for s3://{}/{}: {:#}",
                upload_id, bucket, s3_key, abort_err
            );
        }
        return Err(e);
    }

    info!(
        "Successfully completed multipart upload: {} -> s3://{}/{}",
        local_path.display(),
        bucket,
        s3_key
    );

    Ok(())
}

async fn upload_parts(
    client: &Client,
    bucket: &str,
    s3_key: &str,
    upload_id: &str,
    local_path: &Path,
    part_size: u64,
    pb: Option<&ProgressBar>,
) -> Result<()> {
    let mut file = tokio::fs::File::open(local_path)
        .await
        .context("Failed to open local file")?;
    let mut parts = Vec::new();
    let mut part_number = 1i32;
    let mut uploaded_bytes = 0u64;

    loop {
        let mut buffer = Vec::with_capacity(part_size as usize);
        let bytes_read = (&mut file)
            .take(part_size)
            .read_to_end(&mut buffer)
            .await
            .with_context(|| format!("Failed to read part {}", part_number))?;

        if bytes_read == 0 {
            break; // EOF
        }

        debug!("Uploading part {} ({} bytes)", part_number, bytes_read);

        let part_result = client
            .upload_part()
            .bucket(bucket)
            .key(s3_key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(buffer))
            .send()
            .await
            .with_context(|| format!("Failed to upload part {}", part_number))?;

        parts.push(
            CompletedPart::builder()
                .part_number(part_number)
                .e_tag(part_result.e_tag().unwrap_or(""))
                .build(),
        );

        uploaded_bytes += bytes_read as u64;
        if let Some(pb) = pb {
            pb.set_position(uploaded_bytes);
        }

        part_number += 1;
    }

    debug!(
        "All {} parts uploaded, completing multipart upload",
        parts.len()
    );

    let completed_multipart = CompletedMultipartUpload::builder()
        .set_parts(Some(parts))
        .build();

    client
        .complete_multipart_upload()
        .bucket(bucket)
        .key(s3_key)
        .upload_id(upload_id)
        .multipart_upload(completed_multipart)
        .send()
        .await
        .context("Failed to complete multipart upload")?;

    Ok(())
}

/// Abort a multipart upload (for cleanup on error)
pub async fn abort_multipart_upload(
    client: &Client,
    bucket: &str,
    s3_key: &str,
    upload_id: &str,
) -> Result<()> {
    client
        .abort_multipart_upload()
        .bucket(bucket)
        .key(s3_key)
        .upload_id(upload_id)
        .send()
        .await
        .context("Failed to abort multipart upload")?;

    debug!("Aborted multipart upload {}", upload_id);

    Ok(())
}
