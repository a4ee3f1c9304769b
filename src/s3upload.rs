use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;

use s3_push::{merge, S3Client, UploadLog, UploadOptions, UploadRequest, Uploader};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    name = "s3upload",
    version = env!("CARGO_PKG_VERSION"),
    about = "Upload a file or directory to S3 with automatic multipart uploads",
    long_about = "Upload a single file or a whole directory tree to an S3 bucket. Files larger than 100 MB \
                  are sent with a multipart upload. Every attempt is appended to an upload log, and a \
                  pre-signed download URL can be printed for single files.",
    after_help = "Examples:\n  \
                  s3upload --file ./video.mp4 --bucket my-bucket                # Key: video.mp4\n  \
                  s3upload --file ./video.mp4 --bucket my-bucket --presign      # Also print a 1 hour URL\n  \
                  s3upload --file ./data --bucket my-bucket --key backup        # Keys: backup/<relative path>\n  \
                  s3upload --config upload.yaml --profile prod                  # Options from a config file\n\n\
                  Config file (YAML, values override the command line):\n  \
                  file: ./data\n  \
                  bucket: my-bucket\n  \
                  key: backup\n  \
                  presign: false"
)]
struct Cli {
    /// File or directory to upload
    #[arg(long)]
    file: Option<PathBuf>,

    /// Destination bucket
    #[arg(long)]
    bucket: Option<String>,

    /// Object key (single file) or key prefix (directory)
    #[arg(long)]
    key: Option<String>,

    /// AWS profile to use
    #[arg(long)]
    profile: Option<String>,

    /// AWS region (defaults to the profile or environment region)
    #[arg(long)]
    region: Option<String>,

    /// YAML config file, its values take precedence over command line options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print a pre-signed download URL after uploading a single file
    #[arg(long)]
    presign: bool,

    /// Pre-signed URL expiration in seconds (default: 3600, max: 604800)
    #[arg(long)]
    expires_in: Option<u64>,

    /// Upload log file (default: upload.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Show transfer progress bars
    #[arg(long)]
    progress: bool,
}

impl Cli {
    fn options(&self) -> UploadOptions {
        UploadOptions {
            file: self.file.clone(),
            bucket: self.bucket.clone(),
            key: self.key.clone(),
            profile: self.profile.clone(),
            region: self.region.clone(),
            presign: self.presign.then_some(true),
            expires_in: self.expires_in,
            log_file: self.log_file.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file early to get LOG_LEVEL and AWS settings
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL")
        .ok()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let file_options = match &cli.config {
        Some(path) => UploadOptions::from_file(path)?,
        None => UploadOptions::default(),
    };
    let config = merge(cli.options(), file_options)?;
    debug!("Resolved configuration: {:?}", config);

    let request = UploadRequest::from_config(&config)?;

    let log = UploadLog::open(&config.log_file)?;
    let client = S3Client::new(
        config.profile.as_deref(),
        config.region.as_deref(),
        cli.progress,
    )
    .await
    .context("Failed to initialize S3 client")?;
    let uploader = Uploader::new(&client, &log);

    info!(
        "Uploading {} to s3://{}/{}",
        request.source_path.display(),
        request.bucket,
        request.destination
    );

    let outcomes = uploader.run(&request).await?;
    let total_bytes: u64 = outcomes.iter().map(|o| o.size_bytes).sum();

    println!(
        "{}",
        style(format!(
            "Uploaded {} file(s), {} bytes (log: {})",
            outcomes.len(),
            total_bytes,
            log.path().display()
        ))
        .green()
        .bold()
    );

    if request.presign_requested {
        let url = uploader
            .presign_download(&request.bucket, &request.destination, config.expires_in)
            .await?;
        println!("Presigned URL: {}", url);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_options_leave_presign_unset_when_flag_absent() {
        let cli = Cli::parse_from(["s3upload", "--file", "a.txt", "--bucket", "b"]);
        let options = cli.options();

        assert_eq!(options.file, Some(PathBuf::from("a.txt")));
        assert_eq!(options.bucket.as_deref(), Some("b"));
        assert_eq!(options.presign, None);
    }

    #[test]
    fn test_cli_options_with_all_flags() {
        let cli = Cli::parse_from([
            "s3upload",
            "--file",
            "data",
            "--bucket",
            "b",
            "--key",
            "backup",
            "--profile",
            "prod",
            "--presign",
            "--expires-in",
            "120",
            "--log-file",
            "run.log",
        ]);
        let options = cli.options();

        assert_eq!(options.key.as_deref(), Some("backup"));
        assert_eq!(options.profile.as_deref(), Some("prod"));
        assert_eq!(options.presign, Some(true));
        assert_eq!(options.expires_in, Some(120));
        assert_eq!(options.log_file, Some(PathBuf::from("run.log")));
    }

    #[test]
    fn test_cli_verify() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
