use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, UploadError};
use crate::s3::DEFAULT_PRESIGN_TTL;
use crate::upload_log::DEFAULT_LOG_FILE;

/// Upload options as given on the command line or in a config file
///
/// Every field is optional so the two sources can be merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UploadOptions {
    pub file: Option<PathBuf>,
    pub bucket: Option<String>,
    pub key: Option<String>,
    pub profile: Option<String>,
    pub region: Option<String>,
    pub presign: Option<bool>,
    /// Pre-signed URL lifetime in seconds
    pub expires_in: Option<u64>,
    pub log_file: Option<PathBuf>,
}

impl UploadOptions {
    /// Load options from a YAML (or JSON) config file
    ///
    /// An empty file yields no options. Unknown keys are ignored.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            UploadError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content).map_err(|e| match e {
            UploadError::Config(msg) => {
                UploadError::Config(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(content)
            .map_err(|e| UploadError::Config(format!("Failed to parse config file: {}", e)))
    }
}

/// Fully resolved configuration for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub file: PathBuf,
    pub bucket: String,
    pub key: Option<String>,
    pub profile: Option<String>,
    pub region: Option<String>,
    pub presign: bool,
    pub expires_in: Duration,
    pub log_file: PathBuf,
}

/// Merge command line options with config file options
///
/// Config file values take precedence over command line values. `file` and
/// `bucket` must be set by one of the two.
pub fn merge(cli: UploadOptions, file: UploadOptions) -> Result<ResolvedConfig> {
    let source = file
        .file
        .or(cli.file)
        .filter(|f| !f.as_os_str().is_empty());
    let bucket = file.bucket.or(cli.bucket).filter(|b| !b.is_empty());

    let (Some(source), Some(bucket)) = (source, bucket) else {
        return Err(UploadError::Config(
            "--file and --bucket are required arguments".to_string(),
        ));
    };

    Ok(ResolvedConfig {
        file: source,
        bucket,
        key: file.key.or(cli.key).filter(|k| !k.is_empty()),
        profile: file.profile.or(cli.profile),
        region: file.region.or(cli.region),
        presign: file.presign.or(cli.presign).unwrap_or(false),
        expires_in: file
            .expires_in
            .or(cli.expires_in)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_PRESIGN_TTL),
        log_file: file
            .log_file
            .or(cli.log_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
    })
}

#[cfg(test)]
impl ResolvedConfig {
    pub(crate) fn for_tests() -> Self {
        Self {
            file: PathBuf::from("data"),
            bucket: "test-bucket".to_string(),
            key: None,
            profile: None,
            region: None,
            presign: false,
            expires_in: DEFAULT_PRESIGN_TTL,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}
