use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Result, UploadError};
use crate::uploader::UploadOutcome;

/// Default location of the upload log
pub const DEFAULT_LOG_FILE: &str = "upload.log";

/// Append-only, human readable record of upload attempts
///
/// One line per attempt: `<path> | <size> bytes | <status> | <timestamp>`.
/// Lines are written whole under a lock and flushed immediately.
pub struct UploadLog {
    path: PathBuf,
    sink: Mutex<File>,
}

impl UploadLog {
    /// Open (or create) the log file at `path` for appending
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| UploadError::Log {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            sink: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one outcome line
    pub fn record(&self, outcome: &UploadOutcome) -> Result<()> {
        let line = format!("{}\n", format_line(outcome));
        let mut sink = self.sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        sink.write_all(line.as_bytes())
            .and_then(|_| sink.flush())
            .map_err(|source| UploadError::Log {
                path: self.path.clone(),
                source,
            })
    }
}

/// Render an outcome as a single log line (without newline)
pub fn format_line(outcome: &UploadOutcome) -> String {
    format!(
        "{} | {} bytes | {} | {}",
        outcome.path.display(),
        outcome.size_bytes,
        outcome.detail,
        outcome.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Micros, false)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::UploadStrategy;
    use crate::uploader::UploadStatus;
    use chrono::{Local, TimeZone};
    use tempfile::TempDir;

    fn outcome(path: &str, size: u64, status: UploadStatus, detail: &str) -> UploadOutcome {
        UploadOutcome {
            path: PathBuf::from(path),
            size_bytes: size,
            strategy: UploadStrategy::Simple,
            status,
            detail: detail.to_string(),
            timestamp: Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_format_line() {
        let line = format_line(&outcome(
            "data/a.txt",
            42,
            UploadStatus::Success,
            "Upload Successful",
        ));

        assert!(line.starts_with("data/a.txt | 42 bytes | Upload Successful | 2024-05-01T12:30:00.000000"));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_record_appends_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("upload.log");

        {
            let log = UploadLog::open(&path).unwrap();
            log.record(&outcome("a.txt", 1, UploadStatus::Success, "Upload Successful"))
                .unwrap();
        }
        {
            // Reopening must append, never truncate
            let log = UploadLog::open(&path).unwrap();
            log.record(&outcome(
                "b.txt",
                2,
                UploadStatus::Failure,
                "Upload Failed: boom",
            ))
            .unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("a.txt | 1 bytes | Upload Successful | "));
        assert!(lines[1].starts_with("b.txt | 2 bytes | Upload Failed: boom | "));
    }

    #[test]
    fn test_open_in_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let result = UploadLog::open(dir.path().join("missing/upload.log"));
        assert!(matches!(result, Err(UploadError::Log { .. })));
    }
}
