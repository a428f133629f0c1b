//! Append-only summary log of live runs.
//!
//! Each live run appends one JSON line to `results.jsonl` next to the
//! bootstrap cache. Logging is best-effort: failures are reported through
//! `tracing` and never reach the caller.

use crate::error::DomainScoutError;
use crate::types::{CheckOptions, CheckResponse, StatusCounts};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// File name of the run log inside the cache directory.
pub const RUN_LOG_FILE: &str = "results.jsonl";

/// One line of the run log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub timestamp: String,
    pub tool_version: String,
    pub options: CheckOptions,
    pub counts: StatusCounts,
    pub suggested_best: Option<String>,
}

impl RunRecord {
    pub fn new(options: &CheckOptions, response: &CheckResponse) -> Self {
        Self {
            timestamp: crate::checker::utc_timestamp(),
            tool_version: crate::VERSION.to_string(),
            options: options.clone(),
            counts: response.counts(),
            suggested_best: response.suggested_best.clone(),
        }
    }
}

/// Sink for run summaries.
#[async_trait]
pub trait RunLog: Send + Sync {
    /// Record one completed run.
    async fn append(&self, record: &RunRecord) -> Result<(), DomainScoutError>;
}

/// Run log writing JSON lines to a file.
#[derive(Debug, Clone)]
pub struct JsonlRunLog {
    path: PathBuf,
}

impl JsonlRunLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Log placed in the same directory as the bootstrap cache file.
    pub fn beside_cache(cache_path: &Path) -> Self {
        let dir = match cache_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::new(dir.join(RUN_LOG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RunLog for JsonlRunLog {
    async fn append(&self, record: &RunRecord) -> Result<(), DomainScoutError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| DomainScoutError::file_error(self.path.to_string_lossy(), e.to_string()))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Run log that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRunLog;

#[async_trait]
impl RunLog for NoopRunLog {
    async fn append(&self, _record: &RunRecord) -> Result<(), DomainScoutError> {
        Ok(())
    }
}
