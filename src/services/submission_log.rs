//! Submission log capture and size-capped upload.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::domain::errors::OrchestratorResult;
use crate::domain::models::SubmissionId;
use crate::domain::ports::{ContainerEngine, LogStore};

/// Placeholder written when a container produced no output.
pub const EMPTY_LOG_TEXT: &str = "No Logs";

/// Outcome of an upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Stored(PathBuf),
    /// File was empty or larger than the cap
    SkippedSize(u64),
    SkippedDryRun,
    Failed,
}

/// Captures a submission's logs to `<id>_log.txt` and hands it to a store.
pub struct SubmissionLogger<'a> {
    store: &'a dyn LogStore,
    max_upload_bytes: u64,
    dry_run: bool,
}

impl<'a> SubmissionLogger<'a> {
    pub fn new(store: &'a dyn LogStore, max_upload_bytes: u64, dry_run: bool) -> Self {
        Self {
            store,
            max_upload_bytes,
            dry_run,
        }
    }

    /// Write the container's logs into `workdir`. Missing containers produce
    /// the placeholder text.
    pub async fn capture(
        &self,
        engine: &dyn ContainerEngine,
        id: &SubmissionId,
        workdir: &Path,
    ) -> OrchestratorResult<PathBuf> {
        let logs = match engine.logs(id.as_str()).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(submission_id = %id, error = %e, "could not read container logs");
                None
            }
        };

        let path = workdir.join(format!("{id}_log.txt"));
        tokio::fs::write(&path, log_text(logs.as_deref())).await?;
        Ok(path)
    }

    /// Upload `file` under `parent` if it is within the size cap. Failures
    /// are logged, never returned.
    pub async fn upload(&self, file: &Path, parent: &str) -> UploadOutcome {
        let size = match tokio::fs::metadata(file).await {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!(file = %file.display(), error = %e, "log file unreadable");
                return UploadOutcome::Failed;
            }
        };

        if size == 0 || size > self.max_upload_bytes {
            info!(file = %file.display(), size, cap = self.max_upload_bytes, "log file not uploaded");
            return UploadOutcome::SkippedSize(size);
        }
        if self.dry_run {
            info!(file = %file.display(), "dry run, log file not uploaded");
            return UploadOutcome::SkippedDryRun;
        }

        match self.store.store(file, parent).await {
            Ok(location) => UploadOutcome::Stored(location),
            Err(e) => {
                warn!(file = %file.display(), error = %e, "log upload failed");
                UploadOutcome::Failed
            }
        }
    }
}

/// ASCII-only rendering of raw container output.
fn log_text(raw: Option<&[u8]>) -> String {
    match raw {
        Some(bytes) if !bytes.is_empty() => String::from_utf8_lossy(bytes)
            .chars()
            .filter(char::is_ascii)
            .collect(),
        _ => EMPTY_LOG_TEXT.to_string(),
    }
}
