//! Log store port - where submission log files are uploaded.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Remote (or local) store for submission log files.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Store `file` under the `parent` location and return where it landed.
    async fn store(&self, file: &Path, parent: &str) -> anyhow::Result<PathBuf>;
}
