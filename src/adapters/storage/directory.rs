//! Directory-backed log store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::domain::ports::LogStore;

/// Stores each file under `<root>/<parent>/`.
pub struct DirectoryLogStore {
    root: PathBuf,
}

impl DirectoryLogStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl LogStore for DirectoryLogStore {
    async fn store(&self, file: &Path, parent: &str) -> Result<PathBuf> {
        let file_name = file
            .file_name()
            .with_context(|| format!("{} has no file name", file.display()))?;
        let target_dir = self.root.join(parent);
        fs::create_dir_all(&target_dir)
            .await
            .with_context(|| format!("Failed to create {}", target_dir.display()))?;

        let target = target_dir.join(file_name);
        fs::copy(file, &target)
            .await
            .with_context(|| format!("Failed to copy {} to {}", file.display(), target.display()))?;

        info!(file = %target.display(), "log file stored");
        Ok(target)
    }
}
