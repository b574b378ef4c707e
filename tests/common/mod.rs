//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across the integration test
//! files. Everything runs against the in-memory container engine.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use annotator_harness::adapters::mock::MockEngine;
use annotator_harness::cli::commands::Harness;
use annotator_harness::domain::models::Config;
use annotator_harness::domain::ports::ContainerEngine;
use tempfile::TempDir;

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
///
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Default configuration with a readiness budget short enough for tests
pub fn test_config(storage_root: &Path) -> Config {
    let mut config = Config::default();
    config.readiness.initial_backoff_ms = 5;
    config.readiness.max_backoff_ms = 20;
    config.readiness.max_wait_secs = 1;
    config.probes.timeout_secs = 5;
    config.submission_log.storage_root = storage_root.display().to_string();
    config
}

/// Harness wired to `engine` with `workdir` as the bound work dir
pub fn harness(engine: &MockEngine, config: &Config, workdir: &Path) -> Harness {
    let engine: Arc<dyn ContainerEngine> = Arc::new(engine.clone());
    Harness::with_engine(engine, config, workdir).expect("Failed to build harness")
}

/// Write a credentials placeholder and return its path
pub fn credentials(dir: &Path) -> PathBuf {
    let path = dir.join("credentials.cfg");
    std::fs::write(&path, "[authentication]\n").expect("Failed to write credentials");
    path
}

/// Write a notes file with one record per text
pub fn write_notes(dir: &Path, texts: &[&str]) -> PathBuf {
    let notes: Vec<serde_json::Value> = texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            serde_json::json!({
                "id": format!("note-{}", i + 1),
                "noteType": "loinc:LP29684-5",
                "patientId": "patient-1",
                "text": text,
            })
        })
        .collect();
    let path = dir.join("notes.json");
    std::fs::write(&path, serde_json::to_string(&notes).expect("notes serialize"))
        .expect("Failed to write notes");
    path
}

/// A date annotation response for `text`
pub fn date_response(text: &str) -> String {
    serde_json::json!({
        "textDateAnnotations": [
            {"start": 0, "length": text.len(), "text": text, "dateFormat": "MM/DD/YYYY"}
        ]
    })
    .to_string()
}
