//! Annotation run driver.
//!
//! Sends every input note to the submission, one curl sidecar at a time,
//! and collects the stamped results into `predictions.json`.

use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::domain::errors::{OrchestratorError, OrchestratorResult};
use crate::domain::models::{
    AnnotationPayload, AnnotationRequest, AnnotationResult, AnnotatorKind, ClinicalNote,
    HttpRequest, ProbeRequest, SubmissionId,
};
use crate::services::probe_executor::ProbeExecutor;

/// File the curl sidecar writes each response to.
pub const ANNOTATIONS_FILE: &str = "annotations.json";

/// File the collected results are written to.
pub const PREDICTIONS_FILE: &str = "predictions.json";

pub struct AnnotationDriver<'a> {
    probes: &'a ProbeExecutor,
    client_image: String,
    /// Host work dir, bound into the sidecar at `output_mount`
    workdir: PathBuf,
    output_mount: String,
}

impl<'a> AnnotationDriver<'a> {
    pub fn new(
        probes: &'a ProbeExecutor,
        client_image: impl Into<String>,
        workdir: impl Into<PathBuf>,
        output_mount: impl Into<String>,
    ) -> Self {
        Self {
            probes,
            client_image: client_image.into(),
            workdir: workdir.into(),
            output_mount: output_mount.into(),
        }
    }

    /// Annotate `notes` in order and write the predictions file.
    ///
    /// Any failure on a single note aborts the run.
    #[instrument(skip(self, id, api_base, notes), fields(submission_id = %id, notes = notes.len()))]
    pub async fn run(
        &self,
        id: &SubmissionId,
        api_base: &str,
        kind: AnnotatorKind,
        notes: Vec<ClinicalNote>,
    ) -> OrchestratorResult<PathBuf> {
        let url = format!("{}/{}", api_base, kind.endpoint());
        let mut results = Vec::with_capacity(notes.len());

        for note in notes {
            let result = self.annotate(id, &url, kind, note).await?;
            results.push(result);
        }

        let predictions = self.workdir.join(PREDICTIONS_FILE);
        tokio::fs::write(&predictions, serde_json::to_vec(&results)?).await?;

        if !tokio::fs::try_exists(&predictions).await.unwrap_or(false) {
            return Err(OrchestratorError::OutputMissing(
                predictions.display().to_string(),
            ));
        }

        info!(path = %predictions.display(), count = results.len(), "predictions written");
        Ok(predictions)
    }

    async fn annotate(
        &self,
        id: &SubmissionId,
        url: &str,
        kind: AnnotatorKind,
        note: ClinicalNote,
    ) -> OrchestratorResult<AnnotationResult> {
        let (note_id, body) = note.into_parts();
        debug!(note_id = %note_id, "annotating note");

        let response_path = self.workdir.join(ANNOTATIONS_FILE);
        remove_if_present(&response_path).await?;

        let payload = serde_json::to_string(&AnnotationRequest { note: &body })?;
        let http = HttpRequest::post_json(url, payload)
            .write_to(format!("{}/{ANNOTATIONS_FILE}", self.output_mount));
        let request = ProbeRequest::new(id.sidecar_name("curl"), self.client_image.as_str(), http.to_curl_args())
            .with_bind(format!("{}:{}:rw", self.workdir.display(), self.output_mount))
            .reading_file(response_path);

        let raw = self.probes.probe(&request).await?;
        let annotations = AnnotationPayload::parse(kind, &raw).map_err(|reason| {
            OrchestratorError::MalformedResponse {
                note: note_id.clone(),
                reason,
            }
        })?;

        Ok(annotations.with_source(note_id))
    }
}

/// Clear a previous response so a failed call can never be read as this one.
async fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Read the notes input file: a JSON array of records.
pub async fn load_notes(path: &Path) -> OrchestratorResult<Vec<ClinicalNote>> {
    let raw = tokio::fs::read(path).await?;
    serde_json::from_slice(&raw).map_err(|e| {
        OrchestratorError::InvalidRecord(format!("{}: {e}", path.display()))
    })
}
