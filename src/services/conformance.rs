//! Conformance validation of a running submission.
//!
//! Three checks run in a fixed order against the submission's API through
//! the conformance CLI image. Each check contributes at most one reason to
//! the verdict; a probe failure inside a check is never fatal.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use crate::domain::errors::OrchestratorResult;
use crate::domain::models::{
    AnnotationPayload, AnnotatorKind, ConformanceCheck, ConformanceCommand, ContainerHandle,
    ProbeRequest, SubmissionId, ValidationAccumulator, ValidationVerdict,
};
use crate::services::cleanup;
use crate::services::network;
use crate::services::probe_executor::ProbeExecutor;

/// Name of the example note file, on the host and inside the probe.
pub const EXAMPLE_NOTE_FILE: &str = "example_note.json";

/// Tool metadata returned by `GET <base>/tool`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub tool_api_version: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// What the validator checks against.
#[derive(Debug, Clone)]
pub struct ConformanceSettings {
    pub kind: AnnotatorKind,
    /// Expected `tool_api_version`
    pub schema_version: String,
    pub conformance_image: String,
    pub network: String,
    pub service_port: u16,
    pub api_base_path: String,
    /// Host directory the example note is written to
    pub workdir: PathBuf,
}

/// Drives the conformance checks and produces a verdict.
pub struct ConformanceValidator<'a> {
    probes: &'a ProbeExecutor,
    settings: ConformanceSettings,
}

impl<'a> ConformanceValidator<'a> {
    pub fn new(probes: &'a ProbeExecutor, settings: ConformanceSettings) -> Self {
        Self { probes, settings }
    }

    /// Run every check against `handle` and finalize the verdict.
    ///
    /// An INVALID submission has its container and image removed. A missing
    /// network attachment is fatal and yields no verdict.
    #[instrument(skip(self, id, handle), fields(submission_id = %id))]
    pub async fn validate(
        &self,
        id: &SubmissionId,
        handle: &ContainerHandle,
    ) -> OrchestratorResult<ValidationVerdict> {
        let address = network::address_of(self.probes.engine(), handle, &self.settings.network).await?;
        let api_base = address.api_base(self.settings.service_port, &self.settings.api_base_path);
        info!(api_base = %api_base, "validating submission");

        let mut acc = ValidationAccumulator::new();
        for check in ConformanceCheck::ALL {
            let outcome = match check {
                ConformanceCheck::ToolMetadata => self.check_tool(id, &api_base).await,
                ConformanceCheck::UserInterface => self.check_ui(id, &api_base).await,
                ConformanceCheck::Annotate => self.check_annotate(id, &api_base).await,
            };
            if let Err(reason) = outcome {
                warn!(?check, reason = %reason, "conformance check failed");
                acc.record_failure(check, reason);
            }
        }

        let verdict = acc.finalize();
        info!(status = %verdict.status, reasons = verdict.reasons.len(), "validation finished");

        if !verdict.is_valid() {
            cleanup::remove_container(self.probes.engine(), &handle.name).await;
            if let Some(ref image) = handle.image {
                cleanup::remove_image(self.probes.engine(), image).await;
            }
        }
        Ok(verdict)
    }

    fn request(&self, id: &SubmissionId, check: ConformanceCheck, cmd: &ConformanceCommand) -> ProbeRequest {
        ProbeRequest::new(
            id.sidecar_name(check.probe_suffix()),
            self.settings.conformance_image.as_str(),
            cmd.to_args(),
        )
    }

    async fn check_tool(&self, id: &SubmissionId, api_base: &str) -> Result<(), String> {
        let cmd = ConformanceCommand::GetTool {
            annotator_host: api_base.to_string(),
        };
        let request = self.request(id, ConformanceCheck::ToolMetadata, &cmd);

        let tool_info: Option<ToolInfo> = match self.probes.probe(&request).await {
            Ok(raw) => Some(parse_tool_info(&raw)?),
            Err(_) => None,
        };

        let Some(tool_info) = tool_info else {
            return Err("API api/v1/tool endpoint not implemented or implemented incorrectly. \
                 Make sure correct tool object is returned."
                .to_string());
        };

        if tool_info.tool_api_version != self.settings.schema_version {
            return Err(format!(
                "API api/v1/tool toolApiVersion is not {}",
                self.settings.schema_version
            ));
        }
        Ok(())
    }

    async fn check_ui(&self, id: &SubmissionId, api_base: &str) -> Result<(), String> {
        let cmd = ConformanceCommand::CheckUrl {
            url: format!("{api_base}/ui"),
        };
        let request = self.request(id, ConformanceCheck::UserInterface, &cmd);

        self.probes
            .probe(&request)
            .await
            .map(|_| ())
            .map_err(|_| ".../api/v1/ui not implemented or implemented incorrectly.".to_string())
    }

    async fn check_annotate(&self, id: &SubmissionId, api_base: &str) -> Result<(), String> {
        let kind = self.settings.kind;
        let failure = || {
            format!(
                "API /{} endpoint not implemented or implemented incorrectly.  \
                 Make sure correct Annotation object is annotated.",
                kind.endpoint()
            )
        };

        let note_path = write_example_note(&self.settings.workdir)
            .await
            .map_err(|e| {
                warn!(error = %e, "could not write example note");
                failure()
            })?;

        let container_note = format!("/{EXAMPLE_NOTE_FILE}");
        let cmd = ConformanceCommand::AnnotateNote {
            annotator_host: api_base.to_string(),
            note_json: container_note.clone(),
            kind,
        };
        let request = self
            .request(id, ConformanceCheck::Annotate, &cmd)
            .with_bind(format!("{}:{container_note}:rw", note_path.display()));

        let raw = self.probes.probe(&request).await.map_err(|_| failure())?;
        AnnotationPayload::parse(kind, &raw).map_err(|e| {
            warn!(error = %e, "annotation response rejected");
            failure()
        })?;
        Ok(())
    }
}

/// Parse a tool object, keeping syntax errors apart from schema errors.
fn parse_tool_info(raw: &[u8]) -> Result<ToolInfo, String> {
    let value: Value = serde_json::from_slice(raw).map_err(|e| {
        format!("API api/v1/tool returned a tool object that is not valid JSON: {e}")
    })?;
    serde_json::from_value(value).map_err(|e| {
        format!("API api/v1/tool returned a tool object without a valid tool_api_version: {e}")
    })
}

/// Write the one-note example file used by the annotate check.
pub async fn write_example_note(workdir: &Path) -> std::io::Result<PathBuf> {
    let note = json!([{
        "identifier": "awesome-note",
        "noteType": "loinc:LP29684-5",
        "patientId": "awesome-patient",
        "text": "On 12/26/2020, Ms. Chloe Price met with Dr. Prescott in Seattle."
    }]);
    let path = workdir.join(EXAMPLE_NOTE_FILE);
    tokio::fs::write(&path, note.to_string()).await?;
    Ok(path)
}

/// Write the results document for `verdict` to `path`.
pub async fn write_results(verdict: &ValidationVerdict, path: &Path) -> OrchestratorResult<()> {
    let body = serde_json::to_string(&verdict.to_results())?;
    tokio::fs::write(path, body).await?;
    info!(path = %path.display(), status = %verdict.status, "results written");
    Ok(())
}
