//! Implementation of the `annotator-harness validate` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::{info, info_span, warn, Instrument};

use super::{check_credentials, parse_submission_id, Harness};
use crate::cli::output::{output, status_label, CommandOutput};
use crate::domain::errors::OrchestratorError;
use crate::domain::models::{
    AnnotatorKind, Config, ContainerHandle, SubmissionId, ValidationVerdict,
};
use crate::services::cleanup;
use crate::services::conformance::{self, ConformanceSettings, ConformanceValidator};

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Submission id of the running container
    #[arg(short = 's', long)]
    pub submission_id: String,

    /// Credentials file for the log store
    #[arg(short = 'c', long)]
    pub credentials: PathBuf,

    /// Where to write the validation results JSON
    #[arg(short = 'r', long)]
    pub results: PathBuf,

    /// Annotator kind the submission implements
    #[arg(short = 'a', long)]
    pub annotator_kind: AnnotatorKind,

    /// Subset of the data the reproducibility check runs on
    #[arg(long)]
    pub subset_data: String,

    /// Expected `tool_api_version` of the submission
    #[arg(long)]
    pub schema_version: String,

    /// Work directory for the example note
    #[arg(short, long, default_value = ".")]
    pub workdir: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct ValidateOutput {
    pub submission_id: String,
    pub submission_status: String,
    pub submission_errors: Vec<String>,
    pub results: PathBuf,
}

impl CommandOutput for ValidateOutput {
    fn to_human(&self) -> String {
        let ok = self.submission_errors.is_empty();
        let mut lines = vec![format!(
            "{} submission {}",
            status_label(&self.submission_status, ok),
            self.submission_id
        )];
        for reason in &self.submission_errors {
            lines.push(format!("  - {reason}"));
        }
        lines.push(format!("Results: {}", self.results.display()));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ValidateArgs, config: &Config, json_mode: bool) -> Result<()> {
    check_credentials(&args.credentials)?;
    let mut harness = Harness::connect(config, &args.workdir)?;

    let out = run(&mut harness, &args, config).await?;
    output(&out, json_mode);
    Ok(())
}

/// Validate an already running submission and write the results file.
///
/// Probe failures end up as reasons in the results file. Errors returned
/// from here mean no verdict could be recorded; the submission container and
/// image are removed before the error is returned.
pub async fn run(harness: &mut Harness, args: &ValidateArgs, config: &Config) -> Result<ValidateOutput> {
    let id = parse_submission_id(&args.submission_id)?;
    let span = info_span!("validate", submission_id = %id);

    async {
        info!(
            kind = %args.annotator_kind,
            schema_version = %args.schema_version,
            subset_data = %args.subset_data,
            "validating submission"
        );

        let handle = harness
            .resolver
            .find(&id)
            .await?
            .ok_or_else(|| OrchestratorError::ContainerNotFound(id.to_string()))?;

        let verdict = match validate_and_record(harness, &id, &handle, args, config).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(container = %handle.name, error = %e, "validation aborted, removing submission");
                cleanup::remove_container(harness.engine.as_ref(), &handle.name).await;
                if let Some(ref image) = handle.image {
                    cleanup::remove_image(harness.engine.as_ref(), image).await;
                }
                harness.resolver.release(&id);
                return Err(e);
            }
        };
        if !verdict.is_valid() {
            harness.resolver.release(&id);
        }

        Ok::<_, anyhow::Error>(ValidateOutput {
            submission_id: id.to_string(),
            submission_status: verdict.status.to_string(),
            submission_errors: verdict.reasons,
            results: args.results.clone(),
        })
    }
    .instrument(span)
    .await
}

async fn validate_and_record(
    harness: &Harness,
    id: &SubmissionId,
    handle: &ContainerHandle,
    args: &ValidateArgs,
    config: &Config,
) -> Result<ValidationVerdict> {
    let settings = ConformanceSettings {
        kind: args.annotator_kind,
        schema_version: args.schema_version.clone(),
        conformance_image: config.probes.conformance_image.clone(),
        network: config.engine.network.clone(),
        service_port: config.engine.service_port,
        api_base_path: config.engine.api_base_path.clone(),
        workdir: harness.workdir.clone(),
    };
    let verdict = ConformanceValidator::new(&harness.probes, settings)
        .validate(id, handle)
        .await
        .context("Validation could not complete")?;

    conformance::write_results(&verdict, &args.results)
        .await
        .with_context(|| format!("Failed to write results to {}", args.results.display()))?;
    Ok(verdict)
}
