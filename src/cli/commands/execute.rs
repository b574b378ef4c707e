//! Implementation of the `annotator-harness execute` command.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use std::path::PathBuf;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::{check_credentials, parse_submission_id, Harness};
use crate::adapters::storage::DirectoryLogStore;
use crate::cli::output::{output, status_label, CommandOutput};
use crate::domain::errors::OrchestratorResult;
use crate::domain::models::{AnnotatorKind, ClinicalNote, Config, ImageRef, Submission};
use crate::domain::ports::LogStore;
use crate::services::annotation_driver::{self, AnnotationDriver};
use crate::services::{cleanup, network, SubmissionLogger, UploadOutcome};

#[derive(Args, Debug, Clone)]
pub struct ExecuteArgs {
    /// Submission id, also used as the container name
    #[arg(short = 's', long)]
    pub submission_id: String,

    /// Image repository of the submission
    #[arg(short = 'p', long)]
    pub docker_repository: String,

    /// Content digest of the submission image
    #[arg(short = 'd', long)]
    pub docker_digest: String,

    /// JSON file with the clinical notes to annotate
    #[arg(short = 'i', long)]
    pub data_notes: PathBuf,

    /// Credentials file for the log store
    #[arg(short = 'c', long)]
    pub credentials: PathBuf,

    /// Storage location the submission log is uploaded under
    #[arg(long)]
    pub parent_id: String,

    /// Annotator kind, selects the annotation endpoint
    #[arg(short = 'a', long, default_value = "date")]
    pub annotator_kind: AnnotatorKind,

    /// Work directory bound into the containers
    #[arg(short, long, default_value = ".")]
    pub workdir: PathBuf,

    /// Skip uploading the submission log
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct ExecuteOutput {
    pub success: bool,
    pub run_id: String,
    pub submission_id: String,
    pub image: String,
    pub annotated_notes: usize,
    pub predictions: PathBuf,
    pub log_file: Option<PathBuf>,
    pub log_upload: String,
    pub finished_at: String,
}

impl CommandOutput for ExecuteOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!(
                "{} submission {}",
                status_label("FINISHED", self.success),
                self.submission_id
            ),
            format!("Image: {}", self.image),
            format!("Annotated notes: {}", self.annotated_notes),
            format!("Predictions: {}", self.predictions.display()),
        ];
        if let Some(ref log) = self.log_file {
            lines.push(format!("Log file: {} ({})", log.display(), self.log_upload));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ExecuteArgs, config: &Config, json_mode: bool) -> Result<()> {
    check_credentials(&args.credentials)?;
    let mut harness = Harness::connect(config, &args.workdir)?;
    let store = DirectoryLogStore::new(&config.submission_log.storage_root);

    let out = run(&mut harness, &args, config, &store).await?;
    output(&out, json_mode);
    Ok(())
}

/// Launch or reuse the submission, annotate every note and tear down.
///
/// The submission container and image are removed whether or not the
/// annotation succeeded.
pub async fn run(
    harness: &mut Harness,
    args: &ExecuteArgs,
    config: &Config,
    store: &dyn LogStore,
) -> Result<ExecuteOutput> {
    let run_id = Uuid::new_v4();
    let submission = Submission {
        id: parse_submission_id(&args.submission_id)?,
        image: ImageRef::new(&args.docker_repository, &args.docker_digest),
    };
    let span = info_span!("execute", %run_id, submission_id = %submission.id);

    async {
        let notes = annotation_driver::load_notes(&args.data_notes)
            .await
            .with_context(|| format!("Failed to read notes from {}", args.data_notes.display()))?;
        info!(notes = notes.len(), image = %submission.image, "starting annotation run");

        let outcome = annotate(harness, &submission, args.annotator_kind, notes, config).await;

        let logger = SubmissionLogger::new(
            store,
            config.submission_log.max_upload_bytes,
            args.dry_run,
        );
        let log_file = match logger
            .capture(harness.engine.as_ref(), &submission.id, &harness.workdir)
            .await
        {
            Ok(file) => Some(file),
            Err(e) => {
                warn!(error = %e, "could not write submission log");
                None
            }
        };
        let log_upload = match log_file {
            Some(ref file) => logger.upload(file, &args.parent_id).await,
            None => UploadOutcome::Failed,
        };

        cleanup::remove_container(harness.engine.as_ref(), submission.id.as_str()).await;
        cleanup::remove_image(harness.engine.as_ref(), &submission.image.to_string()).await;
        harness.resolver.release(&submission.id);

        let (predictions, annotated_notes) = outcome.context("Annotation run failed")?;

        Ok::<_, anyhow::Error>(ExecuteOutput {
            success: true,
            run_id: run_id.to_string(),
            submission_id: submission.id.to_string(),
            image: submission.image.to_string(),
            annotated_notes,
            predictions,
            log_file,
            log_upload: describe_upload(&log_upload),
            finished_at: Utc::now().to_rfc3339(),
        })
    }
    .instrument(span)
    .await
}

async fn annotate(
    harness: &mut Harness,
    submission: &Submission,
    kind: AnnotatorKind,
    notes: Vec<ClinicalNote>,
    config: &Config,
) -> OrchestratorResult<(PathBuf, usize)> {
    let handle = harness.resolver.resolve(submission).await?;
    let address = network::address_of(harness.engine.as_ref(), &handle, &config.engine.network).await?;
    let api_base = address.api_base(config.engine.service_port, &config.engine.api_base_path);

    let count = notes.len();
    let driver = AnnotationDriver::new(
        &harness.probes,
        config.probes.http_client_image.as_str(),
        harness.workdir.as_path(),
        config.engine.output_mount.as_str(),
    );
    let predictions = driver.run(&submission.id, &api_base, kind, notes).await?;
    Ok((predictions, count))
}

fn describe_upload(outcome: &UploadOutcome) -> String {
    match outcome {
        UploadOutcome::Stored(path) => format!("uploaded to {}", path.display()),
        UploadOutcome::SkippedSize(size) => format!("not uploaded, {size} bytes"),
        UploadOutcome::SkippedDryRun => "not uploaded, dry run".to_string(),
        UploadOutcome::Failed => "upload failed".to_string(),
    }
}
