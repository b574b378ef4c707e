mod common;

use annotator_harness::adapters::mock::{MockEngine, MockRun};
use annotator_harness::cli::commands::validate::{run, ValidateArgs};
use annotator_harness::domain::models::{AnnotatorKind, ContainerState};
use serde_json::Value;
use std::path::Path;

const TOOL: &str = r#"{"name":"date-annotator-example","version":"1.0.0","license":"apache-2.0","tool_api_version":"1.0.1"}"#;

fn args(work: &Path, schema_version: &str) -> ValidateArgs {
    ValidateArgs {
        submission_id: "9712345".to_string(),
        credentials: common::credentials(work),
        results: work.join("results.json"),
        annotator_kind: AnnotatorKind::Date,
        subset_data: "subset.json".to_string(),
        schema_version: schema_version.to_string(),
        workdir: work.to_path_buf(),
    }
}

async fn running_submission() -> MockEngine {
    let engine = MockEngine::new();
    engine
        .insert_container("9712345", ContainerState::Running, "submission")
        .await;
    engine
}

async fn script_conforming(engine: &MockEngine) {
    engine
        .queue_run("9712345_probe_tool", MockRun::success(TOOL))
        .await;
    engine
        .queue_run("9712345_probe_ui", MockRun::success("200"))
        .await;
    engine
        .queue_run(
            "9712345_probe_annotate",
            MockRun::success(common::date_response("12/26/2020")),
        )
        .await;
}

fn read_results(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_conforming_submission_is_validated() {
    let work = common::temp_dir();
    let config = common::test_config(work.path());
    let engine = running_submission().await;
    script_conforming(&engine).await;

    let mut harness = common::harness(&engine, &config, work.path());
    let out = run(&mut harness, &args(work.path(), "1.0.1"), &config)
        .await
        .unwrap();

    assert_eq!(out.submission_status, "VALIDATED");
    let results = read_results(&work.path().join("results.json"));
    assert_eq!(results["submission_status"], "VALIDATED");
    assert_eq!(results["submission_errors"], "");

    // The execution stage reuses the validated container
    assert_eq!(
        engine.container_names().await,
        vec!["9712345".to_string()]
    );
    assert!(engine.removed_images().await.is_empty());
}

#[tokio::test]
async fn test_version_mismatch_is_invalid_and_removes_submission() {
    let work = common::temp_dir();
    let config = common::test_config(work.path());
    let engine = running_submission().await;
    script_conforming(&engine).await;

    let mut harness = common::harness(&engine, &config, work.path());
    let out = run(&mut harness, &args(work.path(), "2.0.0"), &config)
        .await
        .unwrap();

    assert_eq!(out.submission_status, "INVALID");
    let results = read_results(&work.path().join("results.json"));
    assert_eq!(results["submission_status"], "INVALID");
    assert_eq!(
        results["submission_errors"],
        "API api/v1/tool toolApiVersion is not 2.0.0"
    );

    assert!(engine.container_names().await.is_empty());
    assert_eq!(engine.removed_images().await, vec!["sha256:9712345"]);
}

#[tokio::test]
async fn test_every_check_runs_when_all_fail() {
    let work = common::temp_dir();
    let config = common::test_config(work.path());
    let engine = running_submission().await;
    engine
        .set_default_run(MockRun::failure(1, "connection refused"))
        .await;

    let mut harness = common::harness(&engine, &config, work.path());
    let out = run(&mut harness, &args(work.path(), "1.0.1"), &config)
        .await
        .unwrap();

    assert_eq!(out.submission_errors.len(), 3);
    let results = read_results(&work.path().join("results.json"));
    let joined = results["submission_errors"].as_str().unwrap();
    assert_eq!(joined.lines().count(), 3);
    assert!(joined.contains("/textDateAnnotations"));
}

#[tokio::test]
async fn test_validation_is_deterministic() {
    let mut verdicts = Vec::new();
    for _ in 0..2 {
        let work = common::temp_dir();
        let config = common::test_config(work.path());
        let engine = running_submission().await;
        engine
            .queue_run("9712345_probe_tool", MockRun::success(TOOL))
            .await;
        engine
            .queue_run("9712345_probe_ui", MockRun::failure(22, "404"))
            .await;

        let mut harness = common::harness(&engine, &config, work.path());
        run(&mut harness, &args(work.path(), "1.0.1"), &config)
            .await
            .unwrap();
        verdicts.push(read_results(&work.path().join("results.json")));
    }

    assert_eq!(verdicts[0], verdicts[1]);
}

#[tokio::test]
async fn test_missing_container_is_fatal_without_results() {
    let work = common::temp_dir();
    let config = common::test_config(work.path());
    let engine = MockEngine::new();

    let mut harness = common::harness(&engine, &config, work.path());
    let err = run(&mut harness, &args(work.path(), "1.0.1"), &config)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("No container found for submission 9712345"));
    assert!(!work.path().join("results.json").exists());
    assert!(engine.runs().await.is_empty());
}

#[tokio::test]
async fn test_exited_container_counts_as_missing() {
    let work = common::temp_dir();
    let config = common::test_config(work.path());
    let engine = MockEngine::new();
    engine
        .insert_container("9712345", ContainerState::Exited, "submission")
        .await;

    let mut harness = common::harness(&engine, &config, work.path());
    let result = run(&mut harness, &args(work.path(), "1.0.1"), &config).await;

    assert!(result.is_err());
    assert_eq!(engine.removed_containers().await, vec!["9712345"]);
}

#[tokio::test]
async fn test_fatal_validation_error_removes_submission() {
    let work = common::temp_dir();
    let config = common::test_config(work.path());
    let engine = MockEngine::new();
    engine
        .insert_detached_container("9712345", ContainerState::Running)
        .await;

    let mut harness = common::harness(&engine, &config, work.path());
    let err = run(&mut harness, &args(work.path(), "1.0.1"), &config)
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("not attached to network 'submission'"));
    assert!(!work.path().join("results.json").exists());
    assert!(engine.container_names().await.is_empty());
    assert_eq!(engine.removed_images().await, vec!["sha256:9712345"]);
}

#[tokio::test]
async fn test_unwritable_results_removes_submission() {
    let work = common::temp_dir();
    let config = common::test_config(work.path());
    let engine = running_submission().await;
    script_conforming(&engine).await;

    let mut harness = common::harness(&engine, &config, work.path());
    let mut args = args(work.path(), "1.0.1");
    args.results = work.path().join("missing-dir").join("results.json");

    let err = run(&mut harness, &args, &config).await.unwrap_err();

    assert!(err.to_string().contains("Failed to write results"));
    assert!(engine.container_names().await.is_empty());
    assert_eq!(engine.removed_images().await, vec!["sha256:9712345"]);
}
