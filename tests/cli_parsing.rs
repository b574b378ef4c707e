use annotator_harness::cli::{Cli, Commands};
use annotator_harness::domain::models::AnnotatorKind;
use clap::Parser;
use std::path::PathBuf;

#[test]
fn test_parse_execute() {
    let cli = Cli::try_parse_from(vec![
        "annotator-harness",
        "execute",
        "--submission-id",
        "9712345",
        "--docker-repository",
        "docker.synapse.org/syn1/date-annotator",
        "--docker-digest",
        "sha256:abc",
        "--data-notes",
        "notes.json",
        "--credentials",
        ".synapseConfig",
        "--parent-id",
        "syn42",
    ])
    .unwrap();

    assert!(!cli.json);
    match cli.command {
        Commands::Execute(args) => {
            assert_eq!(args.submission_id, "9712345");
            assert_eq!(args.docker_digest, "sha256:abc");
            assert_eq!(args.data_notes, PathBuf::from("notes.json"));
            assert_eq!(args.parent_id, "syn42");
            assert_eq!(args.annotator_kind, AnnotatorKind::Date);
            assert_eq!(args.workdir, PathBuf::from("."));
            assert!(!args.dry_run);
        }
        Commands::Validate(_) => panic!("Wrong command"),
    }
}

#[test]
fn test_parse_execute_short_flags_and_globals() {
    let cli = Cli::try_parse_from(vec![
        "annotator-harness",
        "execute",
        "-s",
        "9712345",
        "-p",
        "repo",
        "-d",
        "sha256:abc",
        "-i",
        "notes.json",
        "-c",
        "creds",
        "--parent-id",
        "syn42",
        "--annotator-kind",
        "person",
        "--dry-run",
        "--json",
        "--config",
        "ci.yaml",
    ])
    .unwrap();

    assert!(cli.json);
    assert_eq!(cli.config, Some(PathBuf::from("ci.yaml")));
    match cli.command {
        Commands::Execute(args) => {
            assert_eq!(args.annotator_kind, AnnotatorKind::Person);
            assert!(args.dry_run);
        }
        Commands::Validate(_) => panic!("Wrong command"),
    }
}

#[test]
fn test_parse_validate() {
    let cli = Cli::try_parse_from(vec![
        "annotator-harness",
        "--json",
        "validate",
        "--submission-id",
        "9712345",
        "--credentials",
        ".synapseConfig",
        "--results",
        "results.json",
        "--annotator-kind",
        "address",
        "--subset-data",
        "subset.json",
        "--schema-version",
        "1.0.1",
    ])
    .unwrap();

    assert!(cli.json);
    match cli.command {
        Commands::Validate(args) => {
            assert_eq!(args.results, PathBuf::from("results.json"));
            assert_eq!(args.annotator_kind, AnnotatorKind::Address);
            assert_eq!(args.schema_version, "1.0.1");
            assert_eq!(args.subset_data, "subset.json");
        }
        Commands::Execute(_) => panic!("Wrong command"),
    }
}

#[test]
fn test_validate_requires_schema_version() {
    let result = Cli::try_parse_from(vec![
        "annotator-harness",
        "validate",
        "--submission-id",
        "9712345",
        "--credentials",
        "c",
        "--results",
        "r.json",
        "--annotator-kind",
        "date",
        "--subset-data",
        "s",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_unknown_annotator_kind_is_rejected() {
    let result = Cli::try_parse_from(vec![
        "annotator-harness",
        "validate",
        "--submission-id",
        "9712345",
        "--credentials",
        "c",
        "--results",
        "r.json",
        "--annotator-kind",
        "phone",
        "--subset-data",
        "s",
        "--schema-version",
        "1.0.1",
    ]);
    assert!(result.is_err());
}
