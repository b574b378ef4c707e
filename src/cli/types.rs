//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::execute::ExecuteArgs;
use crate::cli::commands::validate::ValidateArgs;

#[derive(Parser, Debug)]
#[command(name = "annotator-harness")]
#[command(about = "Run and validate containerized annotator submissions", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./harness.yaml when present)
    #[arg(long, global = true, env = "HARNESS_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch a submission and annotate the input notes with it
    Execute(ExecuteArgs),

    /// Check a running submission against the annotator API contract
    Validate(ValidateArgs),
}
