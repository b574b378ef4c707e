//! annotator-harness CLI entry point.

use clap::Parser;

use annotator_harness::cli::{handle_error, Cli, Commands};
use annotator_harness::infrastructure::config::ConfigLoader;
use annotator_harness::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };
    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Execute(args) => {
            annotator_harness::cli::commands::execute::execute(args, &config, cli.json).await
        }
        Commands::Validate(args) => {
            annotator_harness::cli::commands::validate::execute(args, &config, cli.json).await
        }
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
