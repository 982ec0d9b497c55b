mod config;
mod observability;

use clap::{Args, Parser, Subcommand};
use config::{Config, ConfigError};
use l10n_service::config::{Credentials, ValidationError};
use l10n_service::errors::ServiceError;
use observability::MetricsError;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "l10n-sync", about = "Keeps the localization table in sync")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Serve the sync handlers over HTTP
    Serve(ConfigArgs),
    /// Load and validate the config file, then exit
    Validate(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Credentials(#[from] ValidationError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        CliCommand::Validate(args) => {
            Config::from_file(&args.config)?;
            println!("{} is valid", args.config.display());
            Ok(())
        }
        CliCommand::Serve(args) => {
            let config = Config::from_file(&args.config)?;
            let _sentry = observability::init_logging(config.common.logging.as_ref());
            observability::init_metrics(config.common.metrics.as_ref())?;
            let credentials = Credentials::from_env()?;

            tracing::info!(config = %args.config.display(), "Starting l10n-sync");

            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            rt.block_on(l10n_service::run(config.l10n, credentials))?;
            Ok(())
        }
    }
}
