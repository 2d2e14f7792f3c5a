//! `cloudsift` command line.

mod cli;
mod commands;
mod telemetry;

use anyhow::Context;
use clap::Parser;
use cloudsift_config::{Config, ConfigLoad, ConfigLoader};
use tracing::info;

use crate::cli::{Cli, Command, GlobalArgs, ScanArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Version => {
            println!("cloudsift {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Command::Init(init) => return commands::init::run(init),
        _ => {}
    }

    let scan_args = match &cli.command {
        Command::Scan(args) => Some(args),
        _ => None,
    };
    let config = load_config(&cli.global, scan_args)?;

    match cli.command {
        Command::Scan(args) => commands::scan::run(config, args.skip_cost).await,
        Command::List(list) => commands::list::run(list, &config),
        Command::Estimate(args) => commands::estimate::run(&config, args).await,
        Command::Version | Command::Init(_) => Ok(()),
    }
}

/// Loads the configuration, applies command line overrides and installs
/// logging.
fn load_config(global: &GlobalArgs, scan: Option<&ScanArgs>) -> anyhow::Result<Config> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &global.config {
        loader = loader.with_config_path(path);
    }
    let ConfigLoad {
        mut config,
        mut warnings,
    } = loader.load().context("failed to load configuration")?;

    global.apply(&mut config);
    if let Some(scan) = scan {
        scan.apply(&mut config);
    }
    warnings.merge(
        config
            .validate()
            .context("invalid command line override")?,
    );

    telemetry::init(&config.log_level, config.log_format);
    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = config.metadata.config_path() {
        info!(path = %path.display(), "configuration file loaded");
    }
    telemetry::log_warnings(&warnings);

    Ok(config)
}
