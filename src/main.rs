//! Moving-average breakout scanner CLI application.

mod cli;

use anyhow::{Context, Result};
use breakout_config::load_or_init;
use breakout_monitor::setup_logging;
use clap::Parser;
use cli::{Cli, Commands};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cli_level = cli.log_level.map(|l| l.as_str());

    // Commands that manage the config file itself must not create it
    match cli.command {
        Commands::ValidateConfig => {
            let _logging = setup_logging(cli_level.unwrap_or("info"), cli.json_logs, None)?;
            return cli::commands::validate::run(&cli.config).await;
        }
        Commands::InitConfig(args) => {
            let _logging = setup_logging(cli_level.unwrap_or("info"), cli.json_logs, None)?;
            return cli::commands::init_config::run(args, &cli.config).await;
        }
        _ => {}
    }

    let (config, created) = load_or_init(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    config.validate().context("Invalid configuration")?;

    // Setup logging
    let log_level = cli_level.unwrap_or(config.logging.level.as_str());
    let logging = setup_logging(
        log_level,
        cli.json_logs || config.logging.json,
        config.log_dir().as_deref(),
    )
    .context("Failed to set up logging")?;
    if created {
        info!(path = %cli.config.display(), "Wrote default configuration");
    }
    if let Some(path) = logging.current_file() {
        info!(path = %path.display(), "Logging to daily file");
    }

    // Execute command
    match cli.command {
        Commands::Run(args) => cli::commands::run::run(args, &config).await,
        Commands::Fetch(args) => cli::commands::fetch::run(args, &config).await,
        Commands::Calendar(args) => cli::commands::calendar::run(args, &config).await,
        Commands::ValidateConfig | Commands::InitConfig(_) => Ok(()),
    }
}
