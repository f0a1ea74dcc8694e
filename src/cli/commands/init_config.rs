//! Default configuration command.

use anyhow::{bail, Result};
use breakout_config::AppConfig;
use std::path::Path;

use crate::cli::InitConfigArgs;

pub async fn run(args: InitConfigArgs, config_path: &Path) -> Result<()> {
    if config_path.exists() && !args.force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            config_path.display()
        );
    }

    AppConfig::write_default(config_path)?;
    println!("Wrote default configuration to {}", config_path.display());
    Ok(())
}
