//! Validate configuration command.

use anyhow::Result;
use breakout_config::load_config;
use std::path::Path;

pub async fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    let config = match load_config(config_path).and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    };

    println!("Configuration is valid!");
    println!();
    println!("Export path: {}", config.export.path.display());
    println!("Results file: {}", config.export.filename);
    println!("Holidays: {}", config.calendar.holidays.len());
    println!("Request delay: {} ms", config.fetch.request_delay_ms);
    println!("Request timeout: {} s", config.fetch.timeout_secs);
    println!("Retry pass: {}", config.fetch.max_retries > 0);
    println!("Encodings: {}", config.fetch.encodings.join(", "));
    println!("Windows: {:?}", config.analysis.windows);
    println!(
        "History: {} trading days + {} buffer days",
        config.analysis.history_trading_days, config.analysis.buffer_days
    );
    println!("Log level: {}", config.logging.level);
    match config.log_dir() {
        Some(dir) => println!("Log directory: {}", dir.display()),
        None => println!("Log directory: (stdout only)"),
    }

    Ok(())
}
