//! Calendar inspection command.

use anyhow::{Context, Result};
use breakout_config::AppConfig;
use chrono::Local;

use crate::cli::CalendarArgs;

pub async fn run(args: CalendarArgs, config: &AppConfig) -> Result<()> {
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let calendar = config.calendar().context("Invalid calendar settings")?;

    let latest = calendar.latest_trading_day(date)?;
    let previous = calendar.previous_trading_day(latest)?;
    let start = calendar.start_date_for(
        latest,
        config.analysis.history_trading_days,
        config.analysis.buffer_days,
    )?;

    println!("Date:                 {} ({})", date, date.format("%A"));
    println!("Trading day:          {}", calendar.is_trading_day(date));
    println!("Latest trading day:   {}", latest);
    println!("Previous trading day: {}", previous);
    println!(
        "History start:        {} ({} trading days through {})",
        start,
        calendar.count_trading_days(start, latest),
        latest
    );
    println!("Configured holidays:  {}", calendar.holidays().len());

    Ok(())
}
