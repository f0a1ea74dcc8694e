//! Single-day fetch command.

use anyhow::{Context, Result};
use breakout_config::AppConfig;
use breakout_core::types::Market;
use breakout_data::{build_sources, ReqwestHttpClient, RequestPacer};
use std::sync::Arc;

use crate::cli::FetchArgs;

pub async fn run(args: FetchArgs, config: &AppConfig) -> Result<()> {
    let markets: Vec<Market> = match args.market {
        Some(market) => vec![market],
        None => Market::all().to_vec(),
    };

    let calendar = config.calendar().context("Invalid calendar settings")?;
    if !calendar.is_trading_day(args.date) {
        println!("Note: {} is not a trading day per the configured calendar", args.date);
    }

    let client = Arc::new(ReqwestHttpClient::new()?);
    let sources = build_sources(client, &config.fetch_settings(), &markets)
        .context("Failed to build price sources")?;
    let pacer = RequestPacer::new(config.request_delay());

    for source in &sources {
        pacer.wait().await;
        let reported = source.fetch(args.date).await;

        println!();
        println!("{} ({}): {} records", source.name(), args.date, reported.value.len());
        for diagnostic in &reported.diagnostics {
            println!("  {:?}: {}", diagnostic.severity, diagnostic);
        }
        for record in reported.value.iter().take(args.show) {
            println!(
                "  {:<8} {:<16} {:>10}",
                record.security_id, record.security_name, record.close
            );
        }
        if reported.value.len() > args.show {
            println!("  ... {} more", reported.value.len() - args.show);
        }
    }

    Ok(())
}
