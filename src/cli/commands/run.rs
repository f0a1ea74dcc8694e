//! Analysis run command.

use anyhow::{Context, Result};
use breakout_analysis::{AnalysisEngine, AnalysisError};
use breakout_config::AppConfig;
use breakout_core::types::Market;
use breakout_data::{build_sources, CsvExporter, RangeCollector, ReqwestHttpClient, RequestPacer};
use chrono::Local;
use std::sync::Arc;
use tracing::{error, info};

use crate::cli::{OutputFormat, RunArgs};

pub async fn run(args: RunArgs, config: &AppConfig) -> Result<()> {
    let today = args.date.unwrap_or_else(|| Local::now().date_naive());
    info!("Starting breakout analysis for {}", today);

    let client = Arc::new(ReqwestHttpClient::new()?);
    let sources = build_sources(client, &config.fetch_settings(), Market::all())
        .context("Failed to build price sources")?;
    let collector = RangeCollector::new(
        config.calendar().context("Invalid calendar settings")?,
        sources,
        RequestPacer::new(config.request_delay()),
    );
    let exporter = CsvExporter::new(
        &config.export.path,
        &config.export.filename,
        config.export.write_bom,
    )?;
    let engine = AnalysisEngine::new(config.analysis_config(), collector, exporter)?;

    let report = match engine.run(today).await {
        Ok(report) => report,
        Err(e @ AnalysisError::NoData { .. }) => {
            error!("{}", e);
            return Err(e.into());
        }
        Err(e) => return Err(e).context("Analysis failed"),
    };

    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => println!("{}", report.summary()),
    }

    Ok(())
}
