//! Analysis run orchestration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use breakout_core::error::{CalendarError, DataError, ExportError, IndicatorError};
use breakout_core::types::BreakoutOutcome;
use breakout_data::{CsvExporter, RangeCollector};
use breakout_indicators::MovingAverageEngine;
use breakout_strategies::{BreakoutConfig, BreakoutFilter};
use thiserror::Error;
use tracing::{info, warn};

use crate::report::{AnalysisReport, CollectionStats, ExportedFiles};

/// Analysis run errors.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Analysis aborted: no price data collected between {start} and {end}")]
    NoData { start: NaiveDate, end: NaiveDate },

    #[error("Calendar error: {0}")]
    Calendar(#[from] CalendarError),

    #[error("Data error: {0}")]
    Data(DataError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Analysis run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Moving average windows
    pub windows: Vec<usize>,
    /// Trading days of history collected before the run date
    pub history_trading_days: u32,
    /// Extra calendar days added in front of the history
    pub buffer_days: u32,
    /// Positive enables the single retry pass
    pub max_retries: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            windows: vec![5, 10, 20],
            history_trading_days: 60,
            buffer_days: 10,
            max_retries: 3,
        }
    }
}

/// Runs one complete breakout analysis.
pub struct AnalysisEngine {
    config: AnalysisConfig,
    collector: RangeCollector,
    exporter: CsvExporter,
    averages: MovingAverageEngine,
    filter: BreakoutFilter,
}

impl AnalysisEngine {
    /// Create a new analysis engine; fails on invalid windows.
    pub fn new(
        config: AnalysisConfig,
        collector: RangeCollector,
        exporter: CsvExporter,
    ) -> Result<Self, AnalysisError> {
        let averages = MovingAverageEngine::new(&config.windows)?;
        let filter = BreakoutFilter::new(BreakoutConfig {
            windows: config.windows.clone(),
        })?;
        Ok(Self {
            config,
            collector,
            exporter,
            averages,
            filter,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Reference dates for a run on `today`: (start, previous, run date).
    pub fn resolve_dates(
        &self,
        today: NaiveDate,
    ) -> Result<(NaiveDate, NaiveDate, NaiveDate), CalendarError> {
        let calendar = self.collector.calendar();
        let run_date = calendar.latest_trading_day(today)?;
        let previous = calendar.previous_trading_day(run_date)?;
        let start = calendar.start_date_for(
            run_date,
            self.config.history_trading_days,
            self.config.buffer_days,
        )?;
        Ok((start, previous, run_date))
    }

    /// Run the analysis for `today`.
    ///
    /// A non-trading `today` resolves to the latest trading day before it.
    /// Every run that collects any data writes all three export files and
    /// returns a report, even with zero matches or a missing reference date.
    pub async fn run(&self, today: NaiveDate) -> Result<AnalysisReport, AnalysisError> {
        let (start, previous, run_date) = self.resolve_dates(today)?;
        if run_date != today {
            info!(%today, %run_date, "Not a trading day; using latest trading day");
        }
        info!(%start, %previous, %run_date, windows = ?self.averages.windows(), "Starting analysis");

        let collected = self
            .collector
            .collect(start, run_date, self.config.max_retries)
            .await
            .map_err(|e| match e {
                DataError::NoDataAvailable => AnalysisError::NoData {
                    start,
                    end: run_date,
                },
                other => AnalysisError::Data(other),
            })?;
        let (collection, mut diagnostics) = collected.into_parts();

        let raw = self.exporter.write_raw(run_date, &collection.records)?;

        let (rows, ma_diagnostics) = self.averages.compute(&collection.records).into_parts();
        diagnostics.extend(ma_diagnostics);
        let windows = self.averages.windows();
        let enriched = self.exporter.write_enriched(run_date, &rows, &windows)?;

        let (outcome, filter_diagnostics) = self.filter.select(&rows, previous, run_date).into_parts();
        diagnostics.extend(filter_diagnostics);
        let results = self.exporter.write_breakouts(
            run_date,
            outcome.matches(),
            &windows,
            previous,
            run_date,
        )?;

        match &outcome {
            BreakoutOutcome::MissingReferenceDate(date) => {
                warn!(%date, "Reference date has no data; no breakouts evaluated")
            }
            BreakoutOutcome::Matches(matches) => {
                info!(matches = matches.len(), "Analysis complete")
            }
        }

        Ok(AnalysisReport {
            run_date,
            previous_date: previous,
            start_date: start,
            windows,
            outcome,
            collection: CollectionStats::from_collection(&collection),
            exported: ExportedFiles {
                raw,
                enriched,
                results,
            },
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use breakout_core::traits::PriceSource;
    use breakout_core::types::{DiagnosticKind, Market, PriceRecord, Reported};
    use breakout_core::TradingCalendar;
    use breakout_data::RequestPacer;
    use chrono::Datelike;
    use rust_decimal::Decimal;
    use std::collections::HashSet;

    /// "2330" declines steadily then jumps on `jump_on`; "1101" is flat.
    struct SyntheticSource {
        jump_on: NaiveDate,
        silent_on: HashSet<NaiveDate>,
    }

    #[async_trait]
    impl PriceSource for SyntheticSource {
        async fn fetch(&self, date: NaiveDate) -> Reported<Vec<PriceRecord>> {
            if self.silent_on.contains(&date) {
                return Reported::new(Vec::new());
            }
            let declining = Decimal::from(1_000_000 - date.num_days_from_ce());
            let close = if date == self.jump_on {
                Decimal::from(2_000_000)
            } else {
                declining
            };
            Reported::new(vec![
                PriceRecord::new("2330", "台積電", close, date, Market::Primary),
                PriceRecord::new("1101", "台泥", Decimal::from(50), date, Market::Primary),
            ])
        }

        fn market(&self) -> Market {
            Market::Primary
        }

        fn name(&self) -> &str {
            "synthetic"
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn engine(source: SyntheticSource, dir: &std::path::Path) -> AnalysisEngine {
        let collector = RangeCollector::new(
            TradingCalendar::default(),
            vec![Box::new(source)],
            RequestPacer::disabled(),
        );
        let exporter = CsvExporter::new(dir, "tw_stock_ma_breakthrough_{date}.csv", true).unwrap();
        AnalysisEngine::new(AnalysisConfig::default(), collector, exporter).unwrap()
    }

    #[test]
    fn test_invalid_windows_rejected() {
        let collector = RangeCollector::new(TradingCalendar::default(), vec![], RequestPacer::disabled());
        let exporter = CsvExporter::new("out", "r_{date}.csv", false).unwrap();
        let config = AnalysisConfig {
            windows: vec![5, 0],
            ..AnalysisConfig::default()
        };
        assert!(AnalysisEngine::new(config, collector, exporter).is_err());
    }

    #[tokio::test]
    async fn test_run_finds_breakout() {
        let dir = tempfile::tempdir().unwrap();
        let source = SyntheticSource {
            jump_on: d(8),
            silent_on: HashSet::new(),
        };
        let engine = engine(source, dir.path());

        // Saturday resolves to Friday the 8th
        let report = engine.run(d(9)).await.unwrap();
        assert_eq!(report.run_date, d(8));
        assert_eq!(report.previous_date, d(7));
        assert!(report.start_date < NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(report.collection.trading_days >= 60);
        assert_eq!(report.collection.securities, 2);

        let ids: Vec<&str> = report
            .outcome
            .matches()
            .iter()
            .map(|m| m.security_id.as_str())
            .collect();
        assert_eq!(ids, vec!["2330"]);

        assert!(report.exported.raw.ends_with("raw_stock_data_20240308.csv"));
        assert!(report.exported.enriched.ends_with("stock_data_with_ma_20240308.csv"));
        assert!(report
            .exported
            .results
            .ends_with("tw_stock_ma_breakthrough_20240308.csv"));
        for path in [&report.exported.raw, &report.exported.enriched, &report.exported.results] {
            assert!(path.exists());
        }
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::FilterSummary));
    }

    #[tokio::test]
    async fn test_run_missing_reference_date() {
        let dir = tempfile::tempdir().unwrap();
        let source = SyntheticSource {
            jump_on: d(8),
            silent_on: [d(8)].into_iter().collect(),
        };
        let report = engine(source, dir.path()).run(d(8)).await.unwrap();

        assert_eq!(report.outcome, BreakoutOutcome::MissingReferenceDate(d(8)));
        assert_eq!(report.collection.unresolved.len(), 1);
        assert!(report.exported.results.exists());
    }

    #[tokio::test]
    async fn test_run_without_any_data() {
        let dir = tempfile::tempdir().unwrap();
        let all_days: HashSet<NaiveDate> = NaiveDate::from_ymd_opt(2023, 9, 1)
            .unwrap()
            .iter_days()
            .take(240)
            .collect();
        let source = SyntheticSource {
            jump_on: d(8),
            silent_on: all_days,
        };

        let result = engine(source, dir.path()).run(d(8)).await;
        assert!(matches!(result, Err(AnalysisError::NoData { .. })));
    }
}
