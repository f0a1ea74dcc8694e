//! Multi-market collection over a date range with a deferred retry pass.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use breakout_core::error::DataError;
use breakout_core::traits::PriceSource;
use breakout_core::types::{Diagnostic, DiagnosticKind, Market, PriceRecord, Reported};
use breakout_core::TradingCalendar;
use tracing::{debug, info};

use crate::pacer::RequestPacer;

/// One (trading day, market) fetch unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FetchKey {
    pub date: NaiveDate,
    pub market: Market,
}

impl fmt::Display for FetchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.market, self.date)
    }
}

/// Everything gathered over a range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collection {
    /// All records, in fetch order
    pub records: Vec<PriceRecord>,
    /// Pairs that came back empty on the first pass, in encounter order
    pub retry_queue: Vec<FetchKey>,
    /// Pairs still empty after the retry pass
    pub unresolved: Vec<FetchKey>,
    /// Trading days enumerated for the range
    pub trading_days: Vec<NaiveDate>,
}

impl Collection {
    /// Queued pairs that the retry pass filled in.
    pub fn recovered(&self) -> Vec<FetchKey> {
        self.retry_queue
            .iter()
            .filter(|key| !self.unresolved.contains(key))
            .copied()
            .collect()
    }
}

/// Drives every price source across the trading days of a range.
///
/// Requests are strictly sequential: all dates in chronological order, each
/// date's sources in market order, then at most one retry pass.
pub struct RangeCollector {
    calendar: TradingCalendar,
    sources: Vec<Box<dyn PriceSource>>,
    pacer: RequestPacer,
}

impl RangeCollector {
    pub fn new(
        calendar: TradingCalendar,
        mut sources: Vec<Box<dyn PriceSource>>,
        pacer: RequestPacer,
    ) -> Self {
        sources.sort_by_key(|s| s.market());
        Self {
            calendar,
            sources,
            pacer,
        }
    }

    pub fn calendar(&self) -> &TradingCalendar {
        &self.calendar
    }

    /// Markets served, in fetch order.
    pub fn markets(&self) -> Vec<Market> {
        self.sources.iter().map(|s| s.market()).collect()
    }

    /// Collect every market's records for the trading days in `[start, end]`.
    ///
    /// Any positive `max_retries` enables exactly one retry pass over the
    /// pairs that came back empty. Fails only when nothing at all was
    /// obtained.
    pub async fn collect(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        max_retries: u32,
    ) -> Result<Reported<Collection>, DataError> {
        let trading_days: Vec<NaiveDate> = self.calendar.trading_days(start, end).collect();
        info!(
            %start,
            %end,
            trading_days = trading_days.len(),
            markets = self.sources.len(),
            delay = ?self.pacer.delay(),
            "Collecting closing prices"
        );

        let mut reported = Reported::new(Collection {
            trading_days,
            ..Collection::default()
        });

        for date in reported.value.trading_days.clone() {
            for source in &self.sources {
                let records = self.fetch_one(source.as_ref(), date, &mut reported).await;
                if records.is_empty() {
                    let key = FetchKey {
                        date,
                        market: source.market(),
                    };
                    reported.push(
                        Diagnostic::warning(
                            DiagnosticKind::RetryQueued,
                            format!("No records from {}; queued for retry", source.name()),
                        )
                        .with_market(key.market)
                        .with_date(date),
                    );
                    reported.value.retry_queue.push(key);
                } else {
                    reported.value.records.extend(records);
                }
            }
        }

        let queue = reported.value.retry_queue.clone();
        if !queue.is_empty() && max_retries > 0 {
            info!(pending = queue.len(), "Retrying empty fetches");
        }

        for key in queue {
            let retried = match (max_retries > 0, self.source_for(key.market)) {
                (true, Some(source)) => self.fetch_one(source, key.date, &mut reported).await,
                _ => Vec::new(),
            };

            if retried.is_empty() {
                reported.push(
                    Diagnostic::error(
                        DiagnosticKind::RetryExhausted,
                        "Still no records; leaving a gap in the history",
                    )
                    .with_market(key.market)
                    .with_date(key.date),
                );
                reported.value.unresolved.push(key);
            } else {
                reported.push(
                    Diagnostic::info(
                        DiagnosticKind::RetryRecovered,
                        format!("Retry recovered {} records", retried.len()),
                    )
                    .with_market(key.market)
                    .with_date(key.date),
                );
                reported.value.records.extend(retried);
            }
        }

        let collection = &reported.value;
        let summary = Diagnostic::info(
            DiagnosticKind::CollectionSummary,
            format!(
                "{} records over {} trading days; {} queued for retry, {} unresolved",
                collection.records.len(),
                collection.trading_days.len(),
                collection.retry_queue.len(),
                collection.unresolved.len()
            ),
        );
        reported.push(summary);

        if reported.value.records.is_empty() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(reported)
    }

    fn source_for(&self, market: Market) -> Option<&dyn PriceSource> {
        self.sources
            .iter()
            .find(|s| s.market() == market)
            .map(|s| s.as_ref())
    }

    async fn fetch_one(
        &self,
        source: &dyn PriceSource,
        date: NaiveDate,
        reported: &mut Reported<Collection>,
    ) -> Vec<PriceRecord> {
        self.pacer.wait().await;
        let (records, diagnostics) = source.fetch(date).await.into_parts();
        debug!(market = %source.market(), %date, records = records.len(), "Fetched");
        reported.absorb(diagnostics);
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory source that fails a configured number of times per date.
    struct ScriptedSource {
        market: Market,
        failures: Mutex<HashMap<NaiveDate, usize>>,
        calls: Mutex<Vec<NaiveDate>>,
    }

    impl ScriptedSource {
        fn new(market: Market) -> Self {
            Self {
                market,
                failures: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(self, date: NaiveDate, times: usize) -> Self {
            self.failures.lock().unwrap().insert(date, times);
            self
        }

        fn calls_for(&self, date: NaiveDate) -> usize {
            self.calls.lock().unwrap().iter().filter(|d| **d == date).count()
        }
    }

    #[async_trait]
    impl PriceSource for ScriptedSource {
        async fn fetch(&self, date: NaiveDate) -> Reported<Vec<PriceRecord>> {
            self.calls.lock().unwrap().push(date);
            let mut failures = self.failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(&date) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Reported::new(Vec::new());
                }
            }
            let id = match self.market {
                Market::Primary => "2330",
                Market::Secondary => "6488",
            };
            Reported::new(vec![PriceRecord::new(id, id, dec!(100), date, self.market)])
        }

        fn market(&self) -> Market {
            self.market
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    /// Wraps a shared source so tests keep a handle for call counting.
    struct Shared(std::sync::Arc<ScriptedSource>);

    #[async_trait]
    impl PriceSource for Shared {
        async fn fetch(&self, date: NaiveDate) -> Reported<Vec<PriceRecord>> {
            self.0.fetch(date).await
        }
        fn market(&self) -> Market {
            self.0.market()
        }
        fn name(&self) -> &str {
            self.0.name()
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn collector(sources: Vec<Box<dyn PriceSource>>) -> RangeCollector {
        RangeCollector::new(TradingCalendar::default(), sources, RequestPacer::disabled())
    }

    #[tokio::test]
    async fn test_collects_only_trading_days() {
        let rc = collector(vec![
            Box::new(ScriptedSource::new(Market::Secondary)),
            Box::new(ScriptedSource::new(Market::Primary)),
        ]);
        assert_eq!(rc.markets(), vec![Market::Primary, Market::Secondary]);

        // Mon 4th .. Sun 10th
        let reported = rc.collect(d(4), d(10), 3).await.unwrap();
        let collection = &reported.value;
        assert_eq!(collection.trading_days.len(), 5);
        assert_eq!(collection.records.len(), 10);
        assert!(collection.retry_queue.is_empty());
        assert!(reported.has_kind(DiagnosticKind::CollectionSummary));

        // Primary before secondary on each date
        assert_eq!(collection.records[0].market, Market::Primary);
        assert_eq!(collection.records[1].market, Market::Secondary);
    }

    #[tokio::test]
    async fn test_one_market_down_retried_exactly_once() {
        let primary = std::sync::Arc::new(ScriptedSource::new(Market::Primary));
        let secondary =
            std::sync::Arc::new(ScriptedSource::new(Market::Secondary).failing(d(6), 1));
        let rc = collector(vec![
            Box::new(Shared(primary.clone())),
            Box::new(Shared(secondary.clone())),
        ]);

        let reported = rc.collect(d(4), d(8), 3).await.unwrap();
        let collection = &reported.value;

        let key = FetchKey {
            date: d(6),
            market: Market::Secondary,
        };
        assert_eq!(collection.retry_queue, vec![key]);
        assert!(collection.unresolved.is_empty());
        assert_eq!(collection.recovered(), vec![key]);
        assert_eq!(collection.records.len(), 10);
        assert_eq!(secondary.calls_for(d(6)), 2);
        assert_eq!(primary.calls_for(d(6)), 1);
        assert!(reported.has_kind(DiagnosticKind::RetryRecovered));
    }

    #[tokio::test]
    async fn test_persistent_failure_left_unresolved() {
        let secondary =
            std::sync::Arc::new(ScriptedSource::new(Market::Secondary).failing(d(5), 10));
        let rc = collector(vec![
            Box::new(ScriptedSource::new(Market::Primary)),
            Box::new(Shared(secondary.clone())),
        ]);

        let reported = rc.collect(d(4), d(5), 3).await.unwrap();
        let key = FetchKey {
            date: d(5),
            market: Market::Secondary,
        };
        assert_eq!(reported.value.unresolved, vec![key]);
        // One first-pass attempt plus a single retry pass
        assert_eq!(secondary.calls_for(d(5)), 2);
        assert!(reported.has_kind(DiagnosticKind::RetryExhausted));
        assert_eq!(reported.value.records.len(), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_skips_retry_pass() {
        let secondary =
            std::sync::Arc::new(ScriptedSource::new(Market::Secondary).failing(d(4), 1));
        let rc = collector(vec![Box::new(Shared(secondary.clone()))]);

        let reported = rc.collect(d(4), d(5), 0).await.unwrap();
        assert_eq!(reported.value.unresolved.len(), 1);
        assert_eq!(secondary.calls_for(d(4)), 1);
    }

    #[tokio::test]
    async fn test_no_data_at_all() {
        let rc = collector(vec![Box::new(
            ScriptedSource::new(Market::Primary).failing(d(4), 5),
        )]);
        let result = rc.collect(d(4), d(4), 3).await;
        assert!(matches!(result, Err(DataError::NoDataAvailable)));

        // A weekend-only range has no trading days
        let result = rc.collect(d(9), d(10), 3).await;
        assert!(matches!(result, Err(DataError::NoDataAvailable)));
    }
}
