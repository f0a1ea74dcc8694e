//! End-to-end collection over a fake transport.

use async_trait::async_trait;
use breakout_core::error::DataError;
use breakout_core::traits::{HttpClient, HttpRequest, HttpResponse};
use breakout_core::types::{DiagnosticKind, Market};
use breakout_core::TradingCalendar;
use breakout_data::{build_sources, FetchKey, FetchSettings, RangeCollector, RequestPacer};
use chrono::NaiveDate;
use std::sync::{Arc, Mutex};

/// Serves fixed documents per market; TPEx times out on the first request
/// for one date.
struct FakeExchange {
    flaky_roc_date: &'static str,
    tpex_failures_left: Mutex<u32>,
    urls: Mutex<Vec<String>>,
}

impl FakeExchange {
    fn twse_doc(url: &str) -> String {
        let date = url
            .split("date=")
            .nth(1)
            .and_then(|s| s.split('&').next())
            .unwrap_or("");
        format!(
            "\"{} 每日收盤行情\"\n\"證券代號\",\"證券名稱\",\"收盤價\"\n\"2330\",\"台積電\",\"580.00\"\n\"2317\",\"鴻海\",\"105.5\"\n\"====================\"\n",
            date
        )
    }

    fn tpex_doc() -> String {
        "代號,名稱,收盤,漲跌\n6488,環球晶,500.00,+1\n總計,,,\n".to_string()
    }

    fn request_count(&self, needle: &str) -> usize {
        self.urls
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.contains(needle))
            .count()
    }
}

#[async_trait]
impl HttpClient for FakeExchange {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, DataError> {
        self.urls.lock().unwrap().push(request.url.clone());

        if request.url.contains("twse.com.tw") {
            return Ok(HttpResponse::new(200, Self::twse_doc(&request.url)));
        }

        if request.url.contains(self.flaky_roc_date) {
            let mut left = self.tpex_failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(DataError::Timeout(request.url));
            }
        }
        Ok(HttpResponse::new(200, Self::tpex_doc()))
    }
}

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

#[tokio::test]
async fn secondary_outage_is_retried_once_and_recovered() {
    let exchange = Arc::new(FakeExchange {
        flaky_roc_date: "d=113/03/06",
        tpex_failures_left: Mutex::new(1),
        urls: Mutex::new(Vec::new()),
    });
    let sources = build_sources(exchange.clone(), &FetchSettings::default(), Market::all()).unwrap();
    let collector = RangeCollector::new(TradingCalendar::default(), sources, RequestPacer::disabled());

    let reported = collector.collect(d(4), d(8), 3).await.unwrap();
    let collection = &reported.value;

    assert_eq!(collection.trading_days.len(), 5);
    let count = |market: Market| collection.records.iter().filter(|r| r.market == market).count();
    assert_eq!(count(Market::Primary), 10);
    assert_eq!(count(Market::Secondary), 5);
    assert_eq!(
        collection.retry_queue,
        vec![FetchKey {
            date: d(6),
            market: Market::Secondary
        }]
    );
    assert!(collection.unresolved.is_empty());

    assert!(reported.has_kind(DiagnosticKind::FetchFailed));
    assert!(reported.has_kind(DiagnosticKind::RetryRecovered));
    assert_eq!(exchange.request_count("d=113/03/06"), 2);
    assert_eq!(exchange.request_count("date=20240306"), 1);
}

#[tokio::test]
async fn holidays_are_not_requested() {
    let exchange = Arc::new(FakeExchange {
        flaky_roc_date: "never",
        tpex_failures_left: Mutex::new(0),
        urls: Mutex::new(Vec::new()),
    });
    let sources = build_sources(exchange.clone(), &FetchSettings::default(), &[Market::Primary]).unwrap();
    let calendar = TradingCalendar::new([d(5)]);
    let collector = RangeCollector::new(calendar, sources, RequestPacer::disabled());

    let reported = collector.collect(d(4), d(6), 3).await.unwrap();
    assert_eq!(reported.value.trading_days, vec![d(4), d(6)]);
    assert_eq!(exchange.request_count("date=20240305"), 0);
    assert_eq!(exchange.urls.lock().unwrap().len(), 2);
}
