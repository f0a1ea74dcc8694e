//! Data acquisition for the breakout scanner.
//!
//! This crate turns the two exchanges' daily quote downloads into
//! [`PriceRecord`](breakout_core::types::PriceRecord)s:
//! - [`ReqwestHttpClient`]: production HTTP transport
//! - [`MarketAdapter`]s for TWSE and TPEx, driven by one [`SourceFetcher`]
//! - [`RangeCollector`]: paced, sequential collection over a date range with
//!   a deferred retry pass
//! - [`CsvExporter`]: the per-run CSV files

pub mod adapters;
mod collector;
mod decode;
mod export;
mod fetcher;
mod http;
mod pacer;

pub use adapters::{adapter_for, ColumnMap, MarketAdapter, TpexAdapter, TwseAdapter};
pub use collector::{Collection, FetchKey, RangeCollector};
pub use decode::BodyDecoder;
pub use export::{CsvExporter, DATE_PLACEHOLDER};
pub use fetcher::{parse_daily_table, FetchSettings, SourceFetcher, DEFAULT_USER_AGENT};
pub use http::ReqwestHttpClient;
pub use pacer::RequestPacer;

use std::sync::Arc;
use breakout_core::error::DataError;
use breakout_core::traits::{HttpClient, PriceSource};
use breakout_core::types::Market;

/// Build one fetcher per market over a shared HTTP client.
pub fn build_sources(
    client: Arc<dyn HttpClient>,
    settings: &FetchSettings,
    markets: &[Market],
) -> Result<Vec<Box<dyn PriceSource>>, DataError> {
    markets
        .iter()
        .map(|market| {
            SourceFetcher::new(adapter_for(*market), client.clone(), settings)
                .map(|fetcher| Box::new(fetcher) as Box<dyn PriceSource>)
        })
        .collect()
}
