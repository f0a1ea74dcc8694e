//! Price source trait definitions.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::types::{Market, PriceRecord, Reported};

/// A source of one market's daily closing prices.
///
/// `fetch` never fails for recoverable conditions (network errors, decode
/// failures, empty tables). Those produce an empty record set plus
/// diagnostics, so callers can queue the date for a retry.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch all closing prices published for `date`.
    async fn fetch(&self, date: NaiveDate) -> Reported<Vec<PriceRecord>>;

    /// The market this source reads.
    fn market(&self) -> Market;

    /// Get the source name.
    fn name(&self) -> &str;
}
