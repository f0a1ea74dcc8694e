//! Daily closing-price records and per-security series.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Market;

/// One security's closing price on one trading day, as published by one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Numeric security code, e.g. "2330"
    pub security_id: String,
    /// Security short name as published by the exchange
    pub security_name: String,
    /// Closing price
    pub close: Decimal,
    /// Trading day the close belongs to
    pub trade_date: NaiveDate,
    /// Market the record was fetched from
    pub market: Market,
}

impl PriceRecord {
    /// Create a new price record.
    pub fn new(
        security_id: impl Into<String>,
        security_name: impl Into<String>,
        close: Decimal,
        trade_date: NaiveDate,
        market: Market,
    ) -> Self {
        Self {
            security_id: security_id.into(),
            security_name: security_name.into(),
            close,
            trade_date,
            market,
        }
    }

    /// Ordering key used wherever records must be processed deterministically.
    pub fn sort_key(&self) -> (&str, NaiveDate, Market) {
        (&self.security_id, self.trade_date, self.market)
    }
}

/// Chronologically ordered price history of a single security.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    /// Security identifier
    pub security_id: String,
    records: Vec<PriceRecord>,
}

impl PriceSeries {
    /// Build a series from records of one security, sorting by trade date.
    ///
    /// Records on the same date are ordered by market so the result does not
    /// depend on input order.
    pub fn new(security_id: impl Into<String>, mut records: Vec<PriceRecord>) -> Self {
        records.sort_by(|a, b| (a.trade_date, a.market).cmp(&(b.trade_date, b.market)));
        Self {
            security_id: security_id.into(),
            records,
        }
    }

    /// Group an arbitrary record set into per-security series, keyed by security id.
    pub fn group(records: &[PriceRecord]) -> BTreeMap<String, PriceSeries> {
        let mut grouped: BTreeMap<String, Vec<PriceRecord>> = BTreeMap::new();
        for record in records {
            grouped
                .entry(record.security_id.clone())
                .or_default()
                .push(record.clone());
        }
        grouped
            .into_iter()
            .map(|(id, recs)| (id.clone(), PriceSeries::new(id, recs)))
            .collect()
    }

    /// Get the number of observations.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the series is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get all records, oldest first.
    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    /// Extract close prices as a vector.
    pub fn closes(&self) -> Vec<Decimal> {
        self.records.iter().map(|r| r.close).collect()
    }

    /// Get the last record.
    pub fn last(&self) -> Option<&PriceRecord> {
        self.records.last()
    }
}

/// A price record enriched with moving averages.
///
/// `averages` holds one entry per requested window length. `None` means the
/// security did not have `window` observations up to and including this row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovingAverageRecord {
    pub record: PriceRecord,
    pub averages: BTreeMap<usize, Option<Decimal>>,
}

impl MovingAverageRecord {
    /// Get the average for a window, if it was requested and is defined.
    pub fn average(&self, window: usize) -> Option<Decimal> {
        self.averages.get(&window).copied().flatten()
    }

    /// True when the close is strictly below every given average.
    ///
    /// An undefined or missing average never satisfies the comparison.
    pub fn is_below_all(&self, windows: &[usize]) -> bool {
        !windows.is_empty()
            && windows
                .iter()
                .all(|w| self.average(*w).is_some_and(|ma| self.record.close < ma))
    }

    /// True when the close is strictly above every given average.
    pub fn is_above_all(&self, windows: &[usize]) -> bool {
        !windows.is_empty()
            && windows
                .iter()
                .all(|w| self.average(*w).is_some_and(|ma| self.record.close > ma))
    }
}
