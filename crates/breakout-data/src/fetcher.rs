//! Daily closing-price fetcher shared by both markets.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use breakout_core::error::DataError;
use breakout_core::traits::{HttpClient, HttpRequest, PriceSource};
use breakout_core::types::{Diagnostic, DiagnosticKind, Market, PriceRecord, Reported, Severity};
use tracing::debug;

use crate::adapters::{split_fields, ColumnMap, MarketAdapter};
use crate::decode::BodyDecoder;

/// Desktop browser identity; both exchanges reject obvious scripts.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Request settings shared by all fetchers.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub user_agent: String,
    pub timeout: Duration,
    /// Candidate body encodings, tried in order
    pub encodings: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            encodings: vec!["utf-8".to_string(), "big5".to_string()],
        }
    }
}

/// Fetches one market's daily table and normalizes it into price records.
pub struct SourceFetcher {
    adapter: Box<dyn MarketAdapter>,
    client: Arc<dyn HttpClient>,
    decoder: BodyDecoder,
    user_agent: String,
    timeout: Duration,
    name: String,
}

impl SourceFetcher {
    /// Create a fetcher; fails only if an encoding label is unknown.
    pub fn new(
        adapter: Box<dyn MarketAdapter>,
        client: Arc<dyn HttpClient>,
        settings: &FetchSettings,
    ) -> Result<Self, DataError> {
        let decoder = BodyDecoder::new(&settings.encodings)?;
        let name = format!("{} daily quotes", adapter.market());
        Ok(Self {
            adapter,
            client,
            decoder,
            user_agent: settings.user_agent.clone(),
            timeout: settings.timeout,
            name,
        })
    }

    fn request(&self, date: NaiveDate) -> HttpRequest {
        HttpRequest::get(self.adapter.request_url(date))
            .with_header("User-Agent", self.user_agent.as_str())
            .with_header("Accept", "text/csv,text/plain,*/*")
            .with_header("Accept-Language", "zh-TW,zh;q=0.9,en;q=0.8")
            .with_timeout(self.timeout)
    }
}

#[async_trait]
impl PriceSource for SourceFetcher {
    async fn fetch(&self, date: NaiveDate) -> Reported<Vec<PriceRecord>> {
        let market = self.adapter.market();
        let mut reported = Reported::new(Vec::new());
        let note = |severity, kind, message: String| {
            Diagnostic::new(severity, kind, message)
                .with_market(market)
                .with_date(date)
        };

        let request = self.request(date);
        let url = request.url.clone();
        let response = match self.client.get(request).await {
            Ok(response) => response,
            Err(e) => {
                reported.push(note(
                    Severity::Error,
                    DiagnosticKind::FetchFailed,
                    format!("Request failed: {}", e),
                ));
                return reported;
            }
        };

        if !response.is_success() {
            let error = DataError::HttpStatus {
                status: response.status,
                url,
            };
            reported.push(note(
                Severity::Error,
                DiagnosticKind::HttpStatus,
                error.to_string(),
            ));
            return reported;
        }

        let Some((text, encoding)) = self.decoder.decode(&response.body) else {
            reported.push(note(
                Severity::Error,
                DiagnosticKind::DecodeFailed,
                format!(
                    "Body of {} bytes could not be decoded as any of {:?}",
                    response.body.len(),
                    self.decoder.names()
                ),
            ));
            return reported;
        };
        debug!(%market, %date, encoding, bytes = response.body.len(), "Decoded response");

        if self.adapter.reports_no_data(&text) {
            reported.push(note(
                Severity::Warning,
                DiagnosticKind::NoDataPage,
                "Exchange reports no data for this date".to_string(),
            ));
            return reported;
        }

        let table = parse_daily_table(self.adapter.as_ref(), &text, date);
        reported.absorb(table.diagnostics);
        reported.value = table.value;
        reported
    }

    fn market(&self) -> Market {
        self.adapter.market()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Extract price records from a decoded daily document.
///
/// Rows are kept in document order. A code seen twice keeps its first row.
pub fn parse_daily_table(
    adapter: &dyn MarketAdapter,
    text: &str,
    date: NaiveDate,
) -> Reported<Vec<PriceRecord>> {
    let market = adapter.market();
    let mut reported = Reported::new(Vec::new());
    let note = |severity, kind, message: String| {
        Diagnostic::new(severity, kind, message)
            .with_market(market)
            .with_date(date)
    };

    let mut lines = text.lines();
    let columns = loop {
        match lines.next() {
            Some(line) => {
                if let Some(columns) = adapter.header_columns(line) {
                    break columns;
                }
            }
            None => {
                reported.push(note(
                    Severity::Warning,
                    DiagnosticKind::HeaderNotFound,
                    "Table header not found".to_string(),
                ));
                return reported;
            }
        }
    };

    let mut seen = HashSet::new();
    let mut rejected = 0usize;
    let mut duplicates = Vec::new();

    for line in lines {
        if adapter.is_end_of_table(line) {
            break;
        }
        if !adapter.accepts_row(line) {
            continue;
        }

        match parse_row(&split_fields(line), &columns) {
            Some((code, name, close)) => {
                if seen.insert(code.clone()) {
                    reported
                        .value
                        .push(PriceRecord::new(code, name, close, date, market));
                } else {
                    duplicates.push(code);
                }
            }
            None => rejected += 1,
        }
    }

    if rejected > 0 {
        reported.push(note(
            Severity::Info,
            DiagnosticKind::RowRejected,
            format!(
                "{} rows dropped (unparseable or non-positive close, or non-numeric code)",
                rejected
            ),
        ));
    }
    if !duplicates.is_empty() {
        reported.push(note(
            Severity::Warning,
            DiagnosticKind::DuplicateRow,
            format!(
                "{} duplicate rows ignored: {}",
                duplicates.len(),
                duplicates.join(", ")
            ),
        ));
    }

    if reported.value.is_empty() {
        reported.push(note(
            Severity::Warning,
            DiagnosticKind::EmptyTable,
            "Table contained no usable rows".to_string(),
        ));
    } else {
        debug!(%market, %date, records = reported.value.len(), "Parsed daily table");
    }

    reported
}

fn parse_row(fields: &[String], columns: &ColumnMap) -> Option<(String, String, Decimal)> {
    if fields.len() <= columns.max_index() {
        return None;
    }

    let code = fields[columns.code].as_str();
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let close = Decimal::from_str(&fields[columns.close].replace(',', "")).ok()?;
    if close <= Decimal::ZERO {
        return None;
    }

    Some((code.to_string(), fields[columns.name].clone(), close))
}
