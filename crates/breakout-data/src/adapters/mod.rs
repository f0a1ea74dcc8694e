//! Per-market knowledge of the daily closing-price tables.
//!
//! Both exchanges publish one CSV-like document per trading day, but they
//! differ in URL scheme, header labels, row shape and how the table ends. A
//! [`MarketAdapter`] captures those differences so one fetcher can read both.

mod tpex;
mod twse;

pub use tpex::TpexAdapter;
pub use twse::TwseAdapter;

use chrono::NaiveDate;
use breakout_core::types::Market;

/// Column positions of the fields a price record needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub code: usize,
    pub name: usize,
    pub close: usize,
}

impl ColumnMap {
    /// Largest index referenced; rows shorter than this are unusable.
    pub fn max_index(&self) -> usize {
        self.code.max(self.name).max(self.close)
    }
}

/// Market-specific parsing rules for one exchange's daily table.
pub trait MarketAdapter: Send + Sync {
    /// Market the adapter reads.
    fn market(&self) -> Market;

    /// Download URL for one trading day.
    fn request_url(&self, date: NaiveDate) -> String;

    /// Whether the decoded document is an explicit "no data" page.
    fn reports_no_data(&self, _text: &str) -> bool {
        false
    }

    /// Column map if `line` is the table header.
    fn header_columns(&self, line: &str) -> Option<ColumnMap>;

    /// Whether `line` is a data row worth parsing.
    fn accepts_row(&self, line: &str) -> bool;

    /// Whether `line` terminates the table.
    fn is_end_of_table(&self, line: &str) -> bool;
}

/// Adapter for a market.
pub fn adapter_for(market: Market) -> Box<dyn MarketAdapter> {
    match market {
        Market::Primary => Box::new(TwseAdapter::new()),
        Market::Secondary => Box::new(TpexAdapter::new()),
    }
}

/// Split one line as CSV, honoring quotes, and clean every field.
pub(crate) fn split_fields(line: &str) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    let mut record = csv::StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => record.iter().map(clean_field).collect(),
        _ => Vec::new(),
    }
}

/// Strip whitespace, the `=` text marker and stray quotes.
pub(crate) fn clean_field(field: &str) -> String {
    let field = field.trim();
    let field = field.strip_prefix('=').unwrap_or(field);
    field.trim_matches('"').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_fields_quoted() {
        let fields = split_fields(r#""2330","台積電","1,020.00","""#);
        assert_eq!(fields, vec!["2330", "台積電", "1,020.00", ""]);
    }

    #[test]
    fn test_split_fields_text_marker() {
        let fields = split_fields(r#"="0050","元大台灣50","150.20""#);
        assert_eq!(fields[0], "0050");
        assert_eq!(fields[2], "150.20");
    }

    #[test]
    fn test_adapter_for_market() {
        assert_eq!(adapter_for(Market::Primary).market(), Market::Primary);
        assert_eq!(adapter_for(Market::Secondary).market(), Market::Secondary);
    }
}
