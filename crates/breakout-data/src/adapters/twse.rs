use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;
use breakout_core::types::Market;

use super::{split_fields, ColumnMap, MarketAdapter};

const BASE_URL: &str = "https://www.twse.com.tw/exchangeReport/MI_INDEX";

const CODE_LABEL: &str = "證券代號";
const NAME_LABEL: &str = "證券名稱";
const CLOSE_LABEL: &str = "收盤價";

fn row_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"^=?"\d{4,}""#).expect("row pattern is a valid regex"))
}

/// Taiwan Stock Exchange daily quotes (`MI_INDEX`, all securities except warrants).
#[derive(Debug, Clone, Default)]
pub struct TwseAdapter;

impl TwseAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl MarketAdapter for TwseAdapter {
    fn market(&self) -> Market {
        Market::Primary
    }

    fn request_url(&self, date: NaiveDate) -> String {
        format!(
            "{}?response=csv&date={}&type=ALLBUT0999",
            BASE_URL,
            date.format("%Y%m%d")
        )
    }

    fn header_columns(&self, line: &str) -> Option<ColumnMap> {
        let quoted = |label: &str| line.contains(&format!("\"{}\"", label));
        if !(quoted(CODE_LABEL) && quoted(NAME_LABEL) && quoted(CLOSE_LABEL)) {
            return None;
        }

        let fields = split_fields(line);
        let position = |label: &str| fields.iter().position(|f| f == label);
        Some(ColumnMap {
            code: position(CODE_LABEL)?,
            name: position(NAME_LABEL)?,
            close: position(CLOSE_LABEL)?,
        })
    }

    fn accepts_row(&self, line: &str) -> bool {
        row_pattern().is_match(line.trim_start())
    }

    fn is_end_of_table(&self, line: &str) -> bool {
        line.contains("==========")
    }
}
