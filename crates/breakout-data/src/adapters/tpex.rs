use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;
use breakout_core::types::Market;

use super::{clean_field, ColumnMap, MarketAdapter};

const BASE_URL: &str =
    "https://www.tpex.org.tw/web/stock/aftertrading/daily_close_quotes/stk_quote_download.php";

/// Offset between the Gregorian and ROC (Minguo) calendars.
const ROC_YEAR_OFFSET: i32 = 1911;

const NO_DATA_MARKERS: [&str; 2] = ["查無資料", "請重新查詢"];
const END_MARKERS: [&str; 2] = ["總計", "加權指數"];

fn code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{4,}").expect("code pattern is a valid regex"))
}

/// Taipei Exchange over-the-counter daily close quotes.
///
/// Dates are requested in the ROC calendar, `YYY/MM/DD`. The header is
/// positional: code, name, close.
#[derive(Debug, Clone, Default)]
pub struct TpexAdapter;

impl TpexAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Date formatted as `YYY/MM/DD` in the ROC calendar.
    pub fn roc_date(date: NaiveDate) -> String {
        format!(
            "{}/{:02}/{:02}",
            date.year() - ROC_YEAR_OFFSET,
            date.month(),
            date.day()
        )
    }
}

impl MarketAdapter for TpexAdapter {
    fn market(&self) -> Market {
        Market::Secondary
    }

    fn request_url(&self, date: NaiveDate) -> String {
        format!(
            "{}?l=zh-tw&d={}&s=0,asc,0",
            BASE_URL,
            Self::roc_date(date)
        )
    }

    fn reports_no_data(&self, text: &str) -> bool {
        text.trim().is_empty() || NO_DATA_MARKERS.iter().any(|m| text.contains(m))
    }

    fn header_columns(&self, line: &str) -> Option<ColumnMap> {
        if line.contains("代號") && line.contains("名稱") && line.contains("收盤") {
            Some(ColumnMap {
                code: 0,
                name: 1,
                close: 2,
            })
        } else {
            None
        }
    }

    fn accepts_row(&self, line: &str) -> bool {
        let first = line.split(',').next().unwrap_or_default();
        code_pattern().is_match(&clean_field(first))
    }

    fn is_end_of_table(&self, line: &str) -> bool {
        END_MARKERS.iter().any(|m| line.contains(m))
    }
}
