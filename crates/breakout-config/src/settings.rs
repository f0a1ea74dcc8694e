//! Configuration structures.

use chrono::{NaiveDate, Weekday};
use config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use breakout_analysis::AnalysisConfig;
use breakout_core::error::CalendarError;
use breakout_core::TradingCalendar;
use breakout_data::{FetchSettings, DATE_PLACEHOLDER, DEFAULT_USER_AGENT};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub calendar: CalendarSettings,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Export destination and naming.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportSettings {
    pub path: PathBuf,
    /// Results filename; `{date}` becomes the run date as `YYYYMMDD`
    pub filename: String,
    /// Prefix files with a UTF-8 BOM for spreadsheet applications
    pub write_bom: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./output"),
            filename: "tw_stock_ma_breakthrough_{date}.csv".to_string(),
            write_bom: true,
        }
    }
}

/// Exchange calendar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CalendarSettings {
    pub holidays: Vec<NaiveDate>,
    pub weekend: [Weekday; 2],
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            holidays: Vec::new(),
            weekend: [Weekday::Sat, Weekday::Sun],
        }
    }
}

/// Exchange download settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    /// Minimum spacing between requests; 0 disables pacing
    pub request_delay_ms: u64,
    pub timeout_secs: u64,
    /// Any positive value enables one retry pass
    pub max_retries: u32,
    pub user_agent: String,
    pub encodings: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: 2000,
            timeout_secs: 30,
            max_retries: 3,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            encodings: vec!["utf-8".to_string(), "big5".to_string()],
        }
    }
}

/// Analysis windows and history depth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisSettings {
    pub windows: Vec<usize>,
    pub history_trading_days: u32,
    pub buffer_days: u32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            windows: vec![5, 10, 20],
            history_trading_days: 60,
            buffer_days: 10,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// JSON lines instead of human-readable output
    pub json: bool,
    /// Write a daily log file as well as stdout
    pub file: bool,
    /// Log file directory; defaults to `{export.path}/stock_logs`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: true,
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Check settings that deserialize fine but cannot drive a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Message(msg));

        if self.analysis.windows.is_empty() {
            return invalid("analysis.windows must not be empty".into());
        }
        if self.analysis.windows.contains(&0) {
            return invalid("analysis.windows must all be greater than 0".into());
        }
        if !self.export.filename.contains(DATE_PLACEHOLDER) {
            return invalid(format!(
                "export.filename must contain {}: '{}'",
                DATE_PLACEHOLDER, self.export.filename
            ));
        }
        if self.calendar.weekend[0] == self.calendar.weekend[1] {
            return invalid("calendar.weekend must name two different days".into());
        }
        if self.fetch.timeout_secs == 0 {
            return invalid("fetch.timeout_secs must be greater than 0".into());
        }
        if self.fetch.encodings.is_empty() {
            return invalid("fetch.encodings must not be empty".into());
        }
        Ok(())
    }

    /// Build the trading calendar.
    pub fn calendar(&self) -> Result<TradingCalendar, CalendarError> {
        let [first, second] = self.calendar.weekend;
        TradingCalendar::new(self.calendar.holidays.iter().copied()).with_weekend(first, second)
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            user_agent: self.fetch.user_agent.clone(),
            timeout: Duration::from_secs(self.fetch.timeout_secs),
            encodings: self.fetch.encodings.clone(),
        }
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.fetch.request_delay_ms)
    }

    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            windows: self.analysis.windows.clone(),
            history_trading_days: self.analysis.history_trading_days,
            buffer_days: self.analysis.buffer_days,
            max_retries: self.fetch.max_retries,
        }
    }

    /// Directory for log files, if file logging is enabled.
    pub fn log_dir(&self) -> Option<PathBuf> {
        if !self.logging.file {
            return None;
        }
        Some(
            self.logging
                .log_dir
                .clone()
                .unwrap_or_else(|| self.export.path.join("stock_logs")),
        )
    }

    /// Write the default configuration as TOML, creating parent directories.
    pub fn write_default(path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(&AppConfig::default())
            .map_err(|e| ConfigError::Message(format!("Failed to serialize defaults: {}", e)))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Foreign(Box::new(e)))?;
        }
        fs::write(path, text).map_err(|e| ConfigError::Foreign(Box::new(e)))
    }
}
