//! Configuration management.

mod settings;

pub use settings::{
    AnalysisSettings, AppConfig, CalendarSettings, ExportSettings, FetchConfig, LoggingConfig,
};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

/// Prefix of environment variables overriding file settings,
/// e.g. `BREAKOUT__FETCH__REQUEST_DELAY_MS=500`.
pub const ENV_PREFIX: &str = "BREAKOUT";

/// Load configuration from file and environment.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("calendar.holidays")
                .with_list_parse_key("analysis.windows")
                .with_list_parse_key("fetch.encodings")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}

/// Load configuration, first writing the defaults if the file is missing.
///
/// Returns the configuration and whether a new file was created.
pub fn load_or_init(path: &Path) -> Result<(AppConfig, bool), ConfigError> {
    let created = if path.exists() {
        false
    } else {
        AppConfig::write_default(path)?;
        true
    };
    Ok((load_config(path)?, created))
}
