//! Logging setup.

use chrono::{NaiveDate, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_PREFIX: &str = "stock_analyzer";
const LOG_SUFFIX: &str = "log";

/// Log file written for `date` (UTC, as the appender rotates on UTC days).
pub fn log_file_name(date: NaiveDate) -> String {
    format!("{}.{}.{}", LOG_PREFIX, date.format("%Y-%m-%d"), LOG_SUFFIX)
}

/// Keeps the background log writer alive; dropping it flushes the file.
pub struct LogGuard {
    dir: Option<PathBuf>,
    _worker: Option<WorkerGuard>,
}

impl LogGuard {
    /// Directory receiving daily log files, if file logging is on.
    pub fn log_dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// File currently being written.
    pub fn current_file(&self) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(log_file_name(Utc::now().date_naive())))
    }
}

/// Setup logging with the given level.
///
/// `RUST_LOG` overrides `level`. With a `log_dir`, events are also written
/// (without ANSI colors) to a daily rolling file in that directory. The
/// returned guard must be held until the program exits.
pub fn setup_logging(level: &str, json: bool, log_dir: Option<&Path>) -> io::Result<LogGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, worker) = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let appender = Builder::new()
                .rotation(Rotation::DAILY)
                .filename_prefix(LOG_PREFIX)
                .filename_suffix(LOG_SUFFIX)
                .build(dir)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().pretty()).init();
    }

    Ok(LogGuard {
        dir: log_dir.map(Path::to_path_buf),
        _worker: worker,
    })
}
