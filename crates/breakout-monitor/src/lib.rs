//! Logging and run monitoring.

mod logging;

pub use logging::{log_file_name, setup_logging, LogGuard};
