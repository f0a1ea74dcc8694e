//! CLI command implementations.

pub mod calendar;
pub mod fetch;
pub mod init_config;
pub mod run;
pub mod validate;
