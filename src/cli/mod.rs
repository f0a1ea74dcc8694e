//! CLI definitions.

pub mod commands;

use breakout_core::types::Market;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ma-breakout")]
#[command(author, version, about = "Moving-average breakout scanner for Taiwan equities")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", env = "BREAKOUT_CONFIG")]
    pub config: PathBuf,

    /// Log level (defaults to the configured level)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the breakout analysis
    Run(RunArgs),
    /// Fetch one day of closing prices and show what was parsed
    Fetch(FetchArgs),
    /// Show trading-day resolution for a date
    Calendar(CalendarArgs),
    /// Validate configuration
    ValidateConfig,
    /// Write the default configuration file
    InitConfig(InitConfigArgs),
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Analysis date (YYYY-MM-DD); defaults to today
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

#[derive(clap::Args)]
pub struct FetchArgs {
    /// Trading date (YYYY-MM-DD)
    #[arg(short, long)]
    pub date: NaiveDate,

    /// Market to fetch (twse or tpex); both when omitted
    #[arg(short, long)]
    pub market: Option<Market>,

    /// Number of parsed records to print per market
    #[arg(long, default_value = "5")]
    pub show: usize,
}

#[derive(clap::Args)]
pub struct CalendarArgs {
    /// Date to resolve (YYYY-MM-DD); defaults to today
    #[arg(short, long)]
    pub date: Option<NaiveDate>,
}

#[derive(clap::Args)]
pub struct InitConfigArgs {
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}
