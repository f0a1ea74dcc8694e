//! Core types and traits for the breakout scanner.
//!
//! This crate provides the foundational building blocks including:
//! - Price data types (PriceRecord, PriceSeries, MovingAverageRecord)
//! - Breakout results and structured diagnostics
//! - The exchange trading calendar
//! - Core traits for indicators, HTTP transport and price sources

pub mod calendar;
pub mod error;
pub mod traits;
pub mod types;

pub use calendar::TradingCalendar;
pub use traits::*;
pub use types::*;
