//! Core data types for the breakout scanner.

mod breakout;
mod diagnostic;
mod market;
mod price;

pub use breakout::{BreakoutOutcome, BreakoutResult, DateSnapshot};
pub use diagnostic::{Diagnostic, DiagnosticKind, Reported, Severity};
pub use market::Market;
pub use price::{MovingAverageRecord, PriceRecord, PriceSeries};
