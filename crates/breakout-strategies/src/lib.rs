//! Screening strategies over moving-average enriched prices.
//!
//! - [`BreakoutFilter`]: securities that closed below every configured
//!   average on one reference date and above every one on the next

mod breakout;

pub use breakout::{BreakoutConfig, BreakoutFilter};
