//! Moving-average indicators for the breakout scanner.
//!
//! - [`Sma`]: a single fixed-window simple moving average over decimal closes
//! - [`MovingAverageEngine`]: applies several windows to every security in a
//!   combined multi-market dataset

pub mod engine;
pub mod moving_average;

pub use engine::MovingAverageEngine;
pub use moving_average::Sma;
