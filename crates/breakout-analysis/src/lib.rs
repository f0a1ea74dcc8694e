//! Breakout analysis runs.
//!
//! Composes the calendar, range collector, moving-average engine, breakout
//! filter and CSV exporter into one run and reports what happened.

mod engine;
mod report;

pub use engine::{AnalysisConfig, AnalysisEngine, AnalysisError};
pub use report::{AnalysisReport, CollectionStats, ExportedFiles};
