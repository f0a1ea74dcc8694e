//! Breakout selection results.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Market;

/// Close and moving averages of one security on one reference date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSnapshot {
    pub date: NaiveDate,
    pub close: Decimal,
    /// Average per configured window; every configured window is present.
    pub averages: BTreeMap<usize, Decimal>,
}

/// A security that closed below all of its moving averages on the earlier
/// reference date and above all of them on the later one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakoutResult {
    pub security_id: String,
    pub security_name: String,
    pub market: Market,
    /// Snapshot on the earlier reference date (below all averages)
    pub before: DateSnapshot,
    /// Snapshot on the later reference date (above all averages)
    pub after: DateSnapshot,
}

impl BreakoutResult {
    /// Percentage change of the close between the two reference dates.
    pub fn price_change_pct(&self) -> Decimal {
        if self.before.close.is_zero() {
            return Decimal::ZERO;
        }
        (self.after.close - self.before.close) / self.before.close * Decimal::ONE_HUNDRED
    }
}

/// Outcome of a breakout selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum BreakoutOutcome {
    /// Both reference dates had data; the (possibly empty) matches.
    Matches(Vec<BreakoutResult>),
    /// No row at all exists for this reference date, so nothing was evaluated.
    MissingReferenceDate(NaiveDate),
}

impl BreakoutOutcome {
    /// Matches, or an empty slice when a reference date was missing.
    pub fn matches(&self) -> &[BreakoutResult] {
        match self {
            BreakoutOutcome::Matches(results) => results,
            BreakoutOutcome::MissingReferenceDate(_) => &[],
        }
    }

    /// Check if a reference date was missing.
    pub fn is_missing_reference(&self) -> bool {
        matches!(self, BreakoutOutcome::MissingReferenceDate(_))
    }

    /// Matches sorted by descending percentage change, for presentation.
    pub fn ranked(&self) -> Vec<&BreakoutResult> {
        let mut ranked: Vec<&BreakoutResult> = self.matches().iter().collect();
        ranked.sort_by(|a, b| {
            b.price_change_pct()
                .cmp(&a.price_change_pct())
                .then_with(|| a.security_id.cmp(&b.security_id))
        });
        ranked
    }
}
