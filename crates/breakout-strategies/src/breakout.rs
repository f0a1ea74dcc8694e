//! Moving-average breakout filter.
//!
//! A security breaks out when its close sits strictly below every configured
//! average on the earlier reference date and strictly above every one on the
//! later date. Undefined averages never satisfy either side.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use breakout_core::error::IndicatorError;
use breakout_core::types::{
    BreakoutOutcome, BreakoutResult, DateSnapshot, Diagnostic, DiagnosticKind,
    MovingAverageRecord, Reported,
};
use tracing::debug;

/// Configuration for the breakout filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakoutConfig {
    /// Average windows that must all be crossed
    pub windows: Vec<usize>,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            windows: vec![5, 10, 20],
        }
    }
}

impl BreakoutConfig {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.windows.is_empty() {
            return Err(IndicatorError::InvalidParameter(
                "At least one window required".into(),
            ));
        }
        if self.windows.contains(&0) {
            return Err(IndicatorError::InvalidParameter(
                "Windows must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Selects securities that crossed from below all averages to above all.
#[derive(Debug, Clone)]
pub struct BreakoutFilter {
    windows: Vec<usize>,
}

/// One security's rows on a reference date.
type DayIndex<'a> = BTreeMap<&'a str, Vec<&'a MovingAverageRecord>>;

impl BreakoutFilter {
    /// Create a filter from a validated configuration.
    pub fn new(config: BreakoutConfig) -> Result<Self, IndicatorError> {
        config.validate()?;
        let mut windows = config.windows;
        windows.sort_unstable();
        windows.dedup();
        Ok(Self { windows })
    }

    pub fn windows(&self) -> &[usize] {
        &self.windows
    }

    /// Compare each security's row on `date1` with its row on `date2`.
    ///
    /// Returns [`BreakoutOutcome::MissingReferenceDate`] when either date has
    /// no rows at all. Securities with more than one row on a reference date
    /// are skipped with a warning. Matches come out ordered by security id.
    pub fn select(
        &self,
        records: &[MovingAverageRecord],
        date1: NaiveDate,
        date2: NaiveDate,
    ) -> Reported<BreakoutOutcome> {
        let before = index_day(records, date1);
        let after = index_day(records, date2);

        for (date, index) in [(date1, &before), (date2, &after)] {
            if index.is_empty() {
                return Reported::new(BreakoutOutcome::MissingReferenceDate(date)).with(
                    Diagnostic::warning(
                        DiagnosticKind::MissingReferenceDate,
                        format!("No rows for reference date {}; selection skipped", date),
                    )
                    .with_date(date),
                );
            }
        }

        let mut reported = Reported::new(BreakoutOutcome::Matches(Vec::new()));
        let mut matches = Vec::new();
        let mut below_count = 0usize;
        let mut above_count = 0usize;

        let ids: BTreeSet<&str> = before.keys().chain(after.keys()).copied().collect();
        for id in ids {
            let rows_before = before.get(id).map(Vec::as_slice).unwrap_or_default();
            let rows_after = after.get(id).map(Vec::as_slice).unwrap_or_default();

            if let Some(date) = duplicated_on(rows_before, date1).or(duplicated_on(rows_after, date2)) {
                reported.push(
                    Diagnostic::warning(
                        DiagnosticKind::IntegrityIssue,
                        "More than one row on a reference date; security skipped",
                    )
                    .with_security(id)
                    .with_date(date),
                );
                continue;
            }

            let below = rows_before
                .first()
                .filter(|row| row.is_below_all(&self.windows));
            let above = rows_after
                .first()
                .filter(|row| row.is_above_all(&self.windows));
            below_count += usize::from(below.is_some());
            above_count += usize::from(above.is_some());

            let (Some(b), Some(a)) = (below, above) else {
                continue;
            };
            match (self.snapshot(b), self.snapshot(a)) {
                (Some(before), Some(after)) => matches.push(BreakoutResult {
                    security_id: id.to_string(),
                    security_name: b.record.security_name.clone(),
                    market: b.record.market,
                    before,
                    after,
                }),
                _ => reported.push(
                    Diagnostic::warning(
                        DiagnosticKind::IntegrityIssue,
                        "Average missing while assembling result; security skipped",
                    )
                    .with_security(id),
                ),
            }
        }

        debug!(%date1, %date2, below_count, above_count, matches = matches.len(), "Breakout selection");
        reported.push(Diagnostic::info(
            DiagnosticKind::FilterSummary,
            format!(
                "{} below all averages on {}, {} above all on {}, {} breakouts",
                below_count,
                date1,
                above_count,
                date2,
                matches.len()
            ),
        ));
        reported.value = BreakoutOutcome::Matches(matches);
        reported
    }

    fn snapshot(&self, row: &MovingAverageRecord) -> Option<DateSnapshot> {
        let averages = self
            .windows
            .iter()
            .map(|w| row.average(*w).map(|avg| (*w, avg)))
            .collect::<Option<BTreeMap<usize, Decimal>>>()?;
        Some(DateSnapshot {
            date: row.record.trade_date,
            close: row.record.close,
            averages,
        })
    }
}

impl Default for BreakoutFilter {
    fn default() -> Self {
        Self {
            windows: BreakoutConfig::default().windows,
        }
    }
}

fn index_day(records: &[MovingAverageRecord], date: NaiveDate) -> DayIndex<'_> {
    let mut index: DayIndex<'_> = BTreeMap::new();
    for row in records.iter().filter(|r| r.record.trade_date == date) {
        index
            .entry(row.record.security_id.as_str())
            .or_default()
            .push(row);
    }
    index
}

fn duplicated_on(rows: &[&MovingAverageRecord], date: NaiveDate) -> Option<NaiveDate> {
    (rows.len() > 1).then_some(date)
}
