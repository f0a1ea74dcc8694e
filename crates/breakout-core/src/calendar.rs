//! Exchange trading calendar.
//!
//! Deterministic, pure logic: a date is a trading day unless it falls on one
//! of the two weekend weekdays or is listed as a holiday. No IO, no wall-clock.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::CalendarError;

/// Trading calendar built from a weekend rule and an explicit holiday set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingCalendar {
    weekend: [Weekday; 2],
    holidays: BTreeSet<NaiveDate>,
}

impl Default for TradingCalendar {
    fn default() -> Self {
        Self {
            weekend: [Weekday::Sat, Weekday::Sun],
            holidays: BTreeSet::new(),
        }
    }
}

impl TradingCalendar {
    /// Create a Saturday/Sunday calendar with the given holidays.
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Replace the weekend rule. The two days must differ.
    pub fn with_weekend(mut self, first: Weekday, second: Weekday) -> Result<Self, CalendarError> {
        if first == second {
            return Err(CalendarError::InvalidWeekend(format!(
                "weekend days must differ, got {} twice",
                first
            )));
        }
        self.weekend = [first, second];
        Ok(self)
    }

    /// Holidays known to this calendar.
    pub fn holidays(&self) -> &BTreeSet<NaiveDate> {
        &self.holidays
    }

    /// Weekend weekdays.
    pub fn weekend(&self) -> [Weekday; 2] {
        self.weekend
    }

    /// Check whether the exchange trades on `date`.
    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !self.weekend.contains(&date.weekday()) && !self.holidays.contains(&date)
    }

    /// Longest possible run of consecutive non-trading days, plus margin.
    ///
    /// A run holding H holidays can contain at most 2 weekend days per week,
    /// so it is bounded well below 7 * (H + 2).
    fn search_limit(&self) -> u32 {
        7 * (self.holidays.len() as u32 + 2)
    }

    /// The closest trading day strictly before `date`.
    pub fn previous_trading_day(&self, date: NaiveDate) -> Result<NaiveDate, CalendarError> {
        let limit = self.search_limit();
        let mut current = date;
        for _ in 0..limit {
            current = current
                .pred_opt()
                .ok_or(CalendarError::OutOfRange(date))?;
            if self.is_trading_day(current) {
                return Ok(current);
            }
        }
        Err(CalendarError::NoTradingDay {
            from: date,
            searched: limit,
        })
    }

    /// `date` itself when it is a trading day, otherwise the previous one.
    pub fn latest_trading_day(&self, date: NaiveDate) -> Result<NaiveDate, CalendarError> {
        if self.is_trading_day(date) {
            Ok(date)
        } else {
            self.previous_trading_day(date)
        }
    }

    /// Start date that leaves at least `trading_days_needed` trading days
    /// before `end`, padded with `buffer_days` extra calendar days.
    ///
    /// Counting starts at the day before `end`; `end` itself is not counted.
    pub fn start_date_for(
        &self,
        end: NaiveDate,
        trading_days_needed: u32,
        buffer_days: u32,
    ) -> Result<NaiveDate, CalendarError> {
        let mut current = end;
        for _ in 0..trading_days_needed {
            current = self.previous_trading_day(current)?;
        }
        current
            .checked_sub_days(Days::new(u64::from(buffer_days)))
            .ok_or(CalendarError::OutOfRange(current))
    }

    /// Trading days in `[start, end]`, oldest first.
    pub fn trading_days(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = NaiveDate> + '_ {
        start
            .iter_days()
            .take_while(move |d| *d <= end)
            .filter(move |d| self.is_trading_day(*d))
    }

    /// Number of trading days in `[start, end]`.
    pub fn count_trading_days(&self, start: NaiveDate, end: NaiveDate) -> usize {
        self.trading_days(start, end).count()
    }
}
