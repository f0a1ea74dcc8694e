//! Structured diagnostics returned alongside component results.
//!
//! Components never write recoverable problems to shared state. They return a
//! [`Reported`] value carrying the diagnostics they produced and the caller
//! decides what to aggregate. Every diagnostic is also emitted as a `tracing`
//! event when it is recorded.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info, warn};

use super::Market;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// What a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Transport failure: connection error or timeout
    FetchFailed,
    /// Upstream answered with a non-success status
    HttpStatus,
    /// No candidate encoding could decode the body
    DecodeFailed,
    /// Upstream explicitly reported that it has no data for the date
    NoDataPage,
    /// The table header could not be located
    HeaderNotFound,
    /// A header was found but no usable rows followed
    EmptyTable,
    /// A row was skipped during normalization
    RowRejected,
    /// The same security appeared twice in one table
    DuplicateRow,
    /// A (date, market) pair was queued for the retry pass
    RetryQueued,
    /// A queued pair produced data on retry
    RetryRecovered,
    /// A queued pair was still empty after the retry pass
    RetryExhausted,
    /// Summary of a collection pass
    CollectionSummary,
    /// Summary of the history available to the moving-average computation
    HistorySummary,
    /// Securities with fewer observations than the longest window
    InsufficientHistory,
    /// A breakout reference date has no rows at all
    MissingReferenceDate,
    /// A security's rows could not be assembled into a result
    IntegrityIssue,
    /// Summary of a breakout selection
    FilterSummary,
}

/// One diagnostic event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market: Option<Market>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_id: Option<String>,
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic with the given severity.
    pub fn new(severity: Severity, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            market: None,
            date: None,
            security_id: None,
            message: message.into(),
        }
    }

    pub fn info(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, kind, message)
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, kind, message)
    }

    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, kind, message)
    }

    pub fn with_market(mut self, market: Market) -> Self {
        self.market = Some(market);
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_security(mut self, security_id: impl Into<String>) -> Self {
        self.security_id = Some(security_id.into());
        self
    }

    /// Emit this diagnostic as a tracing event.
    pub fn emit(&self) {
        match self.severity {
            Severity::Info => info!(kind = ?self.kind, "{}", self),
            Severity::Warning => warn!(kind = ?self.kind, "{}", self),
            Severity::Error => error!(kind = ?self.kind, "{}", self),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(market) = self.market {
            write!(f, "[{}] ", market)?;
        }
        if let Some(date) = self.date {
            write!(f, "{} ", date)?;
        }
        if let Some(id) = &self.security_id {
            write!(f, "{}: ", id)?;
        }
        write!(f, "{}", self.message)
    }
}

/// A component result plus the diagnostics produced while computing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reported<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Reported<T> {
    /// Wrap a value with no diagnostics.
    pub fn new(value: T) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
        }
    }

    /// Record a diagnostic, emitting it as a tracing event.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        diagnostic.emit();
        self.diagnostics.push(diagnostic);
    }

    /// Builder form of [`Reported::push`].
    pub fn with(mut self, diagnostic: Diagnostic) -> Self {
        self.push(diagnostic);
        self
    }

    /// Append diagnostics that were already emitted elsewhere.
    pub fn absorb(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    /// Transform the value, keeping diagnostics.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reported<U> {
        Reported {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }

    pub fn into_parts(self) -> (T, Vec<Diagnostic>) {
        (self.value, self.diagnostics)
    }

    /// Count diagnostics at or above a severity.
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity >= severity)
            .count()
    }

    /// Check whether any diagnostic of the given kind was recorded.
    pub fn has_kind(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics.iter().any(|d| d.kind == kind)
    }
}

impl<T: Default> Default for Reported<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let d = Diagnostic::warning(DiagnosticKind::EmptyTable, "no rows")
            .with_market(Market::Secondary)
            .with_date(date);
        assert_eq!(d.to_string(), "[TPEx] 2024-03-04 no rows");
    }

    #[test]
    fn test_reported_counts() {
        let mut reported: Reported<Vec<u32>> = Reported::new(vec![1, 2]);
        reported.push(Diagnostic::info(DiagnosticKind::CollectionSummary, "ok"));
        reported.push(Diagnostic::warning(DiagnosticKind::EmptyTable, "empty"));
        reported.push(Diagnostic::error(DiagnosticKind::DecodeFailed, "bad"));

        assert_eq!(reported.count_at_least(Severity::Info), 3);
        assert_eq!(reported.count_at_least(Severity::Warning), 2);
        assert_eq!(reported.count_at_least(Severity::Error), 1);
        assert!(reported.has_kind(DiagnosticKind::DecodeFailed));
        assert!(!reported.has_kind(DiagnosticKind::RetryQueued));
    }

    #[test]
    fn test_reported_map_keeps_diagnostics() {
        let reported = Reported::new(3)
            .with(Diagnostic::info(DiagnosticKind::FilterSummary, "three"))
            .map(|v| v * 2);
        assert_eq!(reported.value, 6);
        assert_eq!(reported.diagnostics.len(), 1);
    }
}
