//! Analysis run report.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use breakout_core::types::{BreakoutOutcome, Diagnostic, Severity};
use breakout_data::{Collection, FetchKey};

/// What the collector gathered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub trading_days: usize,
    pub records: usize,
    pub securities: usize,
    /// Pairs that needed a retry
    pub retry_queue: Vec<FetchKey>,
    /// Pairs still missing after the retry pass
    pub unresolved: Vec<FetchKey>,
}

impl CollectionStats {
    pub fn from_collection(collection: &Collection) -> Self {
        let mut ids: Vec<&str> = collection
            .records
            .iter()
            .map(|r| r.security_id.as_str())
            .collect();
        ids.sort_unstable();
        ids.dedup();

        Self {
            trading_days: collection.trading_days.len(),
            records: collection.records.len(),
            securities: ids.len(),
            retry_queue: collection.retry_queue.clone(),
            unresolved: collection.unresolved.clone(),
        }
    }
}

/// Files written by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedFiles {
    pub raw: PathBuf,
    pub enriched: PathBuf,
    pub results: PathBuf,
}

/// Complete analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Resolved run date (the later reference date)
    pub run_date: NaiveDate,
    /// Trading day before the run date (the earlier reference date)
    pub previous_date: NaiveDate,
    /// First calendar day of the collected range
    pub start_date: NaiveDate,
    /// Average windows used
    pub windows: Vec<usize>,
    pub outcome: BreakoutOutcome,
    pub collection: CollectionStats,
    pub exported: ExportedFiles,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisReport {
    /// Number of diagnostics at or above `severity`.
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity >= severity)
            .count()
    }

    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str("                 MOVING AVERAGE BREAKOUT REPORT             \n");
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        s.push_str("RUN\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Run Date:            {}\n", self.run_date));
        s.push_str(&format!("  Previous Date:       {}\n", self.previous_date));
        s.push_str(&format!("  History From:        {}\n", self.start_date));
        let windows: Vec<String> = self.windows.iter().map(|w| format!("MA{}", w)).collect();
        s.push_str(&format!("  Averages:            {}\n", windows.join(", ")));
        s.push('\n');

        s.push_str("COLLECTION\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  Trading Days:        {}\n",
            self.collection.trading_days
        ));
        s.push_str(&format!("  Records:             {}\n", self.collection.records));
        s.push_str(&format!(
            "  Securities:          {}\n",
            self.collection.securities
        ));
        s.push_str(&format!(
            "  Retried:             {}\n",
            self.collection.retry_queue.len()
        ));
        s.push_str(&format!(
            "  Unresolved:          {}\n",
            self.collection.unresolved.len()
        ));
        for key in &self.collection.unresolved {
            s.push_str(&format!("    - {}\n", key));
        }
        s.push('\n');

        s.push_str("BREAKOUTS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        match &self.outcome {
            BreakoutOutcome::MissingReferenceDate(date) => {
                s.push_str(&format!("  No data for reference date {}\n", date));
            }
            BreakoutOutcome::Matches(matches) if matches.is_empty() => {
                s.push_str("  No securities broke out\n");
            }
            outcome => {
                s.push_str(&format!("  Matches:             {}\n", outcome.matches().len()));
                for m in outcome.ranked() {
                    s.push_str(&format!(
                        "  {:<8} {:<12} {:<5} {:>10} -> {:<10} {:>+7.2}%\n",
                        m.security_id,
                        m.security_name,
                        m.market.code(),
                        m.before.close,
                        m.after.close,
                        m.price_change_pct().round_dp(2)
                    ));
                }
            }
        }
        s.push('\n');

        s.push_str("FILES\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Raw:                 {}\n", self.exported.raw.display()));
        s.push_str(&format!(
            "  With Averages:       {}\n",
            self.exported.enriched.display()
        ));
        s.push_str(&format!(
            "  Results:             {}\n",
            self.exported.results.display()
        ));
        s.push('\n');

        s.push_str(&format!(
            "  Warnings: {}   Errors: {}\n",
            self.count_at_least(Severity::Warning) - self.count_at_least(Severity::Error),
            self.count_at_least(Severity::Error)
        ));
        s.push_str("═══════════════════════════════════════════════════════════\n");

        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
