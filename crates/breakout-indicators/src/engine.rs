//! Per-security moving-average computation over a combined price dataset.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;
use breakout_core::error::IndicatorError;
use breakout_core::traits::Indicator;
use breakout_core::types::{
    Diagnostic, DiagnosticKind, MovingAverageRecord, PriceRecord, PriceSeries, Reported,
};

use crate::Sma;

/// Maximum number of security ids quoted in an insufficient-history diagnostic.
const MAX_LISTED_IDS: usize = 10;

/// Computes fixed-window simple moving averages for every security.
///
/// Each security is averaged over its own chronologically ordered history. A
/// window value exists only when the security has at least `window`
/// observations up to and including that row.
#[derive(Debug, Clone)]
pub struct MovingAverageEngine {
    smas: Vec<Sma>,
}

impl MovingAverageEngine {
    /// Create an engine for the given window lengths.
    ///
    /// Windows are deduplicated and sorted; an empty list or a zero window is
    /// rejected.
    pub fn new(windows: &[usize]) -> Result<Self, IndicatorError> {
        if windows.is_empty() {
            return Err(IndicatorError::InvalidParameter(
                "At least one window is required".into(),
            ));
        }
        let mut windows = windows.to_vec();
        windows.sort_unstable();
        windows.dedup();

        let smas = windows
            .into_iter()
            .map(Sma::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { smas })
    }

    /// Window lengths, ascending.
    pub fn windows(&self) -> Vec<usize> {
        self.smas.iter().map(|s| s.period()).collect()
    }

    /// Longest configured window.
    pub fn max_window(&self) -> usize {
        self.smas.last().map(|s| s.period()).unwrap_or(0)
    }

    /// Enrich every record with its moving averages.
    ///
    /// Output is ordered by (security id, trade date, market) regardless of
    /// input order.
    pub fn compute(&self, records: &[PriceRecord]) -> Reported<Vec<MovingAverageRecord>> {
        let mut reported = Reported::new(Vec::with_capacity(records.len()));
        if records.is_empty() {
            reported.push(Diagnostic::warning(
                DiagnosticKind::HistorySummary,
                "No records to compute moving averages for",
            ));
            return reported;
        }

        let groups = PriceSeries::group(records);
        debug!(
            securities = groups.len(),
            records = records.len(),
            windows = ?self.windows(),
            "Computing moving averages"
        );
        reported.push(history_summary(&groups));

        let max_window = self.max_window();
        let mut insufficient: Vec<&str> = Vec::new();

        for (security_id, series) in &groups {
            if series.len() < max_window {
                insufficient.push(security_id);
            }

            let closes = series.closes();
            let per_window: Vec<(usize, Vec<Option<Decimal>>)> = self
                .smas
                .iter()
                .map(|sma| (sma.period(), sma.calculate(&closes)))
                .collect();

            for (i, record) in series.records().iter().enumerate() {
                let averages: BTreeMap<usize, Option<Decimal>> = per_window
                    .iter()
                    .map(|(window, values)| (*window, values[i]))
                    .collect();
                reported.value.push(MovingAverageRecord {
                    record: record.clone(),
                    averages,
                });
            }
        }

        if !insufficient.is_empty() {
            let listed: Vec<&str> = insufficient.iter().take(MAX_LISTED_IDS).copied().collect();
            let more = insufficient.len().saturating_sub(MAX_LISTED_IDS);
            let suffix = if more > 0 {
                format!(" (+{} more)", more)
            } else {
                String::new()
            };
            reported.push(Diagnostic::warning(
                DiagnosticKind::InsufficientHistory,
                format!(
                    "{} securities have fewer than {} observations; their longer averages are undefined: {}{}",
                    insufficient.len(),
                    max_window,
                    listed.join(", "),
                    suffix
                ),
            ));
        }

        reported
    }
}

fn history_summary(groups: &BTreeMap<String, PriceSeries>) -> Diagnostic {
    let counts: Vec<usize> = groups.values().map(PriceSeries::len).collect();
    let total: usize = counts.iter().sum();
    let min = counts.iter().min().copied().unwrap_or(0);
    let max = counts.iter().max().copied().unwrap_or(0);
    let mean = total as f64 / counts.len().max(1) as f64;

    let dates = groups
        .values()
        .flat_map(|s| s.records().iter().map(|r| r.trade_date));
    let (first, last) = dates.fold((None, None), |(lo, hi), d| {
        (
            Some(lo.map_or(d, |l: chrono::NaiveDate| l.min(d))),
            Some(hi.map_or(d, |h: chrono::NaiveDate| h.max(d))),
        )
    });
    let range = match (first, last) {
        (Some(a), Some(b)) => format!("{} to {}", a, b),
        _ => "n/a".to_string(),
    };

    Diagnostic::info(
        DiagnosticKind::HistorySummary,
        format!(
            "{} securities, {:.2} observations on average (min {}, max {}), dates {}",
            groups.len(),
            mean,
            min,
            max,
            range
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use breakout_core::types::Market;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn trading_dates(n: usize) -> Vec<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .iter_days()
            .filter(|d| chrono::Datelike::weekday(d).number_from_monday() <= 5)
            .take(n)
            .collect()
    }

    fn series(id: &str, closes: &[Decimal]) -> Vec<PriceRecord> {
        trading_dates(closes.len())
            .into_iter()
            .zip(closes)
            .map(|(d, c)| PriceRecord::new(id, id, *c, d, Market::Primary))
            .collect()
    }

    #[test]
    fn test_five_day_window_scenario() {
        let closes = [
            dec!(95),
            dec!(96),
            dec!(94),
            dec!(97),
            dec!(98),
            dec!(100),
            dec!(99),
            dec!(101),
            dec!(103),
            dec!(102),
        ];
        let engine = MovingAverageEngine::new(&[5]).unwrap();
        let result = engine.compute(&series("2330", &closes)).value;

        assert_eq!(result.len(), 10);
        for row in &result[..4] {
            assert_eq!(row.average(5), None);
        }
        assert_eq!(result[4].average(5), Some(dec!(96.0)));
        // mean(96, 94, 97, 98, 100)
        assert_eq!(result[5].average(5), Some(dec!(97)));
        assert!(result[4..].iter().all(|r| r.average(5).is_some()));
    }

    #[test]
    fn test_short_history_gets_undefined_long_windows() {
        let engine = MovingAverageEngine::new(&[5, 10, 20]).unwrap();
        let closes: Vec<Decimal> = (1..=12).map(Decimal::from).collect();
        let reported = engine.compute(&series("6488", &closes));

        let last = reported.value.last().unwrap();
        assert!(last.average(5).is_some());
        assert!(last.average(10).is_some());
        assert_eq!(last.average(20), None);
        assert!(last.averages.contains_key(&20));
        assert!(reported.has_kind(DiagnosticKind::InsufficientHistory));
    }

    #[test]
    fn test_securities_are_independent() {
        let mut records = series("2330", &[dec!(10), dec!(20), dec!(30)]);
        records.extend(series("1101", &[dec!(40), dec!(50)]));

        let engine = MovingAverageEngine::new(&[2]).unwrap();
        let result = engine.compute(&records).value;

        // Ordered by security id
        assert_eq!(result[0].record.security_id, "1101");
        assert_eq!(result[0].average(2), None);
        assert_eq!(result[1].average(2), Some(dec!(45)));
        assert_eq!(result[2].record.security_id, "2330");
        assert_eq!(result[2].average(2), None);
        assert_eq!(result[4].average(2), Some(dec!(25)));
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let records = series("2330", &[dec!(10), dec!(11), dec!(13), dec!(12)]);
        let mut reversed = records.clone();
        reversed.reverse();

        let engine = MovingAverageEngine::new(&[2, 3]).unwrap();
        assert_eq!(engine.compute(&records).value, engine.compute(&reversed).value);
    }

    #[test]
    fn test_windows_validated_and_sorted() {
        assert!(MovingAverageEngine::new(&[]).is_err());
        assert!(MovingAverageEngine::new(&[5, 0]).is_err());

        let engine = MovingAverageEngine::new(&[20, 5, 10, 5]).unwrap();
        assert_eq!(engine.windows(), vec![5, 10, 20]);
        assert_eq!(engine.max_window(), 20);
    }

    #[test]
    fn test_empty_input() {
        let engine = MovingAverageEngine::new(&[5]).unwrap();
        let reported = engine.compute(&[]);
        assert!(reported.value.is_empty());
        assert!(reported.has_kind(DiagnosticKind::HistorySummary));
    }
}
