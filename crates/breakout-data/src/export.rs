//! CSV export of raw prices, enriched prices and breakout results.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use breakout_core::error::ExportError;
use breakout_core::types::{BreakoutResult, DateSnapshot, MovingAverageRecord, PriceRecord};
use tracing::info;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Placeholder substituted with the run date in the results filename.
pub const DATE_PLACEHOLDER: &str = "{date}";

/// Decimal places kept for exported averages.
const AVERAGE_DP: u32 = 4;

/// Writes the three per-run CSV files into one directory.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    dir: PathBuf,
    filename_template: String,
    write_bom: bool,
}

impl CsvExporter {
    /// Create an exporter; the filename template must contain `{date}`.
    pub fn new(
        dir: impl Into<PathBuf>,
        filename_template: impl Into<String>,
        write_bom: bool,
    ) -> Result<Self, ExportError> {
        let filename_template = filename_template.into();
        if !filename_template.contains(DATE_PLACEHOLDER) {
            return Err(ExportError::InvalidTemplate(format!(
                "'{}' has no {} placeholder",
                filename_template, DATE_PLACEHOLDER
            )));
        }
        Ok(Self {
            dir: dir.into(),
            filename_template,
            write_bom,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn raw_path(&self, run_date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("raw_stock_data_{}.csv", compact(run_date)))
    }

    pub fn enriched_path(&self, run_date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("stock_data_with_ma_{}.csv", compact(run_date)))
    }

    pub fn results_path(&self, run_date: NaiveDate) -> PathBuf {
        self.dir.join(
            self.filename_template
                .replace(DATE_PLACEHOLDER, &compact(run_date)),
        )
    }

    /// Write collected records: `stock_id,stock_name,close,date,market`.
    pub fn write_raw(
        &self,
        run_date: NaiveDate,
        records: &[PriceRecord],
    ) -> Result<PathBuf, ExportError> {
        let path = self.raw_path(run_date);
        let mut rows = Vec::with_capacity(records.len());
        for r in records {
            rows.push(raw_columns(r));
        }
        self.write(&path, &raw_header(), rows)?;
        Ok(path)
    }

    /// Write records with one `MA{w}` column per window; undefined is empty.
    pub fn write_enriched(
        &self,
        run_date: NaiveDate,
        rows: &[MovingAverageRecord],
        windows: &[usize],
    ) -> Result<PathBuf, ExportError> {
        let path = self.enriched_path(run_date);

        let mut header = raw_header();
        header.extend(windows.iter().map(|w| format!("MA{}", w)));

        let body = rows.iter().map(|row| {
            let mut columns = raw_columns(&row.record);
            columns.extend(
                windows
                    .iter()
                    .map(|w| row.average(*w).map(format_average).unwrap_or_default()),
            );
            columns
        });
        self.write(&path, &header, body)?;
        Ok(path)
    }

    /// Write the breakout table with per-date close and average columns.
    pub fn write_breakouts(
        &self,
        run_date: NaiveDate,
        results: &[BreakoutResult],
        windows: &[usize],
        date1: NaiveDate,
        date2: NaiveDate,
    ) -> Result<PathBuf, ExportError> {
        let path = self.results_path(run_date);

        let mut header: Vec<String> = ["stock_id", "stock_name", "market"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        for date in [date1, date2] {
            let tag = compact(date);
            header.push(format!("close_{}", tag));
            header.extend(windows.iter().map(|w| format!("MA{}_{}", w, tag)));
        }

        let body = results.iter().map(|result| {
            let mut columns = vec![
                result.security_id.clone(),
                result.security_name.clone(),
                result.market.code().to_string(),
            ];
            columns.extend(snapshot_columns(&result.before, windows));
            columns.extend(snapshot_columns(&result.after, windows));
            columns
        });
        self.write(&path, &header, body)?;
        Ok(path)
    }

    fn write(
        &self,
        path: &Path,
        header: &[String],
        rows: impl IntoIterator<Item = Vec<String>>,
    ) -> Result<(), ExportError> {
        let io_error = |source: std::io::Error| ExportError::Io {
            path: path.display().to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_error)?;
        let mut file = File::create(path).map_err(io_error)?;
        if self.write_bom {
            file.write_all(UTF8_BOM).map_err(io_error)?;
        }

        let mut writer = csv::Writer::from_writer(file);
        writer
            .write_record(header)
            .map_err(|e| ExportError::Csv(e.to_string()))?;
        let mut count = 0usize;
        for row in rows {
            writer
                .write_record(&row)
                .map_err(|e| ExportError::Csv(e.to_string()))?;
            count += 1;
        }
        writer.flush().map_err(io_error)?;

        info!(path = %path.display(), rows = count, "Exported CSV");
        Ok(())
    }
}

fn compact(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

fn raw_header() -> Vec<String> {
    ["stock_id", "stock_name", "close", "date", "market"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn raw_columns(record: &PriceRecord) -> Vec<String> {
    vec![
        record.security_id.clone(),
        record.security_name.clone(),
        record.close.to_string(),
        record.trade_date.format("%Y-%m-%d").to_string(),
        record.market.code().to_string(),
    ]
}

fn snapshot_columns(snapshot: &DateSnapshot, windows: &[usize]) -> Vec<String> {
    let mut columns = vec![snapshot.close.to_string()];
    columns.extend(windows.iter().map(|w| {
        snapshot
            .averages
            .get(w)
            .copied()
            .map(format_average)
            .unwrap_or_default()
    }));
    columns
}

fn format_average(value: Decimal) -> String {
    value.round_dp(AVERAGE_DP).normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use breakout_core::types::Market;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_template_requires_placeholder() {
        assert!(CsvExporter::new("out", "results.csv", true).is_err());
        let exporter = CsvExporter::new("out", "tw_stock_ma_breakthrough_{date}.csv", true).unwrap();
        assert_eq!(
            exporter.results_path(date(8)),
            PathBuf::from("out/tw_stock_ma_breakthrough_20240308.csv")
        );
    }

    #[test]
    fn test_write_raw_with_bom() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path().join("nested"), "r_{date}.csv", true).unwrap();
        let records = vec![PriceRecord::new("2330", "台積電", dec!(580.5), date(8), Market::Primary)];

        let path = exporter.write_raw(date(8), &records).unwrap();
        assert!(path.ends_with("raw_stock_data_20240308.csv"));

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = read(&path);
        let mut lines = text.trim_start_matches('\u{feff}').lines();
        assert_eq!(lines.next(), Some("stock_id,stock_name,close,date,market"));
        assert_eq!(lines.next(), Some("2330,台積電,580.5,2024-03-08,TWSE"));
    }

    #[test]
    fn test_write_enriched_leaves_undefined_empty() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path(), "r_{date}.csv", false).unwrap();
        let mut averages = BTreeMap::new();
        averages.insert(5, Some(dec!(100) / dec!(3)));
        averages.insert(10, None);
        let rows = vec![MovingAverageRecord {
            record: PriceRecord::new("6488", "環球晶", dec!(35), date(8), Market::Secondary),
            averages,
        }];

        let path = exporter.write_enriched(date(8), &rows, &[5, 10]).unwrap();
        let text = read(&path);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "stock_id,stock_name,close,date,market,MA5,MA10");
        assert_eq!(lines[1], "6488,環球晶,35,2024-03-08,TPEx,33.3333,");
    }

    #[test]
    fn test_write_breakouts_columns() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path(), "tw_{date}.csv", false).unwrap();
        let snapshot = |day, close, ma: [Decimal; 2]| DateSnapshot {
            date: date(day),
            close,
            averages: [(5, ma[0]), (10, ma[1])].into_iter().collect(),
        };
        let results = vec![BreakoutResult {
            security_id: "2330".into(),
            security_name: "台積電".into(),
            market: Market::Primary,
            before: snapshot(7, dec!(90), [dec!(92), dec!(93)]),
            after: snapshot(8, dec!(96), [dec!(94), dec!(95.5)]),
        }];

        let path = exporter
            .write_breakouts(date(8), &results, &[5, 10], date(7), date(8))
            .unwrap();
        assert!(path.ends_with("tw_20240308.csv"));

        let text = read(&path);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "stock_id,stock_name,market,close_20240307,MA5_20240307,MA10_20240307,close_20240308,MA5_20240308,MA10_20240308"
        );
        assert_eq!(lines[1], "2330,台積電,TWSE,90,92,93,96,94,95.5");
    }

    #[test]
    fn test_empty_results_still_have_header() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path(), "tw_{date}.csv", false).unwrap();
        let path = exporter
            .write_breakouts(date(8), &[], &[5], date(7), date(8))
            .unwrap();
        assert_eq!(read(&path).lines().count(), 1);
    }
}
