//! Output formatting and persistence for delay reports.
//!
//! Supports pretty-printing, JSON serialization, and one CSV file per table.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analyzers::types::{DelayReport, DerivedTable, TableOutcome};
use crate::record::DelayRecord;
use csv::Writer;
use std::fs;
use std::path::{Path, PathBuf};

/// Placeholder row written in place of a table that has no data.
#[derive(Serialize)]
struct NoDataRow<'a> {
    no_data: &'a str,
}

/// Logs the report using Rust's debug pretty-print format.
pub fn print_pretty(report: &DelayReport) {
    debug!("{:#?}", report);
}

/// Logs the report as pretty-printed JSON.
pub fn print_json(report: &DelayReport) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Writes the whole report as pretty-printed JSON to `path`.
pub fn write_report(path: &Path, report: &DelayReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_vec_pretty(report)?)?;
    debug!(path = %path.display(), "Wrote JSON report");
    Ok(())
}

/// Writes `rows` as a CSV file with headers, replacing any existing file.
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes one table outcome to `<dir>/<name>.csv`.
///
/// A table with no data is still written, as a single `no_data` column
/// holding the reason. So is a computed table that kept no rows.
pub fn write_table<T: DerivedTable>(
    dir: &Path,
    name: &str,
    outcome: &TableOutcome<T>,
) -> Result<PathBuf> {
    let path = dir.join(format!("{name}.csv"));

    match outcome {
        TableOutcome::Ready { table } => {
            let rows = table.csv_rows();
            if rows.is_empty() {
                write_rows(&path, &[NoDataRow { no_data: "no rows" }])?;
                warn!(path = %path.display(), "Wrote empty table as placeholder");
            } else {
                write_rows(&path, &rows)?;
                debug!(path = %path.display(), rows = table.row_count(), "Wrote table");
            }
        }
        TableOutcome::NoData { reason } => {
            write_rows(&path, &[NoDataRow { no_data: reason }])?;
            warn!(path = %path.display(), reason = %reason, "Wrote no-data placeholder");
        }
    }

    Ok(path)
}

/// Writes every table of `report` into `dir` as CSV, plus `report.json`.
///
/// Returns the paths written, JSON report last.
pub fn write_report_tables(dir: &Path, report: &DelayReport) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut written = vec![
        write_table(dir, "summary", &report.summary)?,
        write_table(dir, "line_means", &report.line_means)?,
        write_table(dir, "line_counts", &report.line_counts)?,
        write_table(dir, "station_ranking", &report.station_ranking)?,
        write_table(dir, "line_modes", &report.line_modes)?,
        write_table(dir, "day_means", &report.day_means)?,
        write_table(dir, "line_bounds", &report.line_bounds)?,
        write_table(dir, "top_codes", &report.top_codes)?,
    ];

    let json_path = dir.join("report.json");
    write_report(&json_path, report)?;
    written.push(json_path);

    info!(dir = %dir.display(), files = written.len(), "Report written");
    Ok(written)
}

/// Writes the cleaned record set as CSV.
pub fn write_cleaned(path: &Path, records: &[DelayRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_rows(path, records)?;
    info!(path = %path.display(), rows = records.len(), "Wrote cleaned records");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::analyzer::{ReportOptions, analyze};
    use std::env;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir); // clean up any prior run
        dir
    }

    fn sample_records() -> Vec<DelayRecord> {
        vec![
            DelayRecord {
                station: "UNION STATION".to_string(),
                day_of_week: "Monday".to_string(),
                delay_code: "MUI".to_string(),
                line: "Line 01 Yellow".to_string(),
                bound: "S".to_string(),
                min_delay: Some(4.0),
                ..Default::default()
            },
            DelayRecord {
                station: "KENNEDY BD STATION".to_string(),
                day_of_week: "Tuesday".to_string(),
                line: "Line 02 Green".to_string(),
                min_delay: Some(0.0),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        let report = analyze(&sample_records(), &ReportOptions::default());
        print_pretty(&report);
    }

    #[test]
    fn test_print_json_does_not_panic() {
        let report = analyze(&sample_records(), &ReportOptions::default());
        print_json(&report).unwrap();
    }

    #[test]
    fn test_write_report_tables_writes_every_table() {
        let dir = temp_dir("subway_delay_report_test_tables");
        let report = analyze(&sample_records(), &ReportOptions::default());

        let written = write_report_tables(&dir, &report).unwrap();

        assert_eq!(written.len(), 9);
        assert!(written.iter().all(|p| p.exists()));

        let counts = fs::read_to_string(dir.join("line_counts.csv")).unwrap();
        let lines: Vec<_> = counts.lines().collect();
        assert_eq!(lines, vec!["line,count", "Line 01 Yellow,1", "Total,1"]);

        let summary = fs::read_to_string(dir.join("summary.csv")).unwrap();
        let lines: Vec<_> = summary.lines().collect();
        assert_eq!(lines[0], "metric,value");
        assert!(lines.contains(&"total_events,2"));
        assert!(lines.contains(&"first_date,"));
        assert_eq!(
            &lines[lines.len() - 4..],
            &[
                "events Line 01 Yellow,1",
                "events Line 02 Green,1",
                "events Line 03 Scarborough,0",
                "events Line 04 Sheppard,0",
            ]
        );

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_no_data_table_written_as_placeholder() {
        let dir = temp_dir("subway_delay_report_test_no_data");
        fs::create_dir_all(&dir).unwrap();
        let report = analyze(&[], &ReportOptions::default());

        let path = write_table(&dir, "line_means", &report.line_means).unwrap();
        let content = fs::read_to_string(&path).unwrap();

        assert_eq!(
            content.lines().collect::<Vec<_>>(),
            vec!["no_data", "no data for per-line mean delay"]
        );

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_empty_ready_table_written_as_placeholder() {
        let dir = temp_dir("subway_delay_report_test_empty_ready");
        fs::create_dir_all(&dir).unwrap();
        let report = analyze(&sample_records(), &ReportOptions { top_n: 0 });
        assert!(report.station_ranking.is_ready());

        let path = write_table(&dir, "station_ranking", &report.station_ranking).unwrap();
        let content = fs::read_to_string(&path).unwrap();

        assert_eq!(content.lines().collect::<Vec<_>>(), vec!["no_data", "no rows"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_line_modes_csv_reports_undefined_mode() {
        let dir = temp_dir("subway_delay_report_test_modes");
        fs::create_dir_all(&dir).unwrap();
        let report = analyze(&sample_records(), &ReportOptions::default());

        let path = write_table(&dir, "line_modes", &report.line_modes).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();

        assert_eq!(lines[0], "line,mode,note");
        assert_eq!(lines[1], "Line 01 Yellow,4.0,");
        assert!(lines[2].starts_with("Line 02 Green,,mode undefined"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_cleaned_round_trips_row_count() {
        let dir = temp_dir("subway_delay_report_test_cleaned");
        let path = dir.join("cleaned.csv");

        write_cleaned(&path, &sample_records()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        // 1 header + 2 data rows
        assert_eq!(content.lines().count(), 3);
        assert!(content.starts_with("date,time,day_of_week,station"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
