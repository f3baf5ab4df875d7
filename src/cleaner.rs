//! Column-name normalization and line recoding.
//!
//! Turns a [`RawTable`] into the canonical [`DelayRecord`] set every
//! aggregation reads. No row is ever dropped here.

use std::borrow::Cow;
use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use csv::StringRecord;
use tracing::{debug, info};

use crate::error::{CleanError, SchemaError};
use crate::lines::canonical_name;
use crate::parser::RawTable;
use crate::record::{DelayRecord, RawDelayRow};

/// Columns that must be present once names are normalized.
const REQUIRED_COLUMNS: [&str; 2] = ["line", "min_delay"];

/// Record fields read from the source, by normalized column name.
const RECORD_FIELDS: [&str; 10] = [
    "date", "time", "day", "station", "code", "min_delay", "min_gap", "bound", "line", "vehicle",
];

/// Alternative column names that feed the same record field.
const FIELD_ALIASES: [(&str, &str); 2] = [("day", "day_of_week"), ("code", "delay_code")];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];
const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

/// Maps a column name to a lower-case, underscore-separated identifier.
///
/// `"Min Delay"`, `"MinDelay"` and `"min-delay"` all become `"min_delay"`.
/// Names with no alphanumeric characters become `"unnamed"`.
pub fn normalize_column_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev: Option<char> = None;

    for c in name.chars() {
        if c.is_alphanumeric() {
            // camelCase boundary
            if c.is_uppercase()
                && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit())
                && !out.is_empty()
                && !out.ends_with('_')
            {
                out.push('_');
            }
            // Lowercasing can add combining marks, e.g. 'İ' -> "i\u{307}".
            out.extend(c.to_lowercase().filter(|lc| lc.is_alphanumeric()));
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
        prev = Some(c);
    }

    while out.ends_with('_') {
        out.pop();
    }

    if out.is_empty() {
        "unnamed".to_string()
    } else {
        out
    }
}

/// Normalizes every column name, rejecting schemas where two distinct names
/// collapse onto the same identifier.
pub fn normalize_columns(names: &[String]) -> Result<Vec<String>, SchemaError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    let mut normalized = Vec::with_capacity(names.len());

    for name in names {
        let clean = normalize_column_name(name);
        if let Some(first) = seen.get(&clean) {
            if *first != name.as_str() {
                return Err(SchemaError::Collision {
                    first: first.to_string(),
                    second: name.clone(),
                    normalized: clean,
                });
            }
        } else {
            seen.insert(clean.clone(), name);
        }
        normalized.push(clean);
    }

    Ok(normalized)
}

/// Rejects schemas where two source columns would fill the same record field,
/// either as exact duplicates or as a name and its alias.
fn check_field_sources(names: &[String], columns: &[String]) -> Result<(), SchemaError> {
    let mut claimed: HashMap<&str, &String> = HashMap::new();

    for (name, column) in names.iter().zip(columns) {
        let field = FIELD_ALIASES
            .iter()
            .find(|(_, alias)| *alias == column.as_str())
            .map_or(column.as_str(), |(field, _)| *field);
        if !RECORD_FIELDS.contains(&field) {
            continue;
        }

        if let Some(first) = claimed.insert(field, name) {
            return Err(SchemaError::Collision {
                first: first.clone(),
                second: name.clone(),
                normalized: field.to_string(),
            });
        }
    }

    Ok(())
}

/// Pads a short row with empty cells and drops cells past the last column.
fn fit_to_width(row: &StringRecord, width: usize) -> Cow<'_, StringRecord> {
    if row.len() == width {
        return Cow::Borrowed(row);
    }

    let mut fitted: StringRecord = row.iter().take(width).collect();
    while fitted.len() < width {
        fitted.push_field("");
    }
    Cow::Owned(fitted)
}

/// Recodes a raw line code into its canonical name. Unknown codes, composite
/// codes such as `"YU/BD"` and empty strings pass through unchanged.
pub fn recode_line(raw: &str) -> String {
    canonical_name(raw)
        .map(str::to_string)
        .unwrap_or_else(|| raw.to_string())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
}

impl From<RawDelayRow> for DelayRecord {
    fn from(raw: RawDelayRow) -> Self {
        DelayRecord {
            date: parse_date(&raw.date),
            time: parse_time(&raw.time),
            day_of_week: raw.day,
            station: raw.station,
            delay_code: raw.code,
            min_delay: raw.min_delay.filter(|d| d.is_finite()),
            min_gap: raw.min_gap.filter(|g| g.is_finite()),
            bound: raw.bound,
            line: recode_line(&raw.line),
            vehicle: raw.vehicle,
        }
    }
}

/// Normalizes column names and recodes `line` for every row of `table`.
///
/// # Errors
///
/// Returns [`CleanError::Schema`] on a name collision, when two columns fill
/// the same field, or when `line` or `min_delay` is missing, and
/// [`CleanError::Row`] when a row cannot be read.
#[tracing::instrument(skip_all, fields(rows = table.len()))]
pub fn clean(table: &RawTable) -> Result<Vec<DelayRecord>, CleanError> {
    let columns = normalize_columns(&table.headers)?;

    for required in REQUIRED_COLUMNS {
        if !columns.iter().any(|c| c == required) {
            return Err(SchemaError::MissingColumn(required.to_string()).into());
        }
    }
    check_field_sources(&table.headers, &columns)?;

    let headers = StringRecord::from(columns);
    let mut records = Vec::with_capacity(table.len());
    let mut recoded = 0usize;
    let mut ragged = 0usize;

    for (idx, row) in table.rows.iter().enumerate() {
        let row = fit_to_width(row, headers.len());
        if matches!(row, Cow::Owned(_)) {
            ragged += 1;
        }

        let raw: RawDelayRow = row
            .deserialize(Some(&headers))
            .map_err(|source| CleanError::Row {
                row: idx + 1,
                source,
            })?;

        if canonical_name(&raw.line).is_some() {
            recoded += 1;
        } else {
            debug!(row = idx + 1, line = %raw.line, "Line code passed through");
        }
        records.push(DelayRecord::from(raw));
    }

    info!(
        rows = records.len(),
        recoded,
        passed_through = records.len() - recoded,
        ragged,
        "Cleaned delay records"
    );

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_delays;

    fn headers() -> Vec<&'static str> {
        vec![
            "Date",
            "Time",
            "Day",
            "Station",
            "Code",
            "Min Delay",
            "Min Gap",
            "Bound",
            "Line",
            "Vehicle",
        ]
    }

    #[test]
    fn test_normalize_column_name_examples() {
        assert_eq!(normalize_column_name("Min Delay"), "min_delay");
        assert_eq!(normalize_column_name("MinDelay"), "min_delay");
        assert_eq!(normalize_column_name("  MIN-DELAY "), "min_delay");
        assert_eq!(normalize_column_name("Day"), "day");
        assert_eq!(normalize_column_name("Line 1"), "line_1");
        assert_eq!(normalize_column_name("\u{feff}Date"), "date");
        assert_eq!(normalize_column_name("--"), "unnamed");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let names: Vec<String> = headers().iter().map(|h| h.to_string()).collect();
        let once = normalize_columns(&names).unwrap();
        let twice = normalize_columns(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_is_idempotent_for_non_ascii_names() {
        let names: Vec<String> = [
            "İD",
            "Straße",
            "ÉTAT Ligne",
            "ΩMega",
            "Ǆwell",
            "Café\u{301}Time",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect();
        let once = normalize_columns(&names).unwrap();
        let twice = normalize_columns(&once).unwrap();

        assert_eq!(once[0], "id");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_collision_is_schema_error() {
        let names = vec!["Min Delay".to_string(), "min_delay".to_string()];
        let err = normalize_columns(&names).unwrap_err();

        assert_eq!(
            err,
            SchemaError::Collision {
                first: "Min Delay".to_string(),
                second: "min_delay".to_string(),
                normalized: "min_delay".to_string(),
            }
        );
    }

    #[test]
    fn test_recode_known_codes() {
        assert_eq!(recode_line("YU"), "Line 01 Yellow");
        assert_eq!(recode_line("BD"), "Line 02 Green");
        assert_eq!(recode_line("SRT"), "Line 03 Scarborough");
        assert_eq!(recode_line("SHP"), "Line 04 Sheppard");
    }

    #[test]
    fn test_recode_passes_through_unknown() {
        assert_eq!(recode_line("YU/BD"), "YU/BD");
        assert_eq!(recode_line(""), "");
        assert_eq!(recode_line("999"), "999");
    }

    #[test]
    fn test_clean_preserves_row_count_and_recodes() {
        let table = RawTable::from_cells(
            &headers(),
            &[
                vec![
                    "2024-01-01",
                    "02:00",
                    "Monday",
                    "KIPLING STATION",
                    "MUI",
                    "5",
                    "10",
                    "W",
                    "BD",
                    "5001",
                ],
                vec![
                    "2024-01-01",
                    "02:05",
                    "Monday",
                    "UNION STATION",
                    "MUSC",
                    "0",
                    "0",
                    "S",
                    "YU/BD",
                    "0",
                ],
                vec![
                    "2024-01-02",
                    "14:10",
                    "Tuesday",
                    "FINCH STATION",
                    "PUOPO",
                    "",
                    "",
                    "",
                    "",
                    "",
                ],
            ],
        );

        let records = clean(&table).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].line, "Line 02 Green");
        assert_eq!(records[1].line, "YU/BD");
        assert_eq!(records[2].line, "");
        assert_eq!(records[0].min_delay, Some(5.0));
        assert_eq!(records[2].min_delay, None);
        assert_eq!(records[0].day_of_week, "Monday");
        assert_eq!(records[0].delay_code, "MUI");
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(records[0].time, NaiveTime::from_hms_opt(2, 0, 0));
    }

    #[test]
    fn test_clean_accepts_minimal_columns() {
        let table = RawTable::from_cells(&["LINE", "Min Delay"], &[vec!["SHP", "3"]]);
        let records = clean(&table).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].line, "Line 04 Sheppard");
        assert_eq!(records[0].station, "");
    }

    #[test]
    fn test_clean_missing_min_delay_is_schema_error() {
        let table = RawTable::from_cells(&["Line", "Station"], &[vec!["YU", "X"]]);
        let err = clean(&table).unwrap_err();

        assert!(matches!(
            err,
            CleanError::Schema(SchemaError::MissingColumn(ref c)) if c == "min_delay"
        ));
    }

    #[test]
    fn test_clean_unparseable_delay_is_missing() {
        let table = RawTable::from_cells(&["Line", "Min Delay"], &[vec!["YU", "n/a"]]);
        let records = clean(&table).unwrap();
        assert_eq!(records[0].min_delay, None);
    }

    #[test]
    fn test_clean_ignores_extra_columns() {
        let table = RawTable::from_cells(
            &["_id", "Line", "Min Delay", "Day Of Week"],
            &[vec!["1", "YU", "4", "Friday"]],
        );
        let records = clean(&table).unwrap();

        assert_eq!(records[0].day_of_week, "Friday");
        assert_eq!(records[0].min_delay, Some(4.0));
    }

    #[test]
    fn test_clean_pads_short_rows() {
        let table = parse_delays(b"Line,Min Delay,Bound\nYU,4\nBD,2,E\n").unwrap();
        let records = clean(&table).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, "Line 01 Yellow");
        assert_eq!(records[0].min_delay, Some(4.0));
        assert_eq!(records[0].bound, "");
        assert_eq!(records[1].bound, "E");
    }

    #[test]
    fn test_clean_drops_cells_past_last_column() {
        let table = parse_delays(b"Line,Min Delay\nSHP,3,extra,cells\n").unwrap();
        let records = clean(&table).unwrap();

        assert_eq!(records[0].line, "Line 04 Sheppard");
        assert_eq!(records[0].min_delay, Some(3.0));
    }

    #[test]
    fn test_clean_non_finite_delays_are_missing() {
        let table = RawTable::from_cells(
            &["Line", "Min Delay", "Min Gap"],
            &[
                vec!["YU", "NaN", "inf"],
                vec!["BD", "inf", "-infinity"],
                vec!["SHP", "4", "8"],
            ],
        );
        let records = clean(&table).unwrap();

        assert_eq!(records[0].min_delay, None);
        assert_eq!(records[0].min_gap, None);
        assert_eq!(records[1].min_delay, None);
        assert_eq!(records[1].min_gap, None);
        assert_eq!(records[2].min_delay, Some(4.0));
    }

    #[test]
    fn test_clean_alias_pair_is_schema_error() {
        let table = RawTable::from_cells(
            &["Day", "Day Of Week", "Line", "Min Delay"],
            &[vec!["Monday", "Monday", "YU", "4"]],
        );
        let err = clean(&table).unwrap_err();

        assert!(matches!(
            err,
            CleanError::Schema(SchemaError::Collision { ref first, ref second, ref normalized })
                if first == "Day" && second == "Day Of Week" && normalized == "day"
        ));

        let table = RawTable::from_cells(
            &["Delay Code", "Line", "Code", "Min Delay"],
            &[vec!["MUI", "YU", "MUI", "4"]],
        );
        assert!(matches!(
            clean(&table),
            Err(CleanError::Schema(SchemaError::Collision { .. }))
        ));
    }

    #[test]
    fn test_clean_duplicate_header_is_schema_error() {
        let table = RawTable::from_cells(&["Line", "Line", "Min Delay"], &[vec!["YU", "BD", "4"]]);
        let err = clean(&table).unwrap_err();

        assert_eq!(
            err.to_string(),
            "columns 'Line' and 'Line' both normalize to 'line'"
        );
    }

    #[test]
    fn test_clean_tolerates_duplicate_unused_columns() {
        let table = RawTable::from_cells(
            &["Notes", "Line", "Notes", "Min Delay"],
            &[vec!["a", "YU", "b", "4"]],
        );
        let records = clean(&table).unwrap();
        assert_eq!(records[0].min_delay, Some(4.0));
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-03-05"), NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(parse_date("2024/03/05"), NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(parse_date("05/03/2024"), NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(parse_date("yesterday"), None);
    }
}
