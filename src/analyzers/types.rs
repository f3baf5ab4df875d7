//! Derived tables produced by the aggregation pipeline.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::AggregateError;

/// A table that can be handed to the presentation layer as flat CSV rows.
pub trait DerivedTable {
    type Row: Serialize;

    fn row_count(&self) -> usize;

    /// Rows in presentation order.
    fn csv_rows(&self) -> Vec<Self::Row>;
}

impl<T: Serialize + Clone> DerivedTable for Vec<T> {
    type Row = T;

    fn row_count(&self) -> usize {
        self.len()
    }

    fn csv_rows(&self) -> Vec<T> {
        self.clone()
    }
}

/// Mean positive delay for one canonical line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineMean {
    pub line: String,
    pub events: usize,
    pub mean_delay: f64,
}

/// Per-line mean delay, sorted ascending by line name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LineMeans {
    pub rows: Vec<LineMean>,
}

impl LineMeans {
    /// Looks up the mean for `line`, reporting an absent line as empty input.
    pub fn mean_for(&self, line: &str) -> Result<f64, AggregateError> {
        self.rows
            .iter()
            .find(|r| r.line == line)
            .map(|r| r.mean_delay)
            .ok_or_else(|| AggregateError::empty(format!("mean delay on {line}")))
    }
}

impl DerivedTable for LineMeans {
    type Row = LineMean;

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn csv_rows(&self) -> Vec<LineMean> {
        self.rows.clone()
    }
}

/// Number of delays longer than one minute on one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineCount {
    pub line: String,
    pub count: usize,
}

/// Per-line delay counts plus the grand total across lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineCounts {
    pub rows: Vec<LineCount>,
    pub total: usize,
}

impl LineCounts {
    pub fn count_for(&self, line: &str) -> Option<usize> {
        self.rows.iter().find(|r| r.line == line).map(|r| r.count)
    }
}

impl DerivedTable for LineCounts {
    type Row = LineCount;

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The line rows followed by a `Total` row.
    fn csv_rows(&self) -> Vec<LineCount> {
        let mut rows = self.rows.clone();
        rows.push(LineCount {
            line: "Total".to_string(),
            count: self.total,
        });
        rows
    }
}

/// One ranked (station, line, bound) group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationRank {
    pub rank: usize,
    pub station: String,
    pub line: String,
    pub bound: String,
    pub count: usize,
    pub mean_delay: f64,
}

/// Most frequent delay duration on a canonical line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "LineModeRow")]
pub struct LineMode {
    pub line: String,
    pub mode: Result<f64, AggregateError>,
}

/// Flat form of [`LineMode`]: an undefined mode leaves `mode` empty and
/// explains why in `note`.
#[derive(Debug, Clone, Serialize)]
pub struct LineModeRow {
    pub line: String,
    pub mode: Option<f64>,
    pub note: Option<String>,
}

impl From<LineMode> for LineModeRow {
    fn from(m: LineMode) -> Self {
        match m.mode {
            Ok(mode) => LineModeRow {
                line: m.line,
                mode: Some(mode),
                note: None,
            },
            Err(e) => LineModeRow {
                line: m.line,
                mode: None,
                note: Some(e.to_string()),
            },
        }
    }
}

/// Mean delay for one day of the week over every recorded event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayMean {
    pub day_of_week: String,
    pub events: usize,
    pub mean_delay: f64,
}

/// Positive-delay statistics for one direction of one line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineBoundStat {
    pub line: String,
    pub bound: String,
    pub count: usize,
    pub mean_delay: f64,
}

/// One ranked delay code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeCount {
    pub rank: usize,
    pub delay_code: String,
    pub count: usize,
    pub mean_delay: f64,
}

/// Headline figures for the whole record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub total_events: usize,
    pub delayed_events: usize,
    pub zero_delay_events: usize,
    pub missing_delay_events: usize,
    pub mean_delay: Option<f64>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    /// Events on each canonical line, whatever their delay.
    pub line_events: Vec<LineCount>,
}

impl DatasetSummary {
    pub fn events_for(&self, line: &str) -> Option<usize> {
        self.line_events
            .iter()
            .find(|r| r.line == line)
            .map(|r| r.count)
    }
}

/// One `metric,value` row of the flat summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryMetric {
    pub metric: String,
    pub value: String,
}

impl SummaryMetric {
    fn new(metric: impl Into<String>, value: Option<impl ToString>) -> Self {
        Self {
            metric: metric.into(),
            value: value.map(|v| v.to_string()).unwrap_or_default(),
        }
    }
}

impl DerivedTable for DatasetSummary {
    type Row = SummaryMetric;

    fn row_count(&self) -> usize {
        1
    }

    /// One row per figure, then one `events <line>` row per canonical line.
    fn csv_rows(&self) -> Vec<SummaryMetric> {
        let mut rows = vec![
            SummaryMetric::new("total_events", Some(self.total_events)),
            SummaryMetric::new("delayed_events", Some(self.delayed_events)),
            SummaryMetric::new("zero_delay_events", Some(self.zero_delay_events)),
            SummaryMetric::new("missing_delay_events", Some(self.missing_delay_events)),
            SummaryMetric::new("mean_delay", self.mean_delay),
            SummaryMetric::new("first_date", self.first_date),
            SummaryMetric::new("last_date", self.last_date),
        ];
        rows.extend(
            self.line_events
                .iter()
                .map(|e| SummaryMetric::new(format!("events {}", e.line), Some(e.count))),
        );
        rows
    }
}

/// A derived table, or the reason it could not be produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableOutcome<T> {
    Ready { table: T },
    NoData { reason: String },
}

impl<T> TableOutcome<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            TableOutcome::Ready { table } => Some(table),
            TableOutcome::NoData { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, TableOutcome::Ready { .. })
    }
}

impl<T> From<Result<T, AggregateError>> for TableOutcome<T> {
    fn from(result: Result<T, AggregateError>) -> Self {
        match result {
            Ok(table) => TableOutcome::Ready { table },
            Err(e) => TableOutcome::NoData {
                reason: e.to_string(),
            },
        }
    }
}

/// Every derived table for one run, in report order.
#[derive(Debug, Clone, Serialize)]
pub struct DelayReport {
    pub schema_version: u8,
    pub generated_at: DateTime<Utc>,
    pub source: Option<String>,
    pub summary: TableOutcome<DatasetSummary>,
    pub line_means: TableOutcome<LineMeans>,
    pub line_counts: TableOutcome<LineCounts>,
    pub station_ranking: TableOutcome<Vec<StationRank>>,
    pub line_modes: TableOutcome<Vec<LineMode>>,
    pub day_means: TableOutcome<Vec<DayMean>>,
    pub line_bounds: TableOutcome<Vec<LineBoundStat>>,
    pub top_codes: TableOutcome<Vec<CodeCount>>,
}

impl DelayReport {
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }
}
