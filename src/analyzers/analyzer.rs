use chrono::Utc;
use tracing::{info, warn};

use crate::analyzers::aggregate::{
    DEFAULT_TOP_N, dataset_summary, day_means, line_bounds, line_counts, line_means, line_modes,
    station_ranking, top_delay_codes,
};
use crate::analyzers::types::{DelayReport, DerivedTable, TableOutcome};
use crate::error::AggregateError;
use crate::record::DelayRecord;

/// Tunables for a report run.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Groups kept by the station and delay-code rankings.
    pub top_n: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }
}

fn outcome<T: DerivedTable>(name: &str, result: Result<T, AggregateError>) -> TableOutcome<T> {
    match &result {
        Ok(table) => info!(table = name, rows = table.row_count(), "Table computed"),
        Err(e) => warn!(table = name, error = %e, "Table has no data"),
    }
    result.into()
}

/// Computes every derived table from the cleaned record set.
///
/// A table whose input is empty is reported as no data; the others are
/// unaffected.
#[tracing::instrument(skip_all, fields(records = records.len(), top_n = options.top_n))]
pub fn analyze(records: &[DelayRecord], options: &ReportOptions) -> DelayReport {
    DelayReport {
        schema_version: 1,
        generated_at: Utc::now(),
        source: None,
        summary: outcome("summary", dataset_summary(records)),
        line_means: outcome("line_means", line_means(records)),
        line_counts: outcome("line_counts", line_counts(records)),
        station_ranking: outcome("station_ranking", station_ranking(records, options.top_n)),
        line_modes: outcome("line_modes", line_modes(records)),
        day_means: outcome("day_means", day_means(records)),
        line_bounds: outcome("line_bounds", line_bounds(records)),
        top_codes: outcome("top_codes", top_delay_codes(records, options.top_n)),
    }
}
