use std::collections::BTreeMap;

use chrono::Weekday;

use crate::analyzers::types::{
    CodeCount, DatasetSummary, DayMean, LineBoundStat, LineCount, LineCounts, LineMean,
    LineMeans, LineMode, StationRank,
};
use crate::analyzers::utility::{group_in_order, mean, mode, round2, top_by_count};
use crate::error::AggregateError;
use crate::lines::{CANONICAL_LINES, is_canonical};
use crate::record::DelayRecord;

/// Delays must exceed this many minutes to be counted in [`line_counts`].
pub const COUNT_THRESHOLD_MINUTES: f64 = 1.0;

/// Default number of groups kept by the ranking tables.
pub const DEFAULT_TOP_N: usize = 10;

/// Mean positive delay per canonical line, rounded to two decimals and
/// sorted by line name.
pub fn line_means(records: &[DelayRecord]) -> Result<LineMeans, AggregateError> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();

    for r in records {
        if let Some(d) = r.positive_delay() {
            groups.entry(r.line.as_str()).or_default().push(d);
        }
    }

    let rows: Vec<LineMean> = groups
        .into_iter()
        .filter(|(line, _)| is_canonical(line))
        .filter_map(|(line, delays)| {
            mean(&delays).map(|m| LineMean {
                line: line.to_string(),
                events: delays.len(),
                mean_delay: round2(m),
            })
        })
        .collect();

    if rows.is_empty() {
        return Err(AggregateError::empty("per-line mean delay"));
    }

    Ok(LineMeans { rows })
}

/// Number of delays longer than one minute per canonical line, with the total.
pub fn line_counts(records: &[DelayRecord]) -> Result<LineCounts, AggregateError> {
    let mut groups: BTreeMap<&str, usize> = BTreeMap::new();

    for r in records {
        if r.delay_over(COUNT_THRESHOLD_MINUTES).is_some() && is_canonical(&r.line) {
            *groups.entry(r.line.as_str()).or_default() += 1;
        }
    }

    if groups.is_empty() {
        return Err(AggregateError::empty("per-line delay counts"));
    }

    let rows: Vec<LineCount> = groups
        .into_iter()
        .map(|(line, count)| LineCount {
            line: line.to_string(),
            count,
        })
        .collect();
    let total = rows.iter().map(|r| r.count).sum();

    Ok(LineCounts { rows, total })
}

/// The `top_n` (station, line, bound) groups with the most positive delays.
///
/// Equal counts keep the order in which the groups first appear in `records`.
pub fn station_ranking(
    records: &[DelayRecord],
    top_n: usize,
) -> Result<Vec<StationRank>, AggregateError> {
    let groups = group_in_order(records.iter().filter_map(|r| {
        r.positive_delay()
            .map(|d| ((r.station.as_str(), r.line.as_str(), r.bound.as_str()), d))
    }));

    if groups.is_empty() {
        return Err(AggregateError::empty("station ranking"));
    }

    Ok(top_by_count(groups, top_n)
        .into_iter()
        .enumerate()
        .map(|(i, ((station, line, bound), delays))| StationRank {
            rank: i + 1,
            station: station.to_string(),
            line: line.to_string(),
            bound: bound.to_string(),
            count: delays.len(),
            mean_delay: mean(&delays).map(round2).unwrap_or_default(),
        })
        .collect())
}

/// Most frequent positive delay on `line`.
pub fn line_mode(records: &[DelayRecord], line: &str) -> Result<f64, AggregateError> {
    let delays: Vec<f64> = records
        .iter()
        .filter(|r| r.line == line)
        .filter_map(DelayRecord::positive_delay)
        .collect();

    mode(&delays).ok_or_else(|| AggregateError::UndefinedMode {
        line: line.to_string(),
    })
}

/// Mode of positive delays for each canonical line, in line-number order.
/// Lines without positive delays carry an undefined-mode error.
pub fn line_modes(records: &[DelayRecord]) -> Result<Vec<LineMode>, AggregateError> {
    let any_positive = records
        .iter()
        .any(|r| is_canonical(&r.line) && r.positive_delay().is_some());
    if !any_positive {
        return Err(AggregateError::empty("per-line delay mode"));
    }

    Ok(CANONICAL_LINES
        .iter()
        .map(|line| LineMode {
            line: line.to_string(),
            mode: line_mode(records, line),
        })
        .collect())
}

fn weekday_order(day: &str) -> (u32, String) {
    let position = day
        .parse::<Weekday>()
        .map(|d| d.num_days_from_monday())
        .unwrap_or(7);
    (position, day.to_string())
}

/// Mean delay per day of week over every record with a recorded delay,
/// zero-minute delays included. Days run Monday to Sunday, unrecognised
/// names after them alphabetically.
pub fn day_means(records: &[DelayRecord]) -> Result<Vec<DayMean>, AggregateError> {
    let mut groups: BTreeMap<(u32, String), Vec<f64>> = BTreeMap::new();

    for r in records {
        if r.day_of_week.is_empty() {
            continue;
        }
        if let Some(d) = r.min_delay {
            groups
                .entry(weekday_order(&r.day_of_week))
                .or_default()
                .push(d);
        }
    }

    if groups.is_empty() {
        return Err(AggregateError::empty("day-of-week mean delay"));
    }

    Ok(groups
        .into_iter()
        .filter_map(|((_, day), delays)| {
            mean(&delays).map(|m| DayMean {
                day_of_week: day,
                events: delays.len(),
                mean_delay: round2(m),
            })
        })
        .collect())
}

/// Positive-delay count and mean for each direction of each canonical line.
pub fn line_bounds(records: &[DelayRecord]) -> Result<Vec<LineBoundStat>, AggregateError> {
    let mut groups: BTreeMap<(&str, &str), Vec<f64>> = BTreeMap::new();

    for r in records {
        if !is_canonical(&r.line) {
            continue;
        }
        if let Some(d) = r.positive_delay() {
            groups
                .entry((r.line.as_str(), r.bound.as_str()))
                .or_default()
                .push(d);
        }
    }

    if groups.is_empty() {
        return Err(AggregateError::empty("per-direction delays"));
    }

    Ok(groups
        .into_iter()
        .filter_map(|((line, bound), delays)| {
            mean(&delays).map(|m| LineBoundStat {
                line: line.to_string(),
                bound: bound.to_string(),
                count: delays.len(),
                mean_delay: round2(m),
            })
        })
        .collect())
}

/// The `top_n` delay codes by number of positive delays.
pub fn top_delay_codes(
    records: &[DelayRecord],
    top_n: usize,
) -> Result<Vec<CodeCount>, AggregateError> {
    let groups = group_in_order(
        records
            .iter()
            .filter(|r| !r.delay_code.is_empty())
            .filter_map(|r| r.positive_delay().map(|d| (r.delay_code.as_str(), d))),
    );

    if groups.is_empty() {
        return Err(AggregateError::empty("delay code ranking"));
    }

    Ok(top_by_count(groups, top_n)
        .into_iter()
        .enumerate()
        .map(|(i, (code, delays))| CodeCount {
            rank: i + 1,
            delay_code: code.to_string(),
            count: delays.len(),
            mean_delay: mean(&delays).map(round2).unwrap_or_default(),
        })
        .collect())
}

/// Event totals and date coverage for the whole record set.
pub fn dataset_summary(records: &[DelayRecord]) -> Result<DatasetSummary, AggregateError> {
    if records.is_empty() {
        return Err(AggregateError::empty("dataset summary"));
    }

    let positive: Vec<f64> = records
        .iter()
        .filter_map(DelayRecord::positive_delay)
        .collect();
    let zero_delay_events = records.iter().filter(|r| r.min_delay == Some(0.0)).count();
    let missing_delay_events = records.iter().filter(|r| r.min_delay.is_none()).count();

    Ok(DatasetSummary {
        total_events: records.len(),
        delayed_events: positive.len(),
        zero_delay_events,
        missing_delay_events,
        mean_delay: mean(&positive).map(round2),
        first_date: records.iter().filter_map(|r| r.date).min(),
        last_date: records.iter().filter_map(|r| r.date).max(),
        line_events: CANONICAL_LINES
            .iter()
            .map(|line| LineCount {
                line: line.to_string(),
                count: records.iter().filter(|r| r.line == *line).count(),
            })
            .collect(),
    })
}
