use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// One observed subway delay event after cleaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DelayRecord {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub day_of_week: String,
    pub station: String,
    pub delay_code: String,
    pub min_delay: Option<f64>,
    pub min_gap: Option<f64>,
    pub bound: String,
    pub line: String,
    pub vehicle: String,
}

impl DelayRecord {
    /// Returns the delay in minutes if it is strictly greater than `threshold`.
    pub fn delay_over(&self, threshold: f64) -> Option<f64> {
        self.min_delay.filter(|d| *d > threshold)
    }

    /// Returns the delay in minutes if it is strictly positive.
    pub fn positive_delay(&self) -> Option<f64> {
        self.delay_over(0.0)
    }
}

/// A row keyed by normalized column names, before recoding.
///
/// Every column except `line` and `min_delay` may be absent from the source.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawDelayRow {
    pub(crate) date: String,
    pub(crate) time: String,
    #[serde(alias = "day_of_week")]
    pub(crate) day: String,
    pub(crate) station: String,
    #[serde(alias = "delay_code")]
    pub(crate) code: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub(crate) min_delay: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub(crate) min_gap: Option<f64>,
    pub(crate) bound: String,
    pub(crate) line: String,
    pub(crate) vehicle: String,
}
