//! Reporting arithmetic shared by the dashboard endpoints.
//!
//! Every activity metric is reported for a *current* window and compared
//! against a *previous* window of the same length that ends where the
//! current one starts. Time series are bucketed by UTC hour and keyed as
//! `YYYY-MM-DD HH:00:00` so the frontend can plot them directly.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, TimeDelta, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Error returned when a `durationType` value is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown duration type: {0} (expected 12hours, 24hours, weekly or monthly)")]
pub struct UnknownDuration(pub String);

/// Reporting window length selected by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationType {
    #[serde(rename = "12hours")]
    TwelveHours,
    #[serde(rename = "24hours")]
    TwentyFourHours,
    #[serde(rename = "weekly")]
    Weekly,
    #[serde(rename = "monthly")]
    Monthly,
}

impl DurationType {
    /// Length of the window.
    #[must_use]
    pub const fn length(&self) -> TimeDelta {
        match self {
            Self::TwelveHours => TimeDelta::hours(12),
            Self::TwentyFourHours => TimeDelta::hours(24),
            Self::Weekly => TimeDelta::days(7),
            Self::Monthly => TimeDelta::days(30),
        }
    }

    /// The window ending at `now` and the window of equal length before it.
    #[must_use]
    pub fn window(&self, now: DateTime<Utc>) -> ComparisonWindow {
        ComparisonWindow::trailing(now - self.length(), now)
    }
}

impl std::str::FromStr for DurationType {
    type Err = UnknownDuration;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "12hours" => Ok(Self::TwelveHours),
            "24hours" => Ok(Self::TwentyFourHours),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(UnknownDuration(other.to_string())),
        }
    }
}

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    #[must_use]
    pub fn length(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// A current reporting range and the equally long range before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonWindow {
    pub current: TimeRange,
    pub previous: TimeRange,
}

impl ComparisonWindow {
    /// Window covering `[start, now)` compared with the period just before.
    ///
    /// A `start` in the future collapses the current range to zero length.
    #[must_use]
    pub fn trailing(start: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let start = start.min(now);
        let length = now - start;
        Self {
            current: TimeRange { start, end: now },
            previous: TimeRange {
                start: start - length,
                end: start,
            },
        }
    }
}

/// Relative change from `previous` to `current`, in percent, 2 decimals.
///
/// When `previous` is zero the change is reported as `100.0` if anything
/// happened in the current window and `0.0` otherwise.
#[must_use]
pub fn percentage_change(current: i64, previous: i64) -> f64 {
    if previous == 0 {
        return if current > 0 { 100.0 } else { 0.0 };
    }
    #[allow(clippy::cast_precision_loss)] // dashboard counters stay far below 2^52
    let change = (current - previous) as f64 / previous.abs() as f64 * 100.0;
    (change * 100.0).round() / 100.0
}

/// Direction and size of a metric's change between two windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vertical {
    pub positive: bool,
    pub change_percentage: f64,
}

impl Vertical {
    #[must_use]
    pub fn between(current: i64, previous: i64) -> Self {
        Self {
            positive: current >= previous,
            change_percentage: percentage_change(current, previous),
        }
    }
}

/// An amount in the store currency's minor unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Money {
    pub value: i64,
    pub currency_type: String,
}

impl Money {
    #[must_use]
    pub fn new(value: i64, currency: &str) -> Self {
        Self {
            value,
            currency_type: currency.to_string(),
        }
    }
}

/// Truncate a timestamp to the start of its UTC hour.
#[must_use]
pub fn truncate_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Series key for the hour containing `ts`.
#[must_use]
pub fn hour_bucket_key(ts: DateTime<Utc>) -> String {
    truncate_to_hour(ts).format("%Y-%m-%d %H:00:00").to_string()
}

/// Start of the next UTC day after `now`.
#[must_use]
pub fn next_day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .checked_add_days(Days::new(1))
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map_or(now + TimeDelta::days(1), |d| d.and_utc())
}

/// Whole hours from `now` until `end`, never negative.
#[must_use]
pub fn hours_until(end: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (end - now).num_hours().max(0)
}

/// Hour-bucketed counters, ordered by time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HourlySeries(BTreeMap<String, i64>);

impl HourlySeries {
    /// Build a sparse series, summing points that fall in the same hour.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (DateTime<Utc>, i64)>,
    {
        let mut series = Self::default();
        series.add_points(points);
        series
    }

    /// Build a series with a zero entry for every hour of `range`.
    pub fn dense<I>(range: &TimeRange, points: I) -> Self
    where
        I: IntoIterator<Item = (DateTime<Utc>, i64)>,
    {
        let mut series = Self::default();
        let mut hour = truncate_to_hour(range.start);
        while hour < range.end {
            series.0.insert(hour_bucket_key(hour), 0);
            hour += TimeDelta::hours(1);
        }
        series.add_points(points);
        series
    }

    fn add_points<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = (DateTime<Utc>, i64)>,
    {
        for (ts, value) in points {
            *self.0.entry(hour_bucket_key(ts)).or_insert(0) += value;
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<i64> {
        self.0.get(key).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> i64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_percentage_change_basic() {
        assert!((percentage_change(150, 100) - 50.0).abs() < f64::EPSILON);
        assert!((percentage_change(50, 100) + 50.0).abs() < f64::EPSILON);
        assert!((percentage_change(100, 100)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percentage_change_rounds_to_two_decimals() {
        // 1/3 increase
        assert!((percentage_change(4, 3) - 33.33).abs() < 1e-9);
    }

    #[test]
    fn test_percentage_change_zero_guard() {
        assert!((percentage_change(5, 0) - 100.0).abs() < f64::EPSILON);
        assert!(percentage_change(0, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_vertical_direction() {
        assert!(Vertical::between(10, 10).positive);
        assert!(Vertical::between(11, 10).positive);
        assert!(!Vertical::between(9, 10).positive);
    }

    #[test]
    fn test_vertical_serializes_pascal_case() {
        let json = serde_json::to_value(Vertical::between(20, 10)).unwrap();
        assert_eq!(json["Positive"], true);
        assert_eq!(json["ChangePercentage"], 100.0);
    }

    #[test]
    fn test_duration_type_parse() {
        assert_eq!("12hours".parse(), Ok(DurationType::TwelveHours));
        assert_eq!("24hours".parse(), Ok(DurationType::TwentyFourHours));
        assert_eq!("weekly".parse(), Ok(DurationType::Weekly));
        assert_eq!("monthly".parse(), Ok(DurationType::Monthly));
        assert!("yearly".parse::<DurationType>().is_err());
    }

    #[test]
    fn test_duration_window_is_contiguous() {
        let now = at(2024, 3, 10, 12, 0);
        let window = DurationType::Weekly.window(now);
        assert_eq!(window.current.end, now);
        assert_eq!(window.current.start, at(2024, 3, 3, 12, 0));
        assert_eq!(window.previous.end, window.current.start);
        assert_eq!(window.previous.start, at(2024, 2, 25, 12, 0));
        assert_eq!(window.previous.length(), window.current.length());
    }

    #[test]
    fn test_trailing_window_clamps_future_start() {
        let now = at(2024, 3, 10, 12, 0);
        let window = ComparisonWindow::trailing(at(2024, 3, 11, 0, 0), now);
        assert_eq!(window.current.start, now);
        assert_eq!(window.current.length(), TimeDelta::zero());
    }

    #[test]
    fn test_hour_bucket_key_format() {
        assert_eq!(hour_bucket_key(at(2024, 1, 5, 9, 47)), "2024-01-05 09:00:00");
    }

    #[test]
    fn test_sparse_series_sums_same_hour() {
        let series = HourlySeries::from_points([
            (at(2024, 1, 5, 9, 1), 3),
            (at(2024, 1, 5, 9, 59), 4),
            (at(2024, 1, 5, 11, 0), 1),
        ]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.get("2024-01-05 09:00:00"), Some(7));
        assert_eq!(series.total(), 8);
    }

    #[test]
    fn test_dense_series_fills_gaps() {
        let range = TimeRange {
            start: at(2024, 1, 5, 9, 30),
            end: at(2024, 1, 5, 12, 30),
        };
        let series = HourlySeries::dense(&range, [(at(2024, 1, 5, 10, 15), 2)]);
        let keys: Vec<&str> = series.iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                "2024-01-05 09:00:00",
                "2024-01-05 10:00:00",
                "2024-01-05 11:00:00",
                "2024-01-05 12:00:00",
            ]
        );
        assert_eq!(series.get("2024-01-05 10:00:00"), Some(2));
        assert_eq!(series.get("2024-01-05 11:00:00"), Some(0));
    }

    #[test]
    fn test_next_day_start() {
        assert_eq!(next_day_start(at(2024, 2, 28, 18, 5)), at(2024, 2, 29, 0, 0));
        assert_eq!(next_day_start(at(2024, 12, 31, 0, 0)), at(2025, 1, 1, 0, 0));
    }

    #[test]
    fn test_hours_until_never_negative() {
        let now = at(2024, 1, 1, 12, 0);
        assert_eq!(hours_until(at(2024, 1, 1, 17, 59), now), 5);
        assert_eq!(hours_until(at(2024, 1, 1, 11, 0), now), 0);
    }
}
