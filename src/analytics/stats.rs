//! Numeric and calendar helpers shared by the analytics.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};

/// Returns the Monday of the week containing `at` (UTC).
pub fn week_start_of(at: DateTime<Utc>) -> NaiveDate {
    let date = at.date_naive();
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}

/// Returns the half-open UTC window `[week_start, week_start + 7 days)`.
pub fn week_bounds(week_start: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = week_start.and_time(NaiveTime::MIN).and_utc();
    let end = (week_start + Days::new(7)).and_time(NaiveTime::MIN).and_utc();
    (start, end)
}

/// Hours elapsed from `from` to `to`; negative when `to` precedes `from`.
pub fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / 3600.0
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median, averaging the two middle values for even lengths.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Population standard deviation divided by the mean.
///
/// `None` when there are fewer than two values or the mean is zero.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    if avg == 0.0 {
        return None;
    }
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt() / avg)
}

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Percentage of `part` in `whole`, 0 when `whole` is zero.
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
