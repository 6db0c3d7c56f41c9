// Utility helpers for parsing and basic statistics.
//
// Spreadsheet exports are inconsistent about currency and date formatting;
// everything that turns a cell into a typed value lives here so the rest of
// the crate only ever sees `Option<f64>` and `Option<NaiveDateTime>`.
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

const SECONDS_PER_DAY: i64 = 86_400;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d-%b-%Y", "%d %b %Y"];

/// Parse a currency cell such as `"$1,250.00"`.
///
/// - Strips `$` and thousands separators.
/// - Trims whitespace.
/// - Returns `None` for blanks and anything that is not a number afterwards.
pub fn parse_currency(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let cleaned: String = s.chars().filter(|c| *c != '$' && *c != ',').collect();
    let v = cleaned.trim().parse::<f64>().ok()?;
    // "NaN"/"inf" parse as floats but are not amounts.
    v.is_finite().then_some(v)
}

/// Parse a timestamp cell in any of the renditions spreadsheet tools emit.
/// Bare dates are taken at midnight.
pub fn parse_datetime_safe(s: Option<&str>) -> Option<NaiveDateTime> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    parse_datetime_safe(s).map(|dt| dt.date())
}

/// Whole days from `start` to `end`, rounded towards negative infinity so a
/// partial day never counts and negative spans stay negative.
pub fn floor_days(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    (end - start).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Sum treating missing amounts as zero.
pub fn sum_present<I>(values: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    values.into_iter().flatten().fold(0.0, |acc, v| acc + v)
}

/// Arithmetic mean of the present values. Empty input yields NaN; callers
/// that display the number go through `nan_to_zero`.
pub fn mean_present<I>(values: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, n) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        return f64::NAN;
    }
    sum / n as f64
}

pub fn nan_to_zero(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v
    }
}

/// `(current - previous) / previous * 100`, or `0` when there is no usable
/// baseline.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 || !previous.is_finite() {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let n = nan_to_zero(n);
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Compact currency for metric tiles: `$1.23 M`, `$4.56 K`, `$7.89`.
pub fn format_kpi_value(v: f64) -> String {
    let v = nan_to_zero(v);
    if v >= 1e6 {
        format!("${:.2} M", v / 1e6)
    } else if v >= 1e3 {
        format!("${:.2} K", v / 1e3)
    } else {
        format!("${:.2}", v)
    }
}
