use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// Matches `YYYY[sep]MM[sep]DD` within digit/separator text
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})[./-]?(\d{1,2})[./-]?(\d{1,2})").unwrap());

/// Matches a `HH:MM~HH:MM` range (tilde or dash separated)
static TIME_RANGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}):(\d{2})\s*[~\-–]\s*(\d{1,2}):(\d{2})").unwrap());

/// Matches a single `HH:MM`
static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}):(\d{2})").unwrap());

/// Fallback formats tried verbatim against the trimmed input
const FALLBACK_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y.%m.%d",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
];

/// Start and optional end time of day, as zero-padded `HH:MM` strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub start: String,
    pub end: Option<String>,
}

/// Parses heterogeneous date text into a calendar date
///
/// Tries, in order: reduce the text to digits and separators and match a
/// `YYYY[sep]MM[sep]DD` pattern; then generic parsing of the original text
/// against a fixed format list. No timezone conversion is performed; the
/// result is a local wall-clock date.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(date) = scan_dates(trimmed).next() {
        return Some(date);
    }

    for format in FALLBACK_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    None
}

/// Parses date text that may carry a start and an end date
///
/// Returns the first date found plus the second when present and not before
/// the first (listing rows commonly read `2025.03.01 ~ 2025.03.05`).
pub fn parse_date_range(text: &str) -> Option<(NaiveDate, Option<NaiveDate>)> {
    let trimmed = text.trim();
    let mut dates = scan_dates(trimmed);

    let start = match dates.next() {
        Some(date) => date,
        None => return parse_date(trimmed).map(|d| (d, None)),
    };
    let end = dates.next().filter(|end| *end >= start);

    Some((start, end))
}

/// Extracts a time-of-day range from free text
///
/// Searches for a `HH:MM~HH:MM` pair first; failing that, a single `HH:MM`
/// is taken as the start time only. Out-of-range values are ignored.
pub fn parse_time_range(text: &str) -> Option<TimeRange> {
    if let Some(caps) = TIME_RANGE_PATTERN.captures(text) {
        let start = format_time(&caps[1], &caps[2]);
        let end = format_time(&caps[3], &caps[4]);
        if let (Some(start), end) = (start, end) {
            return Some(TimeRange { start, end });
        }
    }

    let caps = TIME_PATTERN.captures(text)?;
    format_time(&caps[1], &caps[2]).map(|start| TimeRange { start, end: None })
}

/// Yields every valid calendar date found in the text, in order
///
/// Characters other than digits and date separators are blanked (not
/// deleted) so adjacent numbers such as time-of-day digits cannot fuse onto
/// a date.
fn scan_dates(text: &str) -> impl Iterator<Item = NaiveDate> + '_ {
    let compact: String = text
        .chars()
        .map(|c| {
            if c.is_ascii_digit() || matches!(c, '.' | '-' | '/') {
                c
            } else {
                ' '
            }
        })
        .collect();

    DATE_PATTERN
        .captures_iter(&compact)
        .filter_map(|caps| captures_to_date(&caps))
        .collect::<Vec<_>>()
        .into_iter()
}

fn captures_to_date(caps: &regex::Captures<'_>) -> Option<NaiveDate> {
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn format_time(hour: &str, minute: &str) -> Option<String> {
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(format!("{:02}:{:02}", hour, minute))
}
