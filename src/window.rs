use crate::error::{GactError, Result};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Timezone mode for rendered timestamps. Threaded explicitly through
/// every formatting call; never ambient state.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum Tz {
    Local,
    Utc,
}

impl Tz {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tz::Local => "local",
            Tz::Utc => "utc",
        }
    }
}

/// What the user asked for, before resolution.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum WindowSpec {
    Month(String),
    Phrase(String),
    SinceUntil { since: String, until: String },
}

/// Half-open time interval. `Calendar` carries concrete bounds computed
/// here; `Opaque` defers parsing to git's own flexible date parser.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum TimeRange {
    Calendar { since: NaiveDateTime, until: NaiveDateTime },
    Opaque { since: String, until: String },
}

impl TimeRange {
    pub fn since_arg(&self) -> String {
        match self {
            TimeRange::Calendar { since, .. } => since.format("%Y-%m-%dT%H:%M:%S").to_string(),
            TimeRange::Opaque { since, .. } => since.clone(),
        }
    }

    pub fn until_arg(&self) -> String {
        match self {
            TimeRange::Calendar { until, .. } => until.format("%Y-%m-%dT%H:%M:%S").to_string(),
            TimeRange::Opaque { until, .. } => until.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct WindowBucket {
    pub label: String,
    pub range: TimeRange,
}

/// A resolution is either one unlabeled range or an ordered list of
/// labeled, non-overlapping buckets — never both.
#[derive(Clone, Debug)]
pub enum Resolution {
    Single(TimeRange),
    Buckets(Vec<WindowBucket>),
}

/// First day of the given `YYYY-MM` month through the first day of the
/// following month, with December rolling into the next year.
pub fn month_bounds(year_month: &str) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let parts: Vec<&str> = year_month.split('-').collect();
    if parts.len() != 2 {
        return Err(GactError::InvalidWindow(format!(
            "expected YYYY-MM, got '{year_month}'"
        )));
    }

    let y: i32 = parts[0]
        .parse()
        .map_err(|_| GactError::InvalidWindow(format!("bad year in '{year_month}'")))?;
    let m: u32 = parts[1]
        .parse()
        .map_err(|_| GactError::InvalidWindow(format!("bad month in '{year_month}'")))?;

    if !(1..=12).contains(&m) {
        return Err(GactError::InvalidWindow(format!(
            "month out of range in '{year_month}'"
        )));
    }

    let (next_y, next_m) = if m == 12 { (y + 1, 1) } else { (y, m + 1) };
    let since = first_of_month(y, m);
    let until = first_of_month(next_y, next_m);
    Ok((since, until))
}

/// Resolve a window spec against `now` into one range or a bucket list.
pub fn resolve(spec: &WindowSpec, now: NaiveDateTime) -> Result<Resolution> {
    match spec {
        WindowSpec::SinceUntil { since, until } => Ok(Resolution::Single(TimeRange::Opaque {
            since: since.clone(),
            until: until.clone(),
        })),
        WindowSpec::Month(ym) => {
            let (since, until) = month_bounds(ym)?;
            Ok(Resolution::Single(TimeRange::Calendar { since, until }))
        }
        WindowSpec::Phrase(phrase) => Ok(resolve_phrase(phrase, now)),
    }
}

fn resolve_phrase(input: &str, now: NaiveDateTime) -> Resolution {
    let phrase = input.trim().to_lowercase();

    if let Some(buckets) = month_series(&phrase, now) {
        return Resolution::Buckets(buckets);
    }
    if let Some(buckets) = week_series(&phrase, now) {
        return Resolution::Buckets(buckets);
    }

    if phrase == "last week" {
        let start_this = start_of_week(now);
        let start_last = start_this - Duration::days(7);
        return Resolution::Single(TimeRange::Calendar {
            since: start_last,
            until: start_this,
        });
    }

    if phrase == "last month" {
        let (y, m) = (now.year(), now.month());
        let (last_y, last_m) = if m == 1 { (y - 1, 12) } else { (y, m - 1) };
        return Resolution::Single(TimeRange::Calendar {
            since: first_of_month(last_y, last_m),
            until: first_of_month(y, m),
        });
    }

    // Anything else is handed to git's date parser verbatim.
    Resolution::Single(TimeRange::Opaque {
        since: input.to_string(),
        until: "now".to_string(),
    })
}

/// "every month for the last N months": N full calendar months, stepping
/// backward from the current month start, returned oldest first.
fn month_series(phrase: &str, now: NaiveDateTime) -> Option<Vec<WindowBucket>> {
    let re = Regex::new(r"^every\s+month\s+for\s+the\s+last\s+(\d+)\s+months?$").ok()?;
    let caps = re.captures(phrase)?;
    let n: usize = caps.get(1)?.as_str().parse().ok()?;
    let n = n.max(1);

    let mut out = Vec::with_capacity(n);
    let mut cursor_y = now.year();
    let mut cursor_m = now.month();
    for _ in 0..n {
        let (prev_y, prev_m) = if cursor_m == 1 {
            (cursor_y - 1, 12)
        } else {
            (cursor_y, cursor_m - 1)
        };

        out.push(WindowBucket {
            label: format!("{prev_y:04}-{prev_m:02}"),
            range: TimeRange::Calendar {
                since: first_of_month(prev_y, prev_m),
                until: first_of_month(cursor_y, cursor_m),
            },
        });

        cursor_y = prev_y;
        cursor_m = prev_m;
    }
    out.reverse();
    Some(out)
}

/// "every week for the last N weeks": Monday-aligned 7-day buckets with
/// ISO week labels, oldest first.
fn week_series(phrase: &str, now: NaiveDateTime) -> Option<Vec<WindowBucket>> {
    let re = Regex::new(r"^every\s+week\s+for\s+the\s+last\s+(\d+)\s+weeks?$").ok()?;
    let caps = re.captures(phrase)?;
    let n: usize = caps.get(1)?.as_str().parse().ok()?;
    let n = n.max(1);

    let mut out = Vec::with_capacity(n);
    let mut cursor = start_of_week(now);
    for _ in 0..n {
        let start = cursor - Duration::days(7);
        let iso = start.iso_week();
        out.push(WindowBucket {
            label: format!("{}-W{:02}", iso.year(), iso.week()),
            range: TimeRange::Calendar {
                since: start,
                until: cursor,
            },
        });
        cursor = start;
    }
    out.reverse();
    Some(out)
}

fn start_of_week(dt: NaiveDateTime) -> NaiveDateTime {
    let weekday = dt.weekday().num_days_from_monday() as i64;
    (dt - Duration::days(weekday)).date().and_hms_opt(0, 0, 0).unwrap()
}

fn first_of_month(year: i32, month: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Deterministic "now" for tests: RFC3339 or naive `%Y-%m-%dT%H:%M:%S`.
pub fn parse_now_override(s: Option<&str>) -> Option<NaiveDateTime> {
    s.and_then(|raw| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Local).naive_local())
            .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").ok())
    })
}

pub fn effective_now(override_now: Option<NaiveDateTime>) -> NaiveDateTime {
    override_now.unwrap_or_else(|| Local::now().naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    #[test]
    fn month_bounds_basic() {
        let (s, u) = month_bounds("2025-08").unwrap();
        assert_eq!(s.format("%Y-%m-%dT%H:%M:%S").to_string(), "2025-08-01T00:00:00");
        assert_eq!(u.format("%Y-%m-%dT%H:%M:%S").to_string(), "2025-09-01T00:00:00");
    }

    #[test]
    fn month_bounds_december_rolls_over() {
        let (s, u) = month_bounds("2024-12").unwrap();
        assert_eq!(s.format("%Y-%m-%dT%H:%M:%S").to_string(), "2024-12-01T00:00:00");
        assert_eq!(u.format("%Y-%m-%dT%H:%M:%S").to_string(), "2025-01-01T00:00:00");
    }

    #[test]
    fn month_bounds_rejects_malformed_input() {
        assert!(month_bounds("2025-13").is_err());
        assert!(month_bounds("2025").is_err());
        assert!(month_bounds("2025-xx").is_err());
        assert!(month_bounds("2025-00").is_err());
    }

    #[test]
    fn invalid_month_maps_to_invalid_window() {
        let err = month_bounds("2025-13").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn since_until_passes_through_verbatim() {
        let spec = WindowSpec::SinceUntil {
            since: "2025-08-01".into(),
            until: "2025-09-01".into(),
        };
        match resolve(&spec, at("2025-08-15T12:00:00")).unwrap() {
            Resolution::Single(r) => {
                assert_eq!(r.since_arg(), "2025-08-01");
                assert_eq!(r.until_arg(), "2025-09-01");
            }
            Resolution::Buckets(_) => panic!("expected single range"),
        }
    }

    #[test]
    fn every_month_last_three_is_oldest_first() {
        let spec = WindowSpec::Phrase("every month for the last 3 months".into());
        let res = resolve(&spec, at("2024-03-15T10:00:00")).unwrap();
        let buckets = match res {
            Resolution::Buckets(b) => b,
            Resolution::Single(_) => panic!("expected buckets"),
        };
        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["2023-12", "2024-01", "2024-02"]);
        assert_eq!(buckets[0].range.since_arg(), "2023-12-01T00:00:00");
        assert_eq!(buckets[0].range.until_arg(), "2024-01-01T00:00:00");
        assert_eq!(buckets[2].range.until_arg(), "2024-03-01T00:00:00");
    }

    #[test]
    fn every_week_last_two_is_monday_aligned() {
        // 2024-03-13 is a Wednesday; the current week began Monday 03-11.
        let spec = WindowSpec::Phrase("every week for the last 2 weeks".into());
        let res = resolve(&spec, at("2024-03-13T09:30:00")).unwrap();
        let buckets = match res {
            Resolution::Buckets(b) => b,
            Resolution::Single(_) => panic!("expected buckets"),
        };
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].range.since_arg(), "2024-02-26T00:00:00");
        assert_eq!(buckets[0].range.until_arg(), "2024-03-04T00:00:00");
        assert_eq!(buckets[1].range.since_arg(), "2024-03-04T00:00:00");
        assert_eq!(buckets[1].range.until_arg(), "2024-03-11T00:00:00");
        assert_eq!(buckets[0].label, "2024-W09");
        assert_eq!(buckets[1].label, "2024-W10");
    }

    #[test]
    fn week_count_below_one_is_clamped() {
        let spec = WindowSpec::Phrase("every week for the last 0 weeks".into());
        match resolve(&spec, at("2024-03-13T09:30:00")).unwrap() {
            Resolution::Buckets(b) => assert_eq!(b.len(), 1),
            Resolution::Single(_) => panic!("expected buckets"),
        }
    }

    #[test]
    fn last_week_is_single_range() {
        let spec = WindowSpec::Phrase("last week".into());
        match resolve(&spec, at("2024-03-13T09:30:00")).unwrap() {
            Resolution::Single(r) => {
                assert_eq!(r.since_arg(), "2024-03-04T00:00:00");
                assert_eq!(r.until_arg(), "2024-03-11T00:00:00");
            }
            Resolution::Buckets(_) => panic!("expected single range"),
        }
    }

    #[test]
    fn last_month_is_single_range_across_year_start() {
        let spec = WindowSpec::Phrase("last month".into());
        match resolve(&spec, at("2024-01-10T08:00:00")).unwrap() {
            Resolution::Single(r) => {
                assert_eq!(r.since_arg(), "2023-12-01T00:00:00");
                assert_eq!(r.until_arg(), "2024-01-01T00:00:00");
            }
            Resolution::Buckets(_) => panic!("expected single range"),
        }
    }

    #[test]
    fn unknown_phrase_falls_back_to_opaque() {
        let spec = WindowSpec::Phrase("three fortnights hence".into());
        match resolve(&spec, at("2024-03-13T09:30:00")).unwrap() {
            Resolution::Single(TimeRange::Opaque { since, until }) => {
                assert_eq!(since, "three fortnights hence");
                assert_eq!(until, "now");
            }
            _ => panic!("expected opaque fallback"),
        }
    }

    #[test]
    fn now_override_accepts_both_formats() {
        assert!(parse_now_override(Some("2025-08-15T12:00:00")).is_some());
        assert!(parse_now_override(Some("2025-08-15T12:00:00Z")).is_some());
        assert!(parse_now_override(Some("not a time")).is_none());
        assert!(parse_now_override(None).is_none());
    }
}
