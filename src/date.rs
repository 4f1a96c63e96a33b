//! Human date parsing for `VisibleFrom`/`VisibleTo`.
//!
//! Content authors write dates the way they are used to, so three families of
//! layouts are accepted, each with optional time and optional year:
//!
//! | Family | Full | Without year | Time only |
//! |--------|------|--------------|-----------|
//! | LV     | `19.11.2015 23:47:58` | `02.07 07:01` | `23:47` |
//! | ISO    | `2015-11-19 23:47` | `07-02` | `23:47:58` |
//! | US     | `11/19/2015` | `07/02 07:01` | |
//!
//! Missing years default to the current year, time-only values to today.
//! Everything is interpreted as UTC.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use thiserror::Error;

use crate::params::{NO, Params, YES};

#[derive(Error, Debug)]
pub enum DateError {
    #[error("\"{0}\" is not in a known date/time format")]
    UnknownFormat(String),
    #[error("invalid date/time: {0}")]
    Parse(#[from] chrono::ParseError),
}

/// Date separators in the order they are tried.
const FAMILIES: &[(char, &str)] = &[('.', "%d.%m.%Y"), ('-', "%Y-%m-%d"), ('/', "%m/%d/%Y")];

/// Parse a human date relative to `now` (used to fill in a missing year or date).
pub fn to_time(s: &str, now: NaiveDateTime) -> Result<NaiveDateTime, DateError> {
    let colons = s.matches(':').count();

    // Time only
    if (s.len() == 5 && colons == 1) || (s.len() == 8 && colons == 2) {
        let fmt = if colons == 1 { "%H:%M" } else { "%H:%M:%S" };
        let time = NaiveTime::parse_from_str(s, fmt)?;
        return Ok(now.date().and_time(time));
    }

    for &(sep, date_fmt) in FAMILIES {
        let count = s.matches(sep).count();
        if !matches!((count, colons), (1 | 2, 0..=2)) || (count == 1 && colons == 2) {
            continue;
        }

        let full = if count == 1 {
            with_year(s, sep, now.year())
        } else {
            s.to_string()
        };

        return Ok(match colons {
            0 => NaiveDate::parse_from_str(&full, date_fmt)?.and_time(NaiveTime::MIN),
            1 => NaiveDateTime::parse_from_str(&full, &format!("{date_fmt} %H:%M"))?,
            _ => NaiveDateTime::parse_from_str(&full, &format!("{date_fmt} %H:%M:%S"))?,
        });
    }

    Err(DateError::UnknownFormat(s.to_string()))
}

/// `"02.07 07:01"` → `"02.07.2026 07:01"`, `"07-02"` → `"2026-07-02"`.
fn with_year(s: &str, sep: char, year: i32) -> String {
    let (date, rest) = match s.split_once(' ') {
        Some((d, t)) => (d, format!(" {t}")),
        None => (s, String::new()),
    };
    match sep {
        '-' => format!("{year}-{date}{rest}"),
        _ => format!("{date}{sep}{year}{rest}"),
    }
}

/// Nanoseconds since the Unix epoch, the on-page representation of times.
pub fn unix_nanos(dt: NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_nanos_opt().unwrap_or_default()
}

/// Current UTC time without a zone.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Normalize `VisibleFrom`/`VisibleTo` and recompute `IsVisible`.
///
/// Parsed bounds are rewritten as Unix nanoseconds; unparsable bounds are left
/// as written and count as "now". The page is visible while
/// `from - 1s < now < to + 1s`.
pub fn apply_visibility_window(params: &mut Params, now: NaiveDateTime) {
    if !params.contains_key("VisibleFrom") && !params.contains_key("VisibleTo") {
        return;
    }

    let mut bound = |key: &str| -> NaiveDateTime {
        let Some(raw) = params.get(key).filter(|v| !v.is_empty()) else {
            return now;
        };
        match to_time(raw, now) {
            Ok(dt) => {
                params.insert(key.to_string(), unix_nanos(dt).to_string());
                dt
            }
            Err(e) => {
                tracing::debug!(key, error = %e, "keeping unparsed visibility bound");
                now
            }
        }
    };
    let from = bound("VisibleFrom");
    let to = bound("VisibleTo");

    let second = TimeDelta::seconds(1);
    let visible = now > from - second && now < to + second;
    params.insert("IsVisible".into(), if visible { YES } else { NO }.into());
}
