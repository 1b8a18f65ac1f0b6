// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Turns raw CSV cells into typed flight records: dates, weekday, takeoff and
//! landing hours, and a signed delay in minutes. Cells that do not parse
//! become `None`; nothing here invents a value.

use crate::dataset::FlightRecord;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use flightq_nlp::Weekday;
use regex::Regex;
use std::sync::OnceLock;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%b-%y %H:%M:%S",
    "%d-%b-%y %H:%M",
];

// Day-first before month-first: the source exports are Indian schedules.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%d-%b-%y", "%d-%b-%Y", "%d %b %Y", "%d/%m/%Y", "%d-%m-%Y", "%m/%d/%Y", "%Y/%m/%d",
];

const TIME_FORMATS: &[&str] = &[
    "%H:%M:%S%.f",
    "%H:%M",
    "%I:%M %p",
    "%I:%M:%S %p",
    "%I:%M%p",
];

const MINUTES_PER_DAY: f64 = 1440.0;

/// A parsed timestamp. `time_only` marks values that had no date of their
/// own and were anchored on the row's date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stamp {
    pub at: NaiveDateTime,
    pub time_only: bool,
}

impl Stamp {
    pub fn hour(&self) -> u8 {
        // Timelike::hour is always 0..=23
        self.at.hour() as u8
    }
}

/// Borrowed view of the cells the preprocessor cares about.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawRow<'a> {
    pub date: Option<&'a str>,
    pub std: Option<&'a str>,
    pub sta: Option<&'a str>,
    pub atd: Option<&'a str>,
    pub delay: Option<&'a str>,
    pub dep_delay: Option<&'a str>,
    pub aircraft: Option<&'a str>,
    pub flight_id: Option<&'a str>,
    pub origin: Option<&'a str>,
    pub destination: Option<&'a str>,
    pub route: Option<&'a str>,
}

pub fn preprocess(row: &RawRow) -> FlightRecord {
    let date = row.date.and_then(parse_date);
    let mut std = row.std.and_then(|s| parse_timestamp(s, date));
    let mut sta = row.sta.and_then(|s| parse_timestamp(s, date));
    let mut atd = row.atd.and_then(|s| parse_timestamp(s, date));

    // Without a Date column, bare times borrow the day of a fully dated
    // sibling stamp instead of the epoch.
    if date.is_none() {
        let sibling_day = [std, atd, sta]
            .into_iter()
            .flatten()
            .find(|s| !s.time_only)
            .map(|s| s.at.date());
        if let Some(day) = sibling_day {
            for stamp in [&mut std, &mut sta, &mut atd].into_iter().flatten() {
                if stamp.time_only {
                    stamp.at = day.and_time(stamp.at.time());
                }
            }
        }
    }

    let delay = row
        .delay
        .and_then(parse_number)
        .or_else(|| match (std, atd) {
            (Some(s), Some(a)) => Some(minutes_between(s, a)),
            _ => None,
        })
        .or_else(|| row.dep_delay.and_then(parse_number));

    let (origin, destination) = match (
        row.origin.and_then(normalize_code),
        row.destination.and_then(normalize_code),
    ) {
        (Some(o), Some(d)) => (Some(o), Some(d)),
        (o, d) => match row.route.and_then(split_route) {
            Some((ro, rd)) => (Some(ro), Some(rd)),
            None => (o, d),
        },
    };

    FlightRecord {
        date,
        weekday: date.map(weekday_of),
        std: std.map(|s| s.at),
        takeoff_hour: std.map(|s| s.hour()),
        sta: sta.map(|s| s.at),
        landing_hour: sta.map(|s| s.hour()),
        atd: atd.map(|s| s.at),
        delay,
        flight_id: row.flight_id.and_then(non_empty),
        aircraft: row.aircraft.and_then(non_empty),
        origin,
        destination,
    }
}

pub fn weekday_of(date: NaiveDate) -> Weekday {
    match date.weekday() {
        chrono::Weekday::Mon => Weekday::Monday,
        chrono::Weekday::Tue => Weekday::Tuesday,
        chrono::Weekday::Wed => Weekday::Wednesday,
        chrono::Weekday::Thu => Weekday::Thursday,
        chrono::Weekday::Fri => Weekday::Friday,
        chrono::Weekday::Sat => Weekday::Saturday,
        chrono::Weekday::Sun => Weekday::Sunday,
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| parse_datetime(s).map(|dt| dt.date()))
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}

/// Parses a full timestamp, or a bare time anchored on `anchor` (1970-01-01
/// when the row has no date). A leading word such as "Landed" is skipped.
pub fn parse_timestamp(raw: &str, anchor: Option<NaiveDate>) -> Option<Stamp> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let attempt = |s: &str| {
        if let Some(at) = parse_datetime(s) {
            return Some(Stamp {
                at,
                time_only: false,
            });
        }
        parse_time(s).map(|t| Stamp {
            at: anchor.unwrap_or_default().and_time(t),
            time_only: true,
        })
    };

    attempt(s).or_else(|| {
        let start = s.find(|c: char| c.is_ascii_digit())?;
        if start == 0 {
            None
        } else {
            attempt(&s[start..])
        }
    })
}

/// Signed minutes from scheduled to actual. When either side is a bare time,
/// a gap of more than half a day is taken to straddle midnight.
pub fn minutes_between(scheduled: Stamp, actual: Stamp) -> f64 {
    let mut minutes = (actual.at - scheduled.at).num_seconds() as f64 / 60.0;
    if scheduled.time_only || actual.time_only {
        if minutes < -MINUTES_PER_DAY / 2.0 {
            minutes += MINUTES_PER_DAY;
        } else if minutes > MINUTES_PER_DAY / 2.0 {
            minutes -= MINUTES_PER_DAY;
        }
    }
    minutes
}

pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    match s.to_lowercase().as_str() {
        "" | "nan" | "na" | "n/a" | "null" | "-" => None,
        _ => s.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// "Mumbai (BOM)" -> "BOM", " del " -> "DEL".
pub fn normalize_code(raw: &str) -> Option<String> {
    static PAREN_RE: OnceLock<Regex> = OnceLock::new();
    let paren_re = PAREN_RE.get_or_init(|| Regex::new(r"\(([A-Za-z]{3,4})\)").unwrap());

    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    match paren_re.captures(s) {
        Some(caps) => Some(caps[1].to_uppercase()),
        None => Some(s.to_uppercase()),
    }
}

/// Splits a single route cell ("HYD-DEL", "BOM → DEL", "BOM to DEL").
pub fn split_route(raw: &str) -> Option<(String, String)> {
    let s = raw.trim();
    let (origin, dest) = ["->", "→", "-", " to ", " TO "]
        .iter()
        .find_map(|sep| s.split_once(sep))?;
    Some((normalize_code(origin)?, normalize_code(dest)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2025-07-25"), Some(date(2025, 7, 25)));
        assert_eq!(parse_date("25-Jul-25"), Some(date(2025, 7, 25)));
        assert_eq!(parse_date("25/07/2025"), Some(date(2025, 7, 25)));
        assert_eq!(parse_date("2025-07-25 00:00:00"), Some(date(2025, 7, 25)));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_time_only_anchors_on_row_date() {
        let stamp = parse_timestamp("6:00:00", Some(date(2025, 7, 25))).unwrap();
        assert!(stamp.time_only);
        assert_eq!(stamp.at.date(), date(2025, 7, 25));
        assert_eq!(stamp.hour(), 6);

        let pm = parse_timestamp("2:15 PM", None).unwrap();
        assert_eq!(pm.hour(), 14);
    }

    #[test]
    fn test_leading_word_is_skipped() {
        let stamp = parse_timestamp("Landed 8:14 AM", None).unwrap();
        assert_eq!(stamp.hour(), 8);
        assert_eq!(parse_timestamp("Cancelled", None), None);
    }

    #[test]
    fn test_full_timestamp_keeps_its_own_date() {
        let stamp = parse_timestamp("2025-07-26 23:40:00", Some(date(2025, 7, 25))).unwrap();
        assert!(!stamp.time_only);
        assert_eq!(stamp.at.date(), date(2025, 7, 26));
        assert_eq!(stamp.hour(), 23);
    }

    #[test]
    fn test_delay_from_atd_minus_std() {
        let row = RawRow {
            date: Some("2025-07-21"),
            std: Some("06:00:00"),
            atd: Some("06:20:00"),
            ..Default::default()
        };
        let rec = preprocess(&row);
        assert_eq!(rec.delay, Some(20.0));
        assert_eq!(rec.takeoff_hour, Some(6));
        assert_eq!(rec.weekday, Some(Weekday::Monday));
    }

    #[test]
    fn test_early_departure_is_negative() {
        let row = RawRow {
            std: Some("10:00"),
            atd: Some("09:55"),
            ..Default::default()
        };
        assert_eq!(preprocess(&row).delay, Some(-5.0));
    }

    #[test]
    fn test_midnight_rollover() {
        let row = RawRow {
            std: Some("23:50"),
            atd: Some("00:10"),
            ..Default::default()
        };
        assert_eq!(preprocess(&row).delay, Some(20.0));
    }

    #[test]
    fn test_bare_atd_takes_day_of_dated_std() {
        let row = RawRow {
            std: Some("2025-07-21 06:00"),
            atd: Some("06:20"),
            ..Default::default()
        };
        let rec = preprocess(&row);
        assert_eq!(rec.delay, Some(20.0));
        assert_eq!(rec.atd.map(|a| a.date()), Some(date(2025, 7, 21)));
        assert_eq!(rec.weekday, None);

        let bare_std = RawRow {
            std: Some("14:00"),
            atd: Some("2025-07-21 14:45"),
            sta: Some("16:10"),
            ..Default::default()
        };
        let rec = preprocess(&bare_std);
        assert_eq!(rec.delay, Some(45.0));
        assert_eq!(rec.landing_hour, Some(16));
    }

    #[test]
    fn test_rollover_with_one_dated_stamp() {
        let row = RawRow {
            std: Some("2025-07-21 23:50"),
            atd: Some("00:10"),
            ..Default::default()
        };
        assert_eq!(preprocess(&row).delay, Some(20.0));

        let early = RawRow {
            date: Some("2025-07-22"),
            std: Some("00:05"),
            atd: Some("2025-07-21 23:55"),
            ..Default::default()
        };
        assert_eq!(preprocess(&early).delay, Some(-10.0));
    }

    #[test]
    fn test_delay_fallbacks() {
        let explicit = RawRow {
            delay: Some("7.5"),
            std: Some("06:00"),
            atd: Some("06:30"),
            ..Default::default()
        };
        assert_eq!(preprocess(&explicit).delay, Some(7.5));

        let dep_delay = RawRow {
            std: Some("06:00"),
            atd: Some(""),
            dep_delay: Some("12"),
            ..Default::default()
        };
        assert_eq!(preprocess(&dep_delay).delay, Some(12.0));

        let nothing = RawRow {
            std: Some("06:00"),
            dep_delay: Some("NaN"),
            ..Default::default()
        };
        let rec = preprocess(&nothing);
        assert_eq!(rec.delay, None);
        assert_eq!(rec.takeoff_hour, Some(6));
    }

    #[test]
    fn test_unparseable_time_gives_no_hour() {
        let row = RawRow {
            std: Some("soon"),
            sta: Some("99:99"),
            ..Default::default()
        };
        let rec = preprocess(&row);
        assert_eq!(rec.takeoff_hour, None);
        assert_eq!(rec.landing_hour, None);
    }

    #[test]
    fn test_route_codes() {
        assert_eq!(normalize_code("Mumbai (BOM)"), Some("BOM".to_string()));
        assert_eq!(normalize_code(" del "), Some("DEL".to_string()));
        assert_eq!(
            split_route("hyd-del"),
            Some(("HYD".to_string(), "DEL".to_string()))
        );

        let row = RawRow {
            origin: Some("Mumbai (BOM)"),
            destination: Some("Chandigarh (IXC)"),
            route: Some("XXX-YYY"),
            ..Default::default()
        };
        let rec = preprocess(&row);
        assert_eq!(rec.origin.as_deref(), Some("BOM"));
        assert_eq!(rec.destination.as_deref(), Some("IXC"));

        let route_only = RawRow {
            route: Some("BOM → DEL"),
            ..Default::default()
        };
        let rec = preprocess(&route_only);
        assert_eq!(rec.origin.as_deref(), Some("BOM"));
        assert_eq!(rec.destination.as_deref(), Some("DEL"));
    }
}
