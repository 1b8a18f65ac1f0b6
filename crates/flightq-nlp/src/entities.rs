// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    /// Resolves a full day name or an accepted abbreviation, ignoring case.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_lowercase().as_str() {
            "monday" | "mon" => Some(Weekday::Monday),
            "tuesday" | "tue" | "tues" => Some(Weekday::Tuesday),
            "wednesday" | "wed" => Some(Weekday::Wednesday),
            "thursday" | "thu" | "thur" | "thurs" => Some(Weekday::Thursday),
            "friday" | "fri" => Some(Weekday::Friday),
            "saturday" | "sat" => Some(Weekday::Saturday),
            "sunday" | "sun" => Some(Weekday::Sunday),
            _ => None,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Origin/destination pair of uppercase airport codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    pub origin: String,
    pub destination: String,
}

impl Route {
    pub fn new(origin: &str, destination: &str) -> Self {
        Self {
            origin: origin.trim().to_uppercase(),
            destination: destination.trim().to_uppercase(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.origin, self.destination)
    }
}

/// Structured fields pulled out of one query. Every field is optional;
/// absence means the downstream query is unconstrained on that axis.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractedEntities {
    pub weekday: Option<Weekday>,
    pub hour: Option<u8>,
    pub route: Option<Route>,
    pub top_n: Option<usize>,
}

impl ExtractedEntities {
    pub fn extract(input: &str) -> Self {
        Self {
            weekday: parse_weekday(input),
            hour: parse_hour(input),
            route: parse_route(input),
            top_n: parse_top_n(input),
        }
    }
}

pub fn parse_weekday(input: &str) -> Option<Weekday> {
    // Full names may sit inside longer words ("mondays"); abbreviations must
    // stand alone so "month" or "satisfied" never count.
    static DAY_RE: OnceLock<Regex> = OnceLock::new();
    let day_re = DAY_RE.get_or_init(|| {
        Regex::new(
            r"(monday|tuesday|wednesday|thursday|friday|saturday|sunday)|\b(mon|tues|tue|wed|thurs|thur|thu|fri|sat|sun)\b",
        )
        .unwrap()
    });

    let lower = input.to_lowercase();
    day_re
        .find(&lower)
        .and_then(|m| Weekday::from_token(m.as_str()))
}

/// Words that make a bare number read as a clock hour ("delay at 14").
const HOUR_CUES: &[&str] = &["at", "around", "about", "by", "after", "before", "@"];

enum TimeToken {
    Meridiem { hour: u32, minute: u32, pm: bool },
    Clock { hour: u32, minute: u32 },
    Bare { hour: u32 },
}

impl TimeToken {
    fn to_hour(&self) -> Option<u8> {
        let hour = match *self {
            TimeToken::Meridiem { hour, minute, pm } => {
                if !(1..=12).contains(&hour) || minute >= 60 {
                    return None;
                }
                match (hour, pm) {
                    (12, false) => 0,
                    (12, true) => 12,
                    (h, true) => h + 12,
                    (h, false) => h,
                }
            }
            TimeToken::Clock { hour, minute } => {
                if minute >= 60 {
                    return None;
                }
                hour
            }
            TimeToken::Bare { hour } => hour,
        };
        if hour <= 23 {
            u8::try_from(hour).ok()
        } else {
            None
        }
    }
}

/// Returns the hour of the first time token in the text. A token that is
/// recognised but out of range ("25:00", "13 pm") yields `None` rather than
/// falling through to a later token.
pub fn parse_hour(input: &str) -> Option<u8> {
    static TIME_RE: OnceLock<Regex> = OnceLock::new();
    let time_re = TIME_RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,2})(?::(\d{2}))?(?:\s*([ap])\.?m\b\.?)?").unwrap()
    });

    let lower = input.to_lowercase();
    for caps in time_re.captures_iter(&lower) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let Ok(hour) = caps[1].parse::<u32>() else {
            continue;
        };
        let minute = caps
            .get(2)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0);

        let token = if let Some(meridiem) = caps.get(3) {
            TimeToken::Meridiem {
                hour,
                minute,
                pm: meridiem.as_str() == "p",
            }
        } else if caps.get(2).is_some() {
            TimeToken::Clock { hour, minute }
        } else {
            let mut rest = lower[whole.end()..].chars();
            let runs_on = match (rest.next(), rest.next()) {
                (Some('.'), Some(c)) => c.is_ascii_digit(),
                (Some(c), _) => c.is_alphanumeric(),
                _ => false,
            };
            if runs_on || !is_cued(&lower[..whole.start()]) {
                continue;
            }
            TimeToken::Bare { hour }
        };

        return token.to_hour();
    }
    None
}

fn is_cued(prefix: &str) -> bool {
    let prefix = prefix.trim_end();
    HOUR_CUES.iter().any(|cue| {
        prefix.strip_suffix(cue).is_some_and(|rest| {
            *cue == "@" || rest.chars().last().map_or(true, |c| !c.is_alphanumeric())
        })
    })
}

/// Short words that fit the 3-4 letter code shape but are never airports.
const NOT_A_CODE: &[&str] = &[
    "take", "off", "non", "stop", "the", "and", "for", "from", "with", "into", "onto", "day",
    "days", "time", "week", "year", "hour", "late", "early", "mid", "pre", "post", "self", "mon",
    "tue", "tues", "wed", "thu", "thur", "fri", "sat", "sun", "one", "two", "way", "ways", "four",
    "five", "nine", "half", "full", "long", "high", "low", "last", "next", "out", "run", "set",
    "fly", "lay", "drop", "pick", "back", "well", "part", "real", "open", "sold", "all", "any",
    "has", "had", "was", "are", "per",
];

pub fn parse_route(input: &str) -> Option<Route> {
    static DASH_RE: OnceLock<Regex> = OnceLock::new();
    static FROM_TO_RE: OnceLock<Regex> = OnceLock::new();
    let dash_re = DASH_RE.get_or_init(|| {
        Regex::new(r"\b([a-z]{3,4})\s*(?:->|-|–|→)\s*([a-z]{3,4})\b").unwrap()
    });
    let from_to_re = FROM_TO_RE
        .get_or_init(|| Regex::new(r"\bfrom\s+([a-z]{3,4})\s+to\s+([a-z]{3,4})\b").unwrap());

    let lower = input.to_lowercase();
    let mut best: Option<(usize, Route)> = None;

    for re in [dash_re, from_to_re] {
        for caps in re.captures_iter(&lower) {
            let (origin, dest) = (&caps[1], &caps[2]);
            if NOT_A_CODE.contains(&origin) || NOT_A_CODE.contains(&dest) {
                continue;
            }
            let start = caps.get(0).map_or(0, |m| m.start());
            if best.as_ref().map_or(true, |(pos, _)| start < *pos) {
                best = Some((start, Route::new(origin, dest)));
            }
            break;
        }
    }

    best.map(|(_, route)| route)
}

pub const MAX_TOP_N: usize = 50;

pub fn parse_top_n(input: &str) -> Option<usize> {
    let lower = input.to_lowercase();
    top_count_re()
        .captures(&lower)
        .and_then(|caps| caps[1].parse::<usize>().ok())
        .filter(|n| (1..=MAX_TOP_N).contains(n))
}

/// Rewrites ranking phrasings onto the rule keywords: "top 5" becomes "top"
/// and "top delayed flights" becomes "top flights". Lowercases the text.
pub fn normalize_ranking(input: &str) -> String {
    static DELAYED_RE: OnceLock<Regex> = OnceLock::new();
    let delayed_re =
        DELAYED_RE.get_or_init(|| Regex::new(r"top\s+delayed\s+flights").unwrap());

    let lower = input.to_lowercase();
    let collapsed = top_count_re().replace_all(&lower, "top");
    delayed_re.replace_all(&collapsed, "top flights").into_owned()
}

fn top_count_re() -> &'static Regex {
    static TOP_RE: OnceLock<Regex> = OnceLock::new();
    TOP_RE.get_or_init(|| Regex::new(r"\btop\s+(\d{1,2})\b").unwrap())
}
