// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::analytics::{AnalyticsResult, BestTimeReport, BusiestReport, HourCounts, HourSeries};
use flightq_nlp::{ParsedQuery, Weekday};
use serde::Serialize;

pub const TIP: &str =
    "Tip: ask things like *best slot on Friday*, *delay at 9 am*, *top 5 flights*, *HYD-DEL route*.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
}

/// Hour-keyed chart payload; x is the hour of day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: String,
    pub kind: ChartKind,
    pub points: Vec<(u8, f64)>,
}

impl Chart {
    fn from_series(title: impl Into<String>, kind: ChartKind, series: &HourSeries) -> Self {
        Self {
            title: title.into(),
            kind,
            points: series.iter().map(|(&h, &v)| (h, v)).collect(),
        }
    }

    fn from_counts(title: impl Into<String>, counts: &HourCounts) -> Self {
        Self {
            title: title.into(),
            kind: ChartKind::Bar,
            points: counts.iter().map(|(&h, &c)| (h, c as f64)).collect(),
        }
    }
}

/// Everything a front end needs to show one reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub query: ParsedQuery,
    pub result: AnalyticsResult,
    pub lines: Vec<String>,
    pub charts: Vec<Chart>,
}

impl Answer {
    pub fn new(query: ParsedQuery, result: AnalyticsResult) -> Self {
        let (lines, charts) = render(&result);
        Self {
            query,
            result,
            lines,
            charts,
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

fn scope(day: Option<Weekday>) -> String {
    match day {
        Some(d) => format!(" on {}", d),
        None => String::new(),
    }
}

fn best_time_lines(report: &BestTimeReport, lines: &mut Vec<String>) {
    if let Some(h) = report.takeoff_hour {
        lines.push(format!("- Takeoff: **{}:00 hrs** (lowest avg delay)", h));
    }
    if let Some(h) = report.landing_hour {
        lines.push(format!("- Landing: **{}:00 hrs** (lowest avg delay)", h));
    }
}

fn busiest_chart(report: &BusiestReport) -> Option<Chart> {
    if report.counts.is_empty() {
        None
    } else {
        Some(Chart::from_counts("Flights per hour", &report.counts))
    }
}

pub fn render(result: &AnalyticsResult) -> (Vec<String>, Vec<Chart>) {
    let mut lines = Vec::new();
    let mut charts = Vec::new();

    match result {
        AnalyticsResult::BestTime { day, report } => {
            lines.push(match day {
                Some(d) => format!("**Best times on {}:**", d),
                None => "**Overall best times:**".to_string(),
            });
            best_time_lines(report, &mut lines);
            if report.takeoff_hour.is_none() && report.landing_hour.is_none() {
                lines.push("No delay data to rank hours.".to_string());
            }
            charts.push(Chart::from_series(
                "Avg Takeoff Delay (min)",
                ChartKind::Line,
                &report.takeoff_series,
            ));
            charts.push(Chart::from_series(
                "Avg Landing Delay (min)",
                ChartKind::Line,
                &report.landing_series,
            ));
        }
        AnalyticsResult::Busiest { day, report } => match (report.hour, report.peak_count()) {
            (Some(h), Some(n)) => {
                let label = match day {
                    Some(d) => format!("on {}", d),
                    None => "overall".to_string(),
                };
                lines.push(format!(
                    "**Busiest slot {}: {}:00 hrs** with **{}** flights.",
                    label, h, n
                ));
                charts.extend(busiest_chart(report));
            }
            _ => lines.push("I couldn't determine the busiest slot from the data.".to_string()),
        },
        AnalyticsResult::DelayAtHour { day, hour, average } => match (hour, average) {
            (None, _) => lines.push(
                "Please specify an hour, e.g., *delay at 2 pm* or *delay at 14:00*.".to_string(),
            ),
            (Some(_), None) => lines.push("No delay data found for that hour.".to_string()),
            (Some(h), Some(avg)) => lines.push(format!(
                "**Average delay at {}:00{}: {:.1} minutes.**",
                h,
                scope(*day),
                avg
            )),
        },
        AnalyticsResult::TopFlights { day, n, ranking } => match ranking {
            Some(rows) if !rows.is_empty() => {
                lines.push(format!("**Top {} flights by average delay{}:**", n, scope(*day)));
                for (i, row) in rows.iter().enumerate() {
                    lines.push(format!(
                        "{}. {}: {:.1} min ({} flights)",
                        i + 1,
                        row.flight,
                        row.avg_delay,
                        row.flights
                    ));
                }
            }
            Some(_) => lines.push(format!("No flight-level delay data found{}.", scope(*day))),
            None => lines.push(
                "Couldn't compute flight-level delays (missing flight number column).".to_string(),
            ),
        },
        AnalyticsResult::RouteDelay { day, route, report } => {
            match (report.average, &report.by_hour) {
                (_, None) => lines.push(format!("No data found for route **{}**{}.", route, scope(*day))),
                (None, Some(_)) => {
                    lines.push(format!("Route **{}** has no delay data{}.", route, scope(*day)))
                }
                (Some(avg), Some(by_hour)) => {
                    lines.push(format!(
                        "**Average delay for {}{}: {:.1} minutes.**",
                        route,
                        scope(*day),
                        avg
                    ));
                    if !by_hour.is_empty() {
                        charts.push(Chart::from_series(
                            format!("{} Avg Delay by STD hour", route),
                            ChartKind::Bar,
                            by_hour,
                        ));
                    }
                }
            }
        }
        AnalyticsResult::TopAircraft { ranking } => match ranking {
            Some(rows) => {
                lines.push(format!("**Top {} aircraft by frequency:**", rows.len()));
                for (i, row) in rows.iter().enumerate() {
                    lines.push(format!("{}. {}: {}", i + 1, row.aircraft, row.count));
                }
            }
            None => lines.push("Aircraft column not found.".to_string()),
        },
        AnalyticsResult::Summary { report } => {
            let mut blocks = Vec::new();
            if let Some(h) = report.best_time.takeoff_hour {
                blocks.push(format!("- Best takeoff hour: **{}:00**", h));
            }
            if let Some(h) = report.best_time.landing_hour {
                blocks.push(format!("- Best landing hour: **{}:00**", h));
            }
            if let (Some(h), Some(n)) = (report.busiest.hour, report.busiest.peak_count()) {
                blocks.push(format!("- Busiest hour: **{}:00** (≈ {} flights)", h, n));
            }
            if blocks.is_empty() {
                lines.push("Not enough data for a summary yet.".to_string());
            } else {
                lines.push("**Quick summary:**".to_string());
                lines.extend(blocks);
            }
            charts.extend(busiest_chart(&report.busiest));
        }
    }

    (lines, charts)
}
