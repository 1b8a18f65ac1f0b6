// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Read-only aggregations behind each intent.
//!
//! Every query takes the dataset snapshot plus an optional weekday filter.
//! Rows with a missing hour or delay are left out of the aggregate they
//! would feed; "no data" is always `None`, never zero.

use crate::dataset::{Dataset, FlightRecord};
use flightq_nlp::{ExtractedEntities, Intent, Route, Weekday};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Mean delay (minutes) keyed by hour of day.
pub type HourSeries = BTreeMap<u8, f64>;
/// Row counts keyed by hour of day.
pub type HourCounts = BTreeMap<u8, usize>;

pub const DEFAULT_TOP_N: usize = 5;
pub const TOP_AIRCRAFT_N: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BestTimeReport {
    pub takeoff_hour: Option<u8>,
    pub landing_hour: Option<u8>,
    pub takeoff_series: HourSeries,
    pub landing_series: HourSeries,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BusiestReport {
    pub hour: Option<u8>,
    pub counts: HourCounts,
}

impl BusiestReport {
    pub fn peak_count(&self) -> Option<usize> {
        self.hour.and_then(|h| self.counts.get(&h).copied())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteDelayReport {
    pub average: Option<f64>,
    /// `None` when no row matched the route at all.
    pub by_hour: Option<HourSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDelay {
    pub flight: String,
    pub avg_delay: f64,
    pub flights: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCount {
    pub aircraft: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryReport {
    pub best_time: BestTimeReport,
    pub busiest: BusiestReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum AnalyticsResult {
    BestTime {
        day: Option<Weekday>,
        report: BestTimeReport,
    },
    Busiest {
        day: Option<Weekday>,
        report: BusiestReport,
    },
    DelayAtHour {
        day: Option<Weekday>,
        hour: Option<u8>,
        average: Option<f64>,
    },
    TopFlights {
        day: Option<Weekday>,
        n: usize,
        ranking: Option<Vec<RankedDelay>>,
    },
    RouteDelay {
        day: Option<Weekday>,
        route: Route,
        report: RouteDelayReport,
    },
    TopAircraft {
        ranking: Option<Vec<RankedCount>>,
    },
    Summary {
        report: SummaryReport,
    },
}

#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    n: usize,
}

impl Mean {
    fn push(&mut self, v: f64) {
        self.sum += v;
        self.n += 1;
    }

    fn value(self) -> Option<f64> {
        if self.n == 0 {
            None
        } else {
            Some(self.sum / self.n as f64)
        }
    }
}

fn mean_of<'a>(rows: impl Iterator<Item = &'a FlightRecord>) -> Option<f64> {
    let mut acc = Mean::default();
    rows.filter_map(|r| r.delay).for_each(|d| acc.push(d));
    acc.value()
}

fn mean_by_hour<'a>(
    rows: impl Iterator<Item = &'a FlightRecord>,
    hour_of: impl Fn(&FlightRecord) -> Option<u8>,
) -> HourSeries {
    let mut groups: BTreeMap<u8, Mean> = BTreeMap::new();
    for row in rows {
        if let (Some(hour), Some(delay)) = (hour_of(row), row.delay) {
            groups.entry(hour).or_default().push(delay);
        }
    }
    groups
        .into_iter()
        .filter_map(|(hour, acc)| acc.value().map(|m| (hour, m)))
        .collect()
}

/// Hour with the lowest value; the earliest hour wins a tie.
fn argmin(series: &HourSeries) -> Option<u8> {
    let mut best: Option<(u8, f64)> = None;
    for (&hour, &value) in series {
        if best.map_or(true, |(_, b)| value < b) {
            best = Some((hour, value));
        }
    }
    best.map(|(h, _)| h)
}

/// Hour with the highest count; the earliest hour wins a tie.
fn argmax(counts: &HourCounts) -> Option<u8> {
    let mut best: Option<(u8, usize)> = None;
    for (&hour, &count) in counts {
        if best.map_or(true, |(_, b)| count > b) {
            best = Some((hour, count));
        }
    }
    best.map(|(h, _)| h)
}

pub fn best_time(ds: &Dataset, day: Option<Weekday>) -> BestTimeReport {
    let takeoff_series = mean_by_hour(ds.rows_on(day), |r| r.takeoff_hour);
    let landing_series = mean_by_hour(ds.rows_on(day), |r| r.landing_hour);
    BestTimeReport {
        takeoff_hour: argmin(&takeoff_series),
        landing_hour: argmin(&landing_series),
        takeoff_series,
        landing_series,
    }
}

pub fn busiest_slot(ds: &Dataset, day: Option<Weekday>) -> BusiestReport {
    let mut counts = HourCounts::new();
    for hour in ds.rows_on(day).filter_map(|r| r.takeoff_hour) {
        *counts.entry(hour).or_default() += 1;
    }
    BusiestReport {
        hour: argmax(&counts),
        counts,
    }
}

pub fn avg_delay_at_hour(ds: &Dataset, hour: u8, day: Option<Weekday>) -> Option<f64> {
    mean_of(ds.rows_on(day).filter(|r| r.takeoff_hour == Some(hour)))
}

/// Flights ranked by mean delay, worst first. `None` when the file had no
/// flight-number column.
pub fn top_delayed_flights(
    ds: &Dataset,
    n: usize,
    day: Option<Weekday>,
) -> Option<Vec<RankedDelay>> {
    if !ds.columns().flight_id {
        return None;
    }

    let mut groups: HashMap<&str, Mean> = HashMap::new();
    for row in ds.rows_on(day) {
        if let (Some(id), Some(delay)) = (row.flight_id.as_deref(), row.delay) {
            groups.entry(id).or_default().push(delay);
        }
    }

    let mut ranking: Vec<RankedDelay> = groups
        .into_iter()
        .filter_map(|(id, acc)| {
            acc.value().map(|avg| RankedDelay {
                flight: id.to_string(),
                avg_delay: avg,
                flights: acc.n,
            })
        })
        .collect();
    ranking.sort_by(|a, b| {
        b.avg_delay
            .total_cmp(&a.avg_delay)
            .then_with(|| a.flight.cmp(&b.flight))
    });
    ranking.truncate(n);
    Some(ranking)
}

pub fn route_delay(
    ds: &Dataset,
    origin: &str,
    dest: &str,
    day: Option<Weekday>,
) -> RouteDelayReport {
    let matches = |r: &&FlightRecord| {
        r.origin
            .as_deref()
            .is_some_and(|o| o.eq_ignore_ascii_case(origin))
            && r.destination
                .as_deref()
                .is_some_and(|d| d.eq_ignore_ascii_case(dest))
    };

    let rows: Vec<&FlightRecord> = ds.rows_on(day).filter(matches).collect();
    if rows.is_empty() {
        return RouteDelayReport::default();
    }

    RouteDelayReport {
        average: mean_of(rows.iter().copied()),
        by_hour: Some(mean_by_hour(rows.iter().copied(), |r| r.takeoff_hour)),
    }
}

/// Most frequent aircraft. `None` when the file had no Aircraft column.
pub fn top_aircraft(ds: &Dataset) -> Option<Vec<RankedCount>> {
    if !ds.columns().aircraft {
        return None;
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for aircraft in ds.records().iter().filter_map(|r| r.aircraft.as_deref()) {
        *counts.entry(aircraft).or_default() += 1;
    }

    let mut ranking: Vec<RankedCount> = counts
        .into_iter()
        .map(|(aircraft, count)| RankedCount {
            aircraft: aircraft.to_string(),
            count,
        })
        .collect();
    ranking.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.aircraft.cmp(&b.aircraft)));
    ranking.truncate(TOP_AIRCRAFT_N);
    Some(ranking)
}

/// Whole-dataset overview used when nothing more specific was asked.
pub fn summary(ds: &Dataset) -> SummaryReport {
    SummaryReport {
        best_time: best_time(ds, None),
        busiest: busiest_slot(ds, None),
    }
}

/// Runs the aggregation for `intent`. A route intent without a route (only
/// possible with a custom rule file) degrades to the summary.
pub fn execute(
    ds: &Dataset,
    intent: Intent,
    entities: &ExtractedEntities,
    default_top_n: usize,
) -> AnalyticsResult {
    let day = entities.weekday;
    match intent {
        Intent::BestTime => AnalyticsResult::BestTime {
            day,
            report: best_time(ds, day),
        },
        Intent::Busiest => AnalyticsResult::Busiest {
            day,
            report: busiest_slot(ds, day),
        },
        Intent::DelayAtHour => AnalyticsResult::DelayAtHour {
            day,
            hour: entities.hour,
            average: entities.hour.and_then(|h| avg_delay_at_hour(ds, h, day)),
        },
        Intent::TopFlights => {
            let n = entities.top_n.unwrap_or(default_top_n);
            AnalyticsResult::TopFlights {
                day,
                n,
                ranking: top_delayed_flights(ds, n, day),
            }
        }
        Intent::RouteDelay => match &entities.route {
            Some(route) => AnalyticsResult::RouteDelay {
                day,
                route: route.clone(),
                report: route_delay(ds, &route.origin, &route.destination, day),
            },
            None => AnalyticsResult::Summary {
                report: summary(ds),
            },
        },
        Intent::TopAircraft => AnalyticsResult::TopAircraft {
            ranking: top_aircraft(ds),
        },
        Intent::Summary => AnalyticsResult::Summary {
            report: summary(ds),
        },
    }
}
