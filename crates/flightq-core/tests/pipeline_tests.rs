// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use flightq_core::{respond, AnalyticsResult, Dataset, DatasetLoader, Session};
use flightq_nlp::{Intent, IntentClassifier, Route, Weekday};
use std::fs;
use tempfile::tempdir;

// 2025-07-21 is a Monday.
const FLIGHTS: &str = "\
Flight Number,Date,From,To,Aircraft,STD,STA,delay
AI101,2025-07-21,Hyderabad (HYD),Delhi (DEL),A320,14:00,16:10,10
6E202,2025-07-21,BOM,DEL,A321,14:30,16:30,15
AI101,2025-07-22,HYD,DEL,A320,09:00,11:10,0
QP303,2025-07-21,BOM,BLR,B737,09:15,11:00,40
6E202,2025-07-25,BOM,DEL,A321,09:45,11:45,5
";

fn load(csv: &str) -> Dataset {
    let dir = tempdir().unwrap();
    let path = dir.path().join("processed_flights.csv");
    fs::write(&path, csv).unwrap();
    DatasetLoader::load(&path).expect("fixture should load")
}

#[test]
fn test_average_delay_at_hour_on_monday() {
    let ds = load(FLIGHTS);
    let answer = respond(
        &ds,
        &IntentClassifier::builtin(),
        "What is the average delay at 2 pm on Monday?",
        5,
    );

    assert_eq!(answer.query.intent, Intent::DelayAtHour);
    assert_eq!(
        answer.result,
        AnalyticsResult::DelayAtHour {
            day: Some(Weekday::Monday),
            hour: Some(14),
            average: Some(12.5),
        }
    );
    assert_eq!(
        answer.text(),
        "**Average delay at 14:00 on Monday: 12.5 minutes.**"
    );
}

#[test]
fn test_busiest_respects_weekday() {
    let ds = load(FLIGHTS);
    let classifier = IntentClassifier::builtin();

    let overall = respond(&ds, &classifier, "busiest hour", 5);
    match overall.result {
        AnalyticsResult::Busiest { day: None, report } => {
            assert_eq!(report.hour, Some(9));
            assert_eq!(report.peak_count(), Some(3));
        }
        other => panic!("unexpected result {:?}", other),
    }

    let monday = respond(&ds, &classifier, "Busiest slot on Monday", 5);
    assert_eq!(monday.text(), "**Busiest slot on Monday: 14:00 hrs** with **2** flights.");
    assert_eq!(monday.charts.len(), 1);
}

#[test]
fn test_top_flights_uses_requested_count() {
    let ds = load(FLIGHTS);
    let answer = respond(
        &ds,
        &IntentClassifier::builtin(),
        "Top 2 flights with most delays",
        5,
    );

    match answer.result {
        AnalyticsResult::TopFlights { n, ranking: Some(rows), .. } => {
            assert_eq!(n, 2);
            let ids: Vec<_> = rows.iter().map(|r| r.flight.as_str()).collect();
            assert_eq!(ids, vec!["QP303", "6E202"]);
            assert_eq!(rows[1].avg_delay, 10.0);
            assert_eq!(rows[1].flights, 2);
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_route_zero_delay_is_not_absent() {
    let ds = load(FLIGHTS);
    let classifier = IntentClassifier::builtin();

    let tuesday = respond(&ds, &classifier, "Delay for HYD-DEL route on Tuesday", 5);
    match &tuesday.result {
        AnalyticsResult::RouteDelay { route, report, .. } => {
            assert_eq!(route, &Route::new("HYD", "DEL"));
            assert_eq!(report.average, Some(0.0));
        }
        other => panic!("unexpected result {:?}", other),
    }

    let reversed = respond(&ds, &classifier, "Delay for DEL-HYD route", 5);
    match &reversed.result {
        AnalyticsResult::RouteDelay { report, .. } => {
            assert_eq!(report.average, None);
            assert_eq!(report.by_hour, None);
        }
        other => panic!("unexpected result {:?}", other),
    }
    assert_eq!(reversed.text(), "No data found for route **DEL-HYD**.");
}

#[test]
fn test_missing_columns_yield_absent_results() {
    let ds = load("Date,STD,Dep_Delay\n2025-07-21,09:00,15\n2025-07-21,10:00,5\n");
    let classifier = IntentClassifier::builtin();

    let flights = respond(&ds, &classifier, "top flights by delay", 5);
    assert!(matches!(
        flights.result,
        AnalyticsResult::TopFlights { ranking: None, .. }
    ));
    assert!(flights.text().contains("missing flight number column"));

    let aircraft = respond(&ds, &classifier, "most used aircraft", 5);
    assert_eq!(aircraft.result, AnalyticsResult::TopAircraft { ranking: None });

    // Delay-based analytics still work off Dep_Delay.
    let best = respond(&ds, &classifier, "best time to fly", 5);
    match best.result {
        AnalyticsResult::BestTime { report, .. } => assert_eq!(report.takeoff_hour, Some(10)),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_same_question_same_answer() {
    let ds = load(FLIGHTS);
    let mut session = Session::new(&ds, IntentClassifier::builtin());

    let first = session.ask("best time on monday");
    session.ask("top aircraft");
    session.ask("Delay for HYD-DEL route");
    let again = session.ask("best time on monday");

    assert_eq!(first, again);
    assert_eq!(session.transcript().len(), 8);
}

#[test]
fn test_answer_serializes() {
    let ds = load(FLIGHTS);
    let answer = respond(&ds, &IntentClassifier::builtin(), "delay at 14:00", 5);
    let json = serde_json::to_string(&answer).unwrap();
    assert!(json.contains("delay_at_hour"));
    assert!(json.contains("\"charts\""));
}
