// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    BestTime,
    Busiest,
    DelayAtHour,
    TopFlights,
    RouteDelay,
    TopAircraft,
    Summary,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::BestTime => "best_time",
            Intent::Busiest => "busiest",
            Intent::DelayAtHour => "delay_at_hour",
            Intent::TopFlights => "top_flights",
            Intent::RouteDelay => "route_delay",
            Intent::TopAircraft => "top_aircraft",
            Intent::Summary => "summary",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Hour,
    Route,
}

/// Which entities the extractor managed to pull out of the query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntitySignals {
    pub hour: bool,
    pub route: bool,
}

impl EntitySignals {
    pub fn has(self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Hour => self.hour,
            EntityKind::Route => self.route,
        }
    }
}

/// One row of the ordered rule table.
///
/// A rule fires when one of `keywords` is a substring of the lowercased
/// query (and, if `also_keywords` is non-empty, one of those too), or when
/// `or_entity` was extracted. `requires_entity` gates the rule as a whole.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IntentRule {
    pub intent: Intent,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub also_keywords: Vec<String>,
    #[serde(default)]
    pub or_entity: Option<EntityKind>,
    #[serde(default)]
    pub requires_entity: Option<EntityKind>,
}

impl IntentRule {
    fn new(intent: Intent, keywords: &[&str]) -> Self {
        Self {
            intent,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            also_keywords: Vec::new(),
            or_entity: None,
            requires_entity: None,
        }
    }

    pub fn matches(&self, text_lower: &str, signals: EntitySignals) -> bool {
        if let Some(kind) = self.requires_entity {
            if !signals.has(kind) {
                return false;
            }
        }

        let keyword_hit = contains_any(text_lower, &self.keywords)
            && (self.also_keywords.is_empty() || contains_any(text_lower, &self.also_keywords));

        keyword_hit || self.or_entity.is_some_and(|kind| signals.has(kind))
    }
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| !k.is_empty() && text.contains(k.as_str()))
}

/// The shipped rule table, highest priority first.
pub fn default_rules() -> Vec<IntentRule> {
    vec![
        IntentRule::new(Intent::Busiest, &["busiest", "busy", "most flights"]),
        IntentRule::new(
            Intent::BestTime,
            &["best time", "least delay", "minimum delay", "best slot"],
        ),
        IntentRule {
            or_entity: Some(EntityKind::Hour),
            ..IntentRule::new(
                Intent::DelayAtHour,
                &["delay at", "avg delay at", "average delay at"],
            )
        },
        IntentRule::new(
            Intent::TopFlights,
            &[
                "top flights",
                "most delayed flights",
                "flights causing delays",
                "worst flights",
            ],
        ),
        IntentRule {
            requires_entity: Some(EntityKind::Route),
            ..IntentRule::new(Intent::RouteDelay, &["route", "from", " to "])
        },
        IntentRule {
            also_keywords: vec!["top".to_string(), "most".to_string()],
            ..IntentRule::new(Intent::TopAircraft, &["aircraft"])
        },
    ]
}

pub fn builtin_rules() -> &'static [IntentRule] {
    static RULES: OnceLock<Vec<IntentRule>> = OnceLock::new();
    RULES.get_or_init(default_rules)
}

/// First matching rule wins; `Summary` when nothing fires.
pub fn classify_with(rules: &[IntentRule], text: &str, signals: EntitySignals) -> Intent {
    let lower = text.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.matches(&lower, signals))
        .map(|rule| rule.intent)
        .unwrap_or(Intent::Summary)
}

pub fn classify(text: &str, hour_present: bool, route_present: bool) -> Intent {
    classify_with(
        builtin_rules(),
        text,
        EntitySignals {
            hour: hour_present,
            route: route_present,
        },
    )
}
