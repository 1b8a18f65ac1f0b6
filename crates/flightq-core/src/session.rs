// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::analytics::{self, DEFAULT_TOP_N};
use crate::answer::Answer;
use crate::dataset::Dataset;
use anyhow::{Context, Result};
use flightq_nlp::IntentClassifier;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Append-only chat log for display. Never consulted when answering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(Turn {
            role,
            content: content.into(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read transcript {:?}", path))?;
        let transcript = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse transcript {:?}", path))?;
        Ok(transcript)
    }
}

/// Answers one query against the snapshot. Pure: same inputs, same answer.
pub fn respond(
    dataset: &Dataset,
    classifier: &IntentClassifier,
    text: &str,
    top_n: usize,
) -> Answer {
    let parsed = classifier.interpret(text);
    let result = analytics::execute(dataset, parsed.intent, &parsed.entities, top_n);
    log::debug!("[Pipeline] {} answered for '{}'", parsed.intent, text);
    Answer::new(parsed, result)
}

pub struct Session<'a> {
    dataset: &'a Dataset,
    classifier: IntentClassifier,
    top_n: usize,
    transcript: Transcript,
}

impl<'a> Session<'a> {
    pub fn new(dataset: &'a Dataset, classifier: IntentClassifier) -> Self {
        Self {
            dataset,
            classifier,
            top_n: DEFAULT_TOP_N,
            transcript: Transcript::new(),
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n.max(1);
        self
    }

    /// Continues from an earlier transcript, e.g. one restored from disk.
    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = transcript;
        self
    }

    pub fn ask(&mut self, text: &str) -> Answer {
        self.transcript.push(Role::User, text);
        let answer = respond(self.dataset, &self.classifier, text, self.top_n);
        self.transcript.push(Role::Assistant, answer.text());
        answer
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }
}
