// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod analytics;
pub mod answer;
pub mod config;
pub mod dataset;
pub mod preprocess;
pub mod session;

use std::path::PathBuf;
use thiserror::Error;

pub use analytics::AnalyticsResult;
pub use answer::{Answer, Chart, ChartKind};
pub use config::AppConfig;
pub use dataset::{ColumnSet, Dataset, DatasetLoader, FlightRecord};
pub use session::{respond, Role, Session, Transcript, Turn};

#[derive(Error, Debug)]
pub enum FlightqError {
    #[error("Dataset not found: {0}")]
    DataNotFound(PathBuf),
    #[error("Unsupported dataset format '{0}'")]
    UnsupportedFormat(String),
    #[error("Dataset has no header row")]
    MissingHeader,
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-user config directory shared by `config.json` and `intent_rules.json`.
pub fn get_config_root() -> PathBuf {
    directories::ProjectDirs::from("org", "flightq", "flightq")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
