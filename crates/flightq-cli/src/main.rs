// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flightq_core::answer::TIP;
use flightq_core::{
    respond, Answer, AppConfig, Chart, Dataset, DatasetLoader, Role, Session, Transcript,
};
use flightq_nlp::IntentClassifier;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const BAR_WIDTH: f64 = 40.0;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the flight data (CSV or spreadsheet)
    #[arg(short, long, env = "FLIGHTQ_DATA")]
    data: Option<PathBuf>,

    /// Print answers as JSON
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question
    Ask {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Interactive question loop; "exit" or "quit" leaves
    Chat {
        /// Continue from a transcript saved earlier
        #[arg(long)]
        resume: Option<PathBuf>,
        /// Write the transcript as JSON on exit
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Show the intent rule table and where it is loaded from
    Rules {
        /// Overwrite intent_rules.json with the built-in rules
        #[arg(long)]
        reset: bool,
    },
    /// Show detected columns and a few raw rows
    Inspect {
        #[arg(long, default_value_t = 10)]
        rows: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    let config = AppConfig::load();
    let data_path = config.resolve_data_path(cli.data.clone());
    let load_dataset = || {
        DatasetLoader::load(&data_path)
            .with_context(|| format!("Could not load flight data from {:?}", data_path))
    };
    let classifier = IntentClassifier::new().unwrap_or_default();

    match &cli.command {
        Commands::Ask { query } => {
            let dataset = load_dataset()?;
            let text = query.join(" ");
            let answer = respond(&dataset, &classifier, &text, config.top_n);
            print_answer(&answer, cli.json)?;
        }
        Commands::Chat { resume, save } => {
            let dataset = load_dataset()?;
            let mut session = Session::new(&dataset, classifier).with_top_n(config.top_n);
            if let Some(path) = resume {
                let transcript = Transcript::load_json(path)?;
                for turn in transcript.turns() {
                    let who = match turn.role {
                        Role::User => ">",
                        Role::Assistant => "",
                    };
                    println!("{} {}", who, turn.content);
                }
                session = session.with_transcript(transcript);
            }
            println!("Loaded {} flights from {:?}", dataset.len(), data_path);
            println!("{}", TIP);

            let stdin = io::stdin();
            loop {
                print!("> ");
                io::stdout().flush()?;
                let mut line = String::new();
                if stdin.lock().read_line(&mut line)? == 0 {
                    break;
                }
                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
                    break;
                }
                let answer = session.ask(text);
                print_answer(&answer, cli.json)?;
            }

            if let Some(path) = save {
                session
                    .into_transcript()
                    .save_json(path)
                    .with_context(|| format!("Failed to save transcript to {:?}", path))?;
                println!("Transcript saved to {:?}", path);
            }
        }
        Commands::Inspect { rows } => inspect(&load_dataset()?, *rows, cli.json)?,
        Commands::Rules { reset } => show_rules(classifier, *reset)?,
    }

    Ok(())
}

fn show_rules(mut classifier: IntentClassifier, reset: bool) -> Result<()> {
    if reset {
        classifier
            .reset_defaults()
            .with_context(|| format!("Failed to reset {:?}", classifier.config_path()))?;
        println!("Rules reset to defaults in {:?}", classifier.config_path());
    }
    println!("Rules from {:?}:", classifier.config_path());
    for (i, rule) in classifier.rules().iter().enumerate() {
        let mut line = format!("{}. {} <- {}", i + 1, rule.intent, rule.keywords.join(" | "));
        if !rule.also_keywords.is_empty() {
            line.push_str(&format!(" + ({})", rule.also_keywords.join(" | ")));
        }
        if let Some(kind) = rule.or_entity {
            line.push_str(&format!(" or {:?}", kind));
        }
        if let Some(kind) = rule.requires_entity {
            line.push_str(&format!(" requires {:?}", kind));
        }
        println!("{}", line);
    }
    Ok(())
}

fn print_answer(answer: &Answer, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(answer)?);
        return Ok(());
    }
    println!("{}", answer.text());
    for chart in &answer.charts {
        print_chart(chart);
    }
    Ok(())
}

fn print_chart(chart: &Chart) {
    if chart.points.is_empty() {
        return;
    }
    println!();
    println!("  {}", chart.title);
    let max = chart
        .points
        .iter()
        .map(|(_, v)| v.abs())
        .fold(0.0_f64, f64::max);
    for (hour, value) in &chart.points {
        let len = if max > 0.0 {
            (value.abs() / max * BAR_WIDTH).round() as usize
        } else {
            0
        };
        let glyph = if *value < 0.0 { '-' } else { '#' };
        println!(
            "  {:>2}:00 | {} {:.1}",
            hour,
            glyph.to_string().repeat(len),
            value
        );
    }
}

fn inspect(dataset: &Dataset, rows: usize, json: bool) -> Result<()> {
    if json {
        let out = serde_json::json!({
            "rows": dataset.len(),
            "headers": dataset.headers(),
            "columns": dataset.columns(),
            "sample": dataset.sample(rows),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Rows: {}", dataset.len());
    println!("Columns: {}", dataset.headers().join(", "));
    let cols = dataset.columns();
    let flags = [
        ("delay", cols.delay || cols.dep_delay || (cols.std && cols.atd)),
        ("flight number", cols.flight_id),
        ("aircraft", cols.aircraft),
        ("route", cols.route),
    ];
    for (name, present) in flags {
        println!("  {:<14} {}", name, if present { "yes" } else { "no" });
    }
    println!();
    for row in dataset.sample(rows) {
        println!("{}", row.join(" | "));
    }
    Ok(())
}
