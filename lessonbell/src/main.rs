/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{Local, Weekday};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use lessonbell::config::ScheduleConfig;
use lessonbell::engine::{ScheduleEngine, SystemClock};
use lessonbell::event::{Command, ScheduleEvent};
use lessonbell::ticker::Ticker;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Lessonbell class-schedule engine.
///
/// Example:
///   lessonbell --config demos/timetable.yaml --log-dir logs/
#[derive(Debug, Parser)]
#[command(
    name = "lessonbell",
    about = "Lessonbell – class-schedule state machine",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML timetable configuration file.
    #[arg(short = 'c', long = "config", default_value = "timetable.yaml")]
    config: PathBuf,

    /// Also write logs to a timestamped file in this directory.
    #[arg(short = 'l', long = "log-dir")]
    log_dir: Option<PathBuf>,
}

// ── Logging ───────────────────────────────────────────────────────────────────

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}

fn init_logging(log_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let Some(dir) = log_dir else {
        tracing_subscriber::fmt().with_env_filter(env_filter()).init();
        return Ok(None);
    };

    fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create log directory: {}", dir.display()))?;
    let path = dir.join(Local::now().format("%Y%m%d-%H%M%S.log").to_string());
    let file = File::create(&path)
        .with_context(|| format!("Cannot create log file: {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(Some(path))
}

// ── Command input ─────────────────────────────────────────────────────────────

/// Read commands from stdin and queue them for the loop.
///
/// Returns `true` when the user typed `quit`, `false` on end of input.
async fn read_commands(tx: mpsc::UnboundedSender<Command>) -> bool {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read stdin: {}", e);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            return true;
        }
        match line.parse::<Command>() {
            Ok(command) => {
                if tx.send(command).is_err() {
                    break;
                }
            }
            Err(e) => warn!("{}", e),
        }
    }
    debug!("Command input closed");
    false
}

// ── Reporting ─────────────────────────────────────────────────────────────────

fn report(engine: &ScheduleEngine<SystemClock>, event: ScheduleEvent) {
    let lesson = match event {
        ScheduleEvent::ClassPrepare { index } | ScheduleEvent::ClassBegin { index } => {
            engine.today().get(index)
        }
        ScheduleEvent::ClassFinish => engine.previous_lesson(),
        ScheduleEvent::Reload => None,
    };
    match lesson {
        Some(lesson) => info!(
            lesson = %lesson,
            self_study = engine.schedule().is_self_study(&lesson.name),
            "{}",
            event
        ),
        None => info!(weekday = %engine.weekday(), "{}", event),
    }
}

fn log_weekly_summary(config: &ScheduleConfig) {
    use Weekday::*;
    for weekday in [Mon, Tue, Wed, Thu, Fri, Sat, Sun] {
        info!("  {}: {}", weekday, config.schedule.describe_day(weekday));
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    match init_logging(cli.log_dir.as_deref()) {
        Ok(Some(path)) => info!("Logging to {}", path.display()),
        Ok(None) => {}
        Err(e) => {
            eprintln!("Failed to initialise logging: {:#}", e);
            process::exit(1);
        }
    }

    info!("Lessonbell starting up...");
    info!(config = %cli.config.display(), log_dir = ?cli.log_dir, "Configuration");

    // ── Load timetable configuration ──────────────────────────────────────────
    let config = match ScheduleConfig::load_from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load timetable configuration: {:#}", e);
            process::exit(1);
        }
    };
    log_weekly_summary(&config);

    let mut ticker = Ticker::new(config.poll_interval);
    let mut engine = ScheduleEngine::new(config.schedule, SystemClock);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut reader = tokio::spawn(read_commands(tx));
    let mut input_open = true;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    // ── Main loop: tick → poll → report → apply commands ──────────────────────
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Interrupted, shutting down");
                break;
            }
            quit = &mut reader, if input_open => {
                input_open = false;
                if matches!(quit, Ok(true)) {
                    info!("Quit requested, shutting down");
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        for event in engine.poll_all() {
            report(&engine, event);
        }

        while let Ok(command) = rx.try_recv() {
            match engine.apply(command) {
                Ok(Some(event)) => report(&engine, event),
                Ok(None) => {}
                Err(e) => warn!("Command rejected: {}", e),
            }
        }

        debug!(
            state = ?engine.lesson_state(),
            current_index = engine.current_index(),
            progress = ?engine.progress(),
            "Tick"
        );
    }
}
