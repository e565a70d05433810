/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! day-sim – replays one school day against a timetable.
//!
//! A [`ManualClock`] starts at midnight of `--date` and is stepped forward by
//! `--step-minutes` until the next midnight.  Every event the engine reports
//! is printed with the simulated time.  Scripted commands can be injected at
//! a given time of day:
//!
//! ```text
//! day-sim -c demos/timetable.yaml --date 2026-03-02 \
//!         --at "09:30=advance off" --at "09:40=hide"
//! ```

use std::path::PathBuf;
use std::process;

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Local, NaiveDate, NaiveTime};
use clap::Parser;
use tracing::{error, warn};

use lessonbell::config::ScheduleConfig;
use lessonbell::engine::{ManualClock, ScheduleEngine};
use lessonbell::event::Command;

#[derive(Debug, Parser)]
#[command(
    name = "day-sim",
    about = "Replay one school day against a timetable (manual testing only)"
)]
struct Cli {
    /// Path to the YAML timetable configuration file.
    #[arg(short = 'c', long = "config", default_value = "timetable.yaml")]
    config: PathBuf,

    /// Calendar date to simulate (YYYY-MM-DD); defaults to today.
    #[arg(short = 'd', long = "date")]
    date: Option<NaiveDate>,

    /// Simulated minutes per poll.
    #[arg(short = 's', long = "step-minutes", default_value_t = 1)]
    step_minutes: u32,

    /// Inject a command at a time of day, e.g. "10:50=hide".
    #[arg(long = "at", value_parser = parse_scripted)]
    at: Vec<(NaiveTime, Command)>,
}

fn parse_scripted(raw: &str) -> Result<(NaiveTime, Command)> {
    let (time, command) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected HH:MM=<command>"))?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .with_context(|| format!("bad time of day '{}'", time.trim()))?;
    Ok((time, command.parse()?))
}

fn run(cli: Cli) -> Result<()> {
    let config = ScheduleConfig::load_from_file(&cli.config)?;
    let date = cli.date.unwrap_or_else(|| Local::now().date_naive());
    let step = Duration::minutes(i64::from(cli.step_minutes.max(1)));

    let midnight = date.and_time(NaiveTime::MIN);
    let end = midnight + Duration::days(1);
    let clock = ManualClock::new(midnight);
    let mut engine = ScheduleEngine::new(config.schedule, clock.clone());

    println!(
        "{} ({}): {} lesson(s)",
        date,
        engine.weekday(),
        engine.today().len()
    );
    for lesson in engine.today() {
        println!(
            "  {}  (prepare {}, {} empty slot(s) before)",
            lesson,
            lesson.prepare.format("%H:%M"),
            lesson.empty_before
        );
    }

    let mut script = cli.at;
    script.sort_by_key(|(time, _)| *time);
    let mut script = script.into_iter().peekable();

    let mut now = midnight;
    while now < end {
        for event in engine.poll_all() {
            println!("{}  {}", now.format("%H:%M"), event);
        }

        while let Some((_, command)) = script.next_if(|(time, _)| date.and_time(*time) <= now) {
            match engine.apply(command.clone()) {
                Ok(Some(event)) => println!("{}  {}  ({:?})", now.format("%H:%M"), event, command),
                Ok(None) => println!("{}  applied {:?}", now.format("%H:%M"), command),
                Err(e) => warn!(?command, "Command rejected: {}", e),
            }
        }

        now += step;
        clock.set(now);
    }

    println!("day complete, final state {:?}", engine.lesson_state());
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run(Cli::parse()) {
        error!("{:#}", e);
        process::exit(1);
    }
}
