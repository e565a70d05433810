/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Messages crossing the engine boundary.
//!
//! ```text
//! ScheduleEngine ──(ScheduleEvent)──►  display layer
//! ScheduleEngine ◄──(Command, queued)──  display layer / stdin
//! ```
//!
//! Commands are values, never in-place mutations from another thread: the
//! driver loop drains its queue once per iteration and hands each command to
//! [`ScheduleEngine::apply`](crate::engine::ScheduleEngine::apply).

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Weekday};

use crate::schedule::weekday_from_number;

// ── ScheduleEvent ─────────────────────────────────────────────────────────────

/// A discrete transition observed by polling (or implied by a command).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleEvent {
    /// The displayed weekday changed and today's lessons were re-derived.
    Reload,
    /// The preparation bell of lesson `index` rang.
    ClassPrepare { index: usize },
    /// Lesson `index` started.
    ClassBegin { index: usize },
    /// The current lesson ended.
    ClassFinish,
}

impl fmt::Display for ScheduleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleEvent::Reload => write!(f, "Reload"),
            ScheduleEvent::ClassPrepare { index } => write!(f, "ClassPrepare({index})"),
            ScheduleEvent::ClassBegin { index } => write!(f, "ClassBegin({index})"),
            ScheduleEvent::ClassFinish => write!(f, "ClassFinish"),
        }
    }
}

// ── Command ───────────────────────────────────────────────────────────────────

/// A queued request to mutate the engine between two polls.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start the current lesson now.
    AdvanceOn,
    /// End the current lesson now.
    AdvanceOff,
    /// Re-open the lesson that just ended for a short while.
    HideTemporarily,
    /// Set the current lesson's delay.
    SetDelay(Duration),
    /// Display `target`'s schedule whenever the calendar says `calendar`.
    RemapWeekday { calendar: Weekday, target: Weekday },
    /// Drop the override for `calendar`.
    ClearRemap(Weekday),
    /// Replace the displayed weekday's raw tokens.
    ReplaceTodayTokens(Vec<String>),
    /// Re-derive today's lessons.
    Reload,
}

/// Why a command line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot parse command '{input}': {reason}")]
pub struct ParseCommandError {
    pub input: String,
    pub reason: &'static str,
}

impl FromStr for Command {
    type Err = ParseCommandError;

    /// Parse one line of the driver's command language:
    ///
    /// `advance on` · `advance off` · `hide` · `delay <minutes>` ·
    /// `remap <calendar 1-7> <target 1-7>` · `unmap <calendar 1-7>` ·
    /// `edit <token>...` · `reload`
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let err = |reason: &'static str| ParseCommandError {
            input: line.to_string(),
            reason,
        };
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or_else(|| err("empty command"))?;
        let args: Vec<&str> = words.collect();

        match (verb, args.as_slice()) {
            ("advance", ["on"]) => Ok(Command::AdvanceOn),
            ("advance", ["off"]) => Ok(Command::AdvanceOff),
            ("advance", _) => Err(err("expected 'advance on' or 'advance off'")),
            ("hide", []) => Ok(Command::HideTemporarily),
            ("delay", [minutes]) => {
                let minutes: i64 = minutes
                    .parse()
                    .ok()
                    .filter(|m| (0..=MAX_DELAY_MINUTES).contains(m))
                    .ok_or_else(|| err("delay needs a whole number of minutes, 0 to 1440"))?;
                Ok(Command::SetDelay(Duration::minutes(minutes)))
            }
            ("remap", [calendar, target]) => Ok(Command::RemapWeekday {
                calendar: parse_weekday(calendar).ok_or_else(|| err("weekday must be 1..7"))?,
                target: parse_weekday(target).ok_or_else(|| err("weekday must be 1..7"))?,
            }),
            ("unmap", [calendar]) => Ok(Command::ClearRemap(
                parse_weekday(calendar).ok_or_else(|| err("weekday must be 1..7"))?,
            )),
            // `edit` with no tokens clears the day.
            ("edit", tokens) => Ok(Command::ReplaceTodayTokens(
                tokens.iter().map(|t| edit_token(t)).collect(),
            )),
            ("reload", []) => Ok(Command::Reload),
            _ => Err(err("unknown command or wrong number of arguments")),
        }
    }
}

/// Longest delay accepted on the command line: one day.
const MAX_DELAY_MINUTES: i64 = 24 * 60;

fn parse_weekday(s: &str) -> Option<Weekday> {
    s.parse().ok().and_then(weekday_from_number)
}

/// `_` stands for a blank slot on the command line, where an empty word
/// cannot be typed.
fn edit_token(word: &str) -> String {
    if word == "_" {
        String::new()
    } else {
        word.to_string()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
