/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Core lesson data structures.
//!
//! Two distinct types model the two sides of the derivation pipeline:
//!
//! ```text
//! config file ──(raw strings)──►  Token  ──(Schedule::rebuild_today)──►  Lesson  ──►  ScheduleEngine
//!                                 ↑ per weekday, per slot                 ↑ today only, absolute times
//! ```
//!
//! # Ownership model
//! A `Vec<Lesson>` is built in one batch whenever the day's lesson list is
//! (re)derived and is **owned** by the [`ScheduleEngine`] until the next
//! rebuild replaces it wholesale.  The only field the engine ever changes
//! afterwards is [`Lesson::delay`].
//!
//! [`ScheduleEngine`]: crate::engine::ScheduleEngine

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Raw token value marking a slot that continues into the next lesson.
pub const CONTINUATION: &str = "~";

// ── Token ─────────────────────────────────────────────────────────────────────

/// One entry of a weekday's raw schedule.
///
/// Every variant except [`Token::Separator`] occupies exactly one timetable
/// period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A named lesson; closes the lesson that started at the pending slot.
    Lesson(String),
    /// Visual divider between blocks of the day; consumes no period.
    Separator,
    /// The slot belongs to the following lesson (double periods).
    Continuation,
    /// A blank slot with no lesson.
    Empty,
}

impl Token {
    /// Classify a raw configuration string.
    ///
    /// `separator` is the configured separator token (usually `"|"`).
    pub fn parse(raw: &str, separator: &str) -> Self {
        if raw == separator {
            Token::Separator
        } else if raw == CONTINUATION {
            Token::Continuation
        } else if raw.trim().is_empty() {
            Token::Empty
        } else {
            Token::Lesson(raw.to_string())
        }
    }

    /// `true` for every token that consumes one timetable period.
    pub fn takes_slot(&self) -> bool {
        !matches!(self, Token::Separator)
    }
}

// ── Lesson ────────────────────────────────────────────────────────────────────

/// One teaching occurrence on the current calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    /// Display name; also the key for self-study membership.
    pub name: String,
    pub start: NaiveDateTime,
    pub finish: NaiveDateTime,
    /// Preparation bell: `start - preparation`.
    pub prepare: NaiveDateTime,
    /// Manual extension of the end of the lesson.  Zero unless a
    /// "hide temporarily" action (or an explicit delay) is in effect.
    pub delay: Duration,
    /// Number of blank slots directly before this lesson.
    pub empty_before: usize,
}

impl Lesson {
    /// Build a lesson on `date` from two time-of-day offsets.
    pub fn new(
        name: impl Into<String>,
        date: NaiveDate,
        start: Duration,
        finish: Duration,
        preparation: Duration,
        empty_before: usize,
    ) -> Self {
        let midnight = date.and_time(NaiveTime::MIN);
        let start = midnight + start;
        Self {
            name: name.into(),
            start,
            finish: midnight + finish,
            prepare: start - preparation,
            delay: Duration::zero(),
            empty_before,
        }
    }

    /// Effective end of the lesson: `finish + delay`.
    pub fn real_finish(&self) -> NaiveDateTime {
        self.finish + self.delay
    }
}

impl fmt::Display for Lesson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}-{}",
            self.name,
            self.start.format("%H:%M"),
            self.finish.format("%H:%M")
        )
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
