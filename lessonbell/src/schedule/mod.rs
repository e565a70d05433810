/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Weekly schedule and the derivation of today's lessons.
//!
//! A [`Schedule`] holds the raw per-weekday [`Token`] sequences together with
//! the shared period timetable.  [`Schedule::rebuild_today`] walks one
//! weekday's tokens and turns them into absolute-time [`Lesson`]s:
//!
//! | Token | Slot consumed | Effect |
//! |---|---|---|
//! | separator | no | skipped |
//! | empty | yes | counts towards the next lesson's `empty_before` |
//! | `~` | yes | captures the slot start as the pending start, if none yet |
//! | name | yes | closes a lesson from the pending (or own) start to this slot's end |
//!
//! Slot alignment is validated whenever tokens are set, so derivation itself
//! cannot run past the end of the timetable.

pub mod period;

pub use period::Period;

use std::collections::HashSet;

use chrono::{Duration, NaiveDate, Weekday};
use tracing::{debug, warn};

use crate::config::ConfigError;
use crate::lesson::{Lesson, Token, CONTINUATION};

/// Separator token used when the configuration does not name one.
pub const DEFAULT_SEPARATOR: &str = "|";

/// Index of `weekday` in the per-day token table (Monday = 0).
fn day_index(weekday: Weekday) -> usize {
    weekday.num_days_from_monday() as usize
}

/// Weekday for an ISO number (1 = Monday … 7 = Sunday).
pub fn weekday_from_number(n: u8) -> Option<Weekday> {
    match n {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

// ── Schedule ──────────────────────────────────────────────────────────────────

/// Raw weekly schedule plus everything needed to derive a day's lessons.
///
/// Read-only to the engine apart from [`set_day`](Self::set_day), which the
/// engine calls on a schedule edit.
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Token sequence per weekday, Monday first.
    weekly: [Vec<Token>; 7],
    periods: Vec<Period>,
    separator: String,
    self_study: HashSet<String>,
    preparation: Duration,
    temporary_hide: Duration,
}

impl Schedule {
    /// Create a schedule with seven empty days.
    pub fn new(periods: Vec<Period>, preparation: Duration, temporary_hide: Duration) -> Self {
        Self {
            weekly: Default::default(),
            periods,
            separator: DEFAULT_SEPARATOR.to_string(),
            self_study: HashSet::new(),
            preparation,
            temporary_hide,
        }
    }

    /// Replace the separator token used by [`parse_tokens`](Self::parse_tokens).
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Replace the set of self-study lesson names.
    pub fn with_self_study<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.self_study = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the token sequence for `weekday`.
    ///
    /// # Errors
    /// [`ConfigError::TooManySlots`] if the tokens need more periods than the
    /// timetable defines.  The previous tokens are kept in that case.
    pub fn set_day(&mut self, weekday: Weekday, tokens: Vec<Token>) -> Result<(), ConfigError> {
        let slots = tokens.iter().filter(|t| t.takes_slot()).count();
        if slots > self.periods.len() {
            return Err(ConfigError::TooManySlots {
                weekday,
                slots,
                periods: self.periods.len(),
            });
        }
        self.weekly[day_index(weekday)] = tokens;
        Ok(())
    }

    /// Classify raw strings with this schedule's separator.
    pub fn parse_tokens<S: AsRef<str>>(&self, raw: &[S]) -> Vec<Token> {
        raw.iter()
            .map(|s| Token::parse(s.as_ref(), &self.separator))
            .collect()
    }

    pub fn tokens(&self, weekday: Weekday) -> &[Token] {
        &self.weekly[day_index(weekday)]
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Lead time of the preparation bell.
    pub fn preparation(&self) -> Duration {
        self.preparation
    }

    /// How far "hide temporarily" extends the last lesson.
    pub fn temporary_hide(&self) -> Duration {
        self.temporary_hide
    }

    pub fn is_self_study(&self, name: &str) -> bool {
        self.self_study.contains(name)
    }

    /// Render a day's tokens back to their textual form, space separated.
    pub fn describe_day(&self, weekday: Weekday) -> String {
        self.tokens(weekday)
            .iter()
            .map(|t| match t {
                Token::Lesson(name) => name.as_str(),
                Token::Separator => self.separator.as_str(),
                Token::Continuation => CONTINUATION,
                Token::Empty => "_",
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Derive the ordered lessons of `weekday`, anchored on `date`.
    pub fn rebuild_today(&self, weekday: Weekday, date: NaiveDate) -> Vec<Lesson> {
        let mut lessons = Vec::new();
        let mut pending_start: Option<Duration> = None;
        let mut empty_before = 0usize;
        let mut slot = 0usize;

        for token in self.tokens(weekday) {
            if !token.takes_slot() {
                continue;
            }
            let Some(period) = self.periods.get(slot) else {
                // Unreachable after set_day validation; stop rather than panic.
                warn!(%weekday, slot, "Token sequence runs past the timetable, truncating");
                break;
            };
            slot += 1;

            match token {
                Token::Empty => empty_before += 1,
                Token::Continuation => {
                    pending_start.get_or_insert(period.start);
                }
                Token::Lesson(name) => {
                    let start = pending_start.take().unwrap_or(period.start);
                    let lesson = Lesson::new(
                        name.clone(),
                        date,
                        start,
                        period.finish,
                        self.preparation,
                        empty_before,
                    );
                    debug!(%weekday, lesson = %lesson, empty_before, "Derived lesson");
                    lessons.push(lesson);
                    empty_before = 0;
                }
                Token::Separator => {}
            }
        }

        lessons
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
