/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The schedule state machine.
//!
//! [`ScheduleEngine`] owns today's [`Lesson`]s and advances a five-state
//! machine strictly from wall-clock time.  Each single-step [`poll`] reads
//! the clock once and yields at most one [`ScheduleEvent`]:
//!
//! | State | Guard | Next state | Event |
//! |---|---|---|---|
//! | `BeforeSchool` | `now ≥ today[0].prepare` | `Preparing`, index 0 | `ClassPrepare(0)` |
//! | `Preparing` | `now ≥ today[i].start` | `AtClass` | `ClassBegin(i)` |
//! | `AtClass` | `now ≥ today[i].finish + delay` | `Break` / `AfterSchool`, index + 1 | `ClassFinish` |
//! | `Break` | `now ≥ today[i].prepare` | `Preparing` | `ClassPrepare(i)` |
//! | `AfterSchool` | — | — | — |
//!
//! A change of the displayed weekday (calendar weekday after remapping)
//! preempts the table: that poll re-derives the day and yields only
//! `Reload`.  [`poll_all`] repeats single steps until nothing is due, so a
//! process that slept through several transitions reports all of them, in
//! causal order, in one batch.
//!
//! Manual mutations (`advance_on`, `advance_off`, `hide_temporarily`, …) are
//! applied between polls and validated against the current state; see
//! [`EngineError`].
//!
//! [`poll`]: ScheduleEngine::poll
//! [`poll_all`]: ScheduleEngine::poll_all

pub mod clock;
pub mod error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::EngineError;

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDateTime, Weekday};
use tracing::{debug, info, warn};

use crate::event::{Command, ScheduleEvent};
use crate::lesson::Lesson;
use crate::schedule::Schedule;

// ── LessonState ───────────────────────────────────────────────────────────────

/// Coarse phase of the school day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LessonState {
    /// Before the first preparation bell.
    BeforeSchool,
    /// Between a preparation bell and the start of that lesson.
    Preparing,
    AtClass,
    /// Between the end of one lesson and the next preparation bell.
    Break,
    /// After the last lesson, or all day when there are no lessons.
    AfterSchool,
}

// ── Progress ──────────────────────────────────────────────────────────────────

/// Remaining-time view of the current state, for the display layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Time left until the next transition; `total` is the length of the
    /// whole phase when it is bounded.
    Countdown {
        remaining: Duration,
        total: Option<Duration>,
    },
    /// Time since the last lesson ended.
    Elapsed(Duration),
    /// No lessons today.
    Idle,
}

impl Progress {
    /// Completed share of a bounded countdown, clamped to `[0, 1]`.
    pub fn fraction_elapsed(&self) -> Option<f64> {
        match self {
            Progress::Countdown {
                remaining,
                total: Some(total),
            } if *total > Duration::zero() => {
                let left = remaining.num_milliseconds() as f64 / total.num_milliseconds() as f64;
                Some((1.0 - left).clamp(0.0, 1.0))
            }
            _ => None,
        }
    }
}

// ── ScheduleEngine ────────────────────────────────────────────────────────────

/// Owns the day's lessons and the lesson-state machine.
///
/// Driven by a single loop: `tick → poll_all → report → apply queued
/// commands`.  If a multi-threaded host needs to share it, the whole engine
/// goes behind one mutex, since a transition updates several fields at once.
pub struct ScheduleEngine<C: Clock = SystemClock> {
    schedule: Schedule,
    clock: C,
    today: Vec<Lesson>,
    lesson_state: LessonState,
    /// Index into `today`; equals `today.len()` in `AfterSchool`.
    current_index: usize,
    /// Weekday whose schedule is displayed (after remapping).
    weekday: Weekday,
    /// Calendar weekday → displayed weekday.
    weekday_map: HashMap<Weekday, Weekday>,
    /// Last observed wall-clock time; only polling advances it.
    now: NaiveDateTime,
}

impl<C: Clock> ScheduleEngine<C> {
    /// Create an engine and derive the lessons of the current weekday.
    pub fn new(schedule: Schedule, clock: C) -> Self {
        let now = clock.now();
        let mut engine = Self {
            schedule,
            clock,
            today: Vec::new(),
            lesson_state: LessonState::BeforeSchool,
            current_index: 0,
            weekday: now.weekday(),
            weekday_map: HashMap::new(),
            now,
        };
        engine.reload();
        engine
    }

    // ── Polling ───────────────────────────────────────────────────────────────

    /// Read the clock and perform at most one transition.
    pub fn poll(&mut self) -> Option<ScheduleEvent> {
        self.now = self.clock.now();

        let displayed = self.displayed_weekday(self.now.weekday());
        if displayed != self.weekday {
            info!(from = %self.weekday, to = %displayed, "Displayed weekday changed");
            self.weekday = displayed;
            self.reload();
            return Some(ScheduleEvent::Reload);
        }

        match self.lesson_state {
            LessonState::BeforeSchool => {
                let first = self.today.first()?;
                if self.now >= first.prepare {
                    self.current_index = 0;
                    self.lesson_state = LessonState::Preparing;
                    return Some(ScheduleEvent::ClassPrepare { index: 0 });
                }
            }
            LessonState::Preparing => {
                let lesson = self.today.get(self.current_index)?;
                if self.now >= lesson.start {
                    self.lesson_state = LessonState::AtClass;
                    return Some(ScheduleEvent::ClassBegin {
                        index: self.current_index,
                    });
                }
            }
            LessonState::AtClass => {
                let lesson = self.today.get(self.current_index)?;
                if self.now >= lesson.real_finish() {
                    self.finish_current();
                    return Some(ScheduleEvent::ClassFinish);
                }
            }
            LessonState::Break => {
                let lesson = self.today.get(self.current_index)?;
                if self.now >= lesson.prepare {
                    self.lesson_state = LessonState::Preparing;
                    return Some(ScheduleEvent::ClassPrepare {
                        index: self.current_index,
                    });
                }
            }
            LessonState::AfterSchool => {}
        }
        None
    }

    /// Poll until nothing more is due and return the events in order.
    pub fn poll_all(&mut self) -> Vec<ScheduleEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.poll() {
            info!(
                event = %event,
                state = ?self.lesson_state,
                current_index = self.current_index,
                "Event captured"
            );
            events.push(event);
        }
        events
    }

    /// Re-derive today's lessons for the displayed weekday and restart the
    /// state machine from `BeforeSchool`.
    ///
    /// A day without lessons goes straight to an idle `AfterSchool`.
    pub fn reload(&mut self) {
        self.today = self.schedule.rebuild_today(self.weekday, self.now.date());
        self.current_index = 0;

        if self.today.is_empty() {
            warn!(weekday = %self.weekday, "No lessons today, idling until the next reload");
            self.lesson_state = LessonState::AfterSchool;
            return;
        }

        self.lesson_state = LessonState::BeforeSchool;
        info!(
            weekday = %self.weekday,
            lessons = self.today.len(),
            tokens = %self.schedule.describe_day(self.weekday),
            "Loaded today's lessons"
        );
    }

    fn finish_current(&mut self) {
        self.current_index += 1;
        self.lesson_state = if self.current_index < self.today.len() {
            LessonState::Break
        } else {
            LessonState::AfterSchool
        };
    }

    // ── Manual mutations ──────────────────────────────────────────────────────

    /// Start the current lesson now instead of waiting for its start time.
    ///
    /// Valid in `BeforeSchool`, `Preparing` and `Break`.
    pub fn advance_on(&mut self) -> Result<ScheduleEvent, EngineError> {
        match self.lesson_state {
            LessonState::BeforeSchool | LessonState::Preparing | LessonState::Break => {}
            state => {
                return Err(EngineError::InvalidState {
                    action: "start a lesson early",
                    state,
                })
            }
        }
        self.current_lesson().ok_or(EngineError::NoCurrentLesson {
            index: self.current_index,
            count: self.today.len(),
        })?;

        self.lesson_state = LessonState::AtClass;
        info!(index = self.current_index, "Lesson started early");
        Ok(ScheduleEvent::ClassBegin {
            index: self.current_index,
        })
    }

    /// End the current lesson now.  Valid only in `AtClass`.
    pub fn advance_off(&mut self) -> Result<ScheduleEvent, EngineError> {
        if self.lesson_state != LessonState::AtClass {
            return Err(EngineError::InvalidState {
                action: "end a lesson early",
                state: self.lesson_state,
            });
        }
        info!(index = self.current_index, "Lesson ended early");
        self.finish_current();
        Ok(ScheduleEvent::ClassFinish)
    }

    /// Re-open the lesson that just ended until `now + temporary_hide`,
    /// never past the next lesson's preparation bell.
    ///
    /// Valid in `Break` and `AfterSchool`.
    pub fn hide_temporarily(&mut self) -> Result<ScheduleEvent, EngineError> {
        match self.lesson_state {
            LessonState::Break | LessonState::AfterSchool => {}
            state => {
                return Err(EngineError::InvalidState {
                    action: "hide temporarily",
                    state,
                })
            }
        }
        let index = self
            .current_index
            .checked_sub(1)
            .ok_or(EngineError::NoLessonToResume)?;
        let count = self.today.len();

        let hidden_until = self.now + self.schedule.temporary_hide();
        let until = match self.today.get(index + 1) {
            Some(next) => hidden_until.min(next.prepare),
            None => hidden_until,
        };
        let lesson = self
            .today
            .get_mut(index)
            .ok_or(EngineError::NoCurrentLesson { index, count })?;
        lesson.delay = until - lesson.finish;

        info!(
            index,
            delay_secs = lesson.delay.num_seconds(),
            until = %until.format("%H:%M:%S"),
            "Lesson re-opened temporarily"
        );
        self.current_index = index;
        self.lesson_state = LessonState::AtClass;
        Ok(ScheduleEvent::ClassBegin { index })
    }

    /// Set the delay of the running lesson.  Valid only in `AtClass`.
    pub fn set_delay(&mut self, delay: Duration) -> Result<(), EngineError> {
        if self.lesson_state != LessonState::AtClass {
            return Err(EngineError::InvalidState {
                action: "delay a lesson",
                state: self.lesson_state,
            });
        }
        let (index, count) = (self.current_index, self.today.len());
        let lesson = self
            .today
            .get_mut(index)
            .ok_or(EngineError::NoCurrentLesson { index, count })?;
        lesson.delay = delay;
        info!(index, delay_secs = delay.num_seconds(), "Lesson delay set");
        Ok(())
    }

    /// Display `target`'s schedule on `calendar` days.  Takes effect on the
    /// next poll, which reports `Reload`.
    pub fn remap_weekday(&mut self, calendar: Weekday, target: Weekday) {
        info!(%calendar, %target, "Weekday remapped");
        self.weekday_map.insert(calendar, target);
    }

    /// Drop the override for `calendar`.  Takes effect on the next poll.
    pub fn clear_weekday_remap(&mut self, calendar: Weekday) {
        if self.weekday_map.remove(&calendar).is_some() {
            info!(%calendar, "Weekday remap cleared");
        }
    }

    /// Replace the displayed weekday's raw tokens and re-derive immediately.
    ///
    /// # Errors
    /// [`EngineError::Schedule`] if the tokens do not fit the timetable; the
    /// current day is left untouched.
    pub fn replace_today_tokens<S: AsRef<str>>(
        &mut self,
        raw: &[S],
    ) -> Result<ScheduleEvent, EngineError> {
        let tokens = self.schedule.parse_tokens(raw);
        self.schedule.set_day(self.weekday, tokens)?;
        info!(weekday = %self.weekday, "Schedule edited");
        self.reload();
        Ok(ScheduleEvent::Reload)
    }

    /// Apply one queued [`Command`] and return the event it implies, if any.
    pub fn apply(&mut self, command: Command) -> Result<Option<ScheduleEvent>, EngineError> {
        debug!(?command, state = ?self.lesson_state, "Applying command");
        match command {
            Command::AdvanceOn => self.advance_on().map(Some),
            Command::AdvanceOff => self.advance_off().map(Some),
            Command::HideTemporarily => self.hide_temporarily().map(Some),
            Command::SetDelay(delay) => self.set_delay(delay).map(|()| None),
            Command::RemapWeekday { calendar, target } => {
                self.remap_weekday(calendar, target);
                Ok(None)
            }
            Command::ClearRemap(calendar) => {
                self.clear_weekday_remap(calendar);
                Ok(None)
            }
            Command::ReplaceTodayTokens(raw) => self.replace_today_tokens(raw.as_slice()).map(Some),
            Command::Reload => {
                self.reload();
                Ok(Some(ScheduleEvent::Reload))
            }
        }
    }

    // ── Read access ───────────────────────────────────────────────────────────

    pub fn lesson_state(&self) -> LessonState {
        self.lesson_state
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn today(&self) -> &[Lesson] {
        &self.today
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    /// Weekday whose schedule is currently displayed.
    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Displayed weekday for a calendar weekday, honouring remaps.
    pub fn displayed_weekday(&self, calendar: Weekday) -> Weekday {
        self.weekday_map.get(&calendar).copied().unwrap_or(calendar)
    }

    /// Lesson at the current index (the running or the next lesson).
    pub fn current_lesson(&self) -> Option<&Lesson> {
        self.today.get(self.current_index)
    }

    /// Lesson before the current index (the one that ended last).
    pub fn previous_lesson(&self) -> Option<&Lesson> {
        self.current_index
            .checked_sub(1)
            .and_then(|i| self.today.get(i))
    }

    pub fn current_is_self_study(&self) -> bool {
        self.current_lesson()
            .is_some_and(|l| self.schedule.is_self_study(&l.name))
    }

    /// Remaining (or elapsed) time in the current state as of the last poll.
    pub fn progress(&self) -> Progress {
        let now = self.now;
        match self.lesson_state {
            LessonState::BeforeSchool => match self.today.first() {
                Some(first) => Progress::Countdown {
                    remaining: first.prepare - now,
                    total: None,
                },
                None => Progress::Idle,
            },
            LessonState::Preparing => match self.current_lesson() {
                Some(lesson) => Progress::Countdown {
                    remaining: lesson.start - now,
                    total: Some(self.schedule.preparation()),
                },
                None => Progress::Idle,
            },
            LessonState::AtClass => match self.current_lesson() {
                Some(lesson) => Progress::Countdown {
                    remaining: lesson.real_finish() - now,
                    total: Some(lesson.real_finish() - lesson.start),
                },
                None => Progress::Idle,
            },
            LessonState::Break => match self.current_lesson() {
                Some(next) => Progress::Countdown {
                    remaining: next.prepare - now,
                    total: self
                        .previous_lesson()
                        .map(|prev| next.prepare - prev.real_finish()),
                },
                None => Progress::Idle,
            },
            LessonState::AfterSchool => match self.today.last() {
                Some(last) => Progress::Elapsed(now - last.real_finish()),
                None => Progress::Idle,
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::schedule::Period;
    use chrono::NaiveDate;

    // ── Test helpers ──────────────────────────────────────────────────────────

    /// 2026-03-02 is a Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn mon(h: u32, m: u32) -> NaiveDateTime {
        monday().and_hms_opt(h, m, 0).unwrap()
    }

    fn tue(h: u32, m: u32) -> NaiveDateTime {
        mon(h, m) + Duration::days(1)
    }

    fn periods(raw: &[&str]) -> Vec<Period> {
        raw.iter().map(|p| Period::parse(p).unwrap()).collect()
    }

    /// Timetable `[09:00-09:45, 10:00-10:45]`, 10 minute preparation bell,
    /// 5 minute temporary hide.
    ///
    /// * Monday:  Math, English
    /// * Tuesday: Art
    /// * Sunday:  nothing
    fn two_lesson_schedule() -> Schedule {
        let mut s = Schedule::new(
            periods(&["09:00-09:45", "10:00-10:45"]),
            Duration::minutes(10),
            Duration::minutes(5),
        )
        .with_self_study(["English"]);
        let mon = s.parse_tokens(&["Math", "|", "English"]);
        s.set_day(Weekday::Mon, mon).unwrap();
        let tue = s.parse_tokens(&["Art"]);
        s.set_day(Weekday::Tue, tue).unwrap();
        s
    }

    fn engine_at(schedule: Schedule, at: NaiveDateTime) -> (ScheduleEngine<ManualClock>, ManualClock) {
        let clock = ManualClock::new(at);
        (ScheduleEngine::new(schedule, clock.clone()), clock)
    }

    use crate::event::ScheduleEvent::{ClassBegin, ClassFinish, ClassPrepare, Reload};

    // ── Construction & polling ────────────────────────────────────────────────

    #[test]
    fn starts_before_school_with_todays_lessons() {
        let (mut e, _) = engine_at(two_lesson_schedule(), mon(8, 0));
        assert_eq!(e.lesson_state(), LessonState::BeforeSchool);
        assert_eq!(e.weekday(), Weekday::Mon);
        assert_eq!(e.today().len(), 2);
        assert!(e.poll_all().is_empty());
    }

    #[test]
    fn walks_through_the_day_in_order() {
        let (mut e, clock) = engine_at(two_lesson_schedule(), mon(8, 0));

        let steps = [
            (mon(8, 49), vec![], LessonState::BeforeSchool, 0),
            (mon(8, 50), vec![ClassPrepare { index: 0 }], LessonState::Preparing, 0),
            (mon(9, 0), vec![ClassBegin { index: 0 }], LessonState::AtClass, 0),
            (mon(9, 44), vec![], LessonState::AtClass, 0),
            (mon(9, 45), vec![ClassFinish], LessonState::Break, 1),
            (mon(9, 50), vec![ClassPrepare { index: 1 }], LessonState::Preparing, 1),
            (mon(10, 0), vec![ClassBegin { index: 1 }], LessonState::AtClass, 1),
            (mon(10, 45), vec![ClassFinish], LessonState::AfterSchool, 2),
            (mon(23, 59), vec![], LessonState::AfterSchool, 2),
        ];
        for (at, events, state, index) in steps {
            clock.set(at);
            assert_eq!(e.poll_all(), events, "events at {at}");
            assert_eq!(e.lesson_state(), state, "state at {at}");
            assert_eq!(e.current_index(), index, "index at {at}");
        }
        assert_eq!(e.current_index(), e.today().len());
    }

    #[test]
    fn catches_up_on_missed_transitions_in_causal_order() {
        let (mut e, clock) = engine_at(two_lesson_schedule(), mon(8, 0));

        clock.set(mon(9, 55));
        assert_eq!(
            e.poll_all(),
            vec![
                ClassPrepare { index: 0 },
                ClassBegin { index: 0 },
                ClassFinish,
                ClassPrepare { index: 1 },
            ]
        );
        assert_eq!(e.lesson_state(), LessonState::Preparing);
    }

    #[test]
    fn catch_up_past_the_second_start_also_begins_it() {
        let (mut e, clock) = engine_at(two_lesson_schedule(), mon(8, 0));

        clock.set(mon(10, 2));
        assert_eq!(
            e.poll_all(),
            vec![
                ClassPrepare { index: 0 },
                ClassBegin { index: 0 },
                ClassFinish,
                ClassPrepare { index: 1 },
                ClassBegin { index: 1 },
            ]
        );
        assert_eq!(e.lesson_state(), LessonState::AtClass);
        assert_eq!(e.current_index(), 1);
    }

    #[test]
    fn poll_all_is_idempotent_for_an_unchanged_clock() {
        let (mut e, clock) = engine_at(two_lesson_schedule(), mon(8, 0));
        clock.set(mon(9, 10));
        assert!(!e.poll_all().is_empty());
        assert!(e.poll_all().is_empty());
        assert!(e.poll_all().is_empty());
    }

    #[test]
    fn index_never_decreases_over_a_monotone_day() {
        let (mut e, clock) = engine_at(two_lesson_schedule(), mon(0, 0));
        let mut last_index = 0;
        let mut seen = Vec::new();

        for minute in 0..(24 * 60) {
            clock.set(mon(0, 0) + Duration::minutes(minute));
            for event in e.poll_all() {
                assert_ne!(event, Reload, "no reload within one calendar day");
                seen.push(event);
            }
            assert!(e.current_index() >= last_index);
            last_index = e.current_index();
        }
        assert_eq!(
            seen,
            vec![
                ClassPrepare { index: 0 },
                ClassBegin { index: 0 },
                ClassFinish,
                ClassPrepare { index: 1 },
                ClassBegin { index: 1 },
                ClassFinish,
            ]
        );
    }

    #[test]
    fn delay_postpones_the_end_of_the_lesson() {
        let (mut e, clock) = engine_at(two_lesson_schedule(), mon(9, 10));
        e.poll_all();
        e.set_delay(Duration::minutes(5)).unwrap();

        clock.set(mon(9, 45));
        assert!(e.poll_all().is_empty());
        clock.set(mon(9, 50));
        assert_eq!(e.poll_all(), vec![ClassFinish, ClassPrepare { index: 1 }]);
    }

    // ── Day rollover & remapping ──────────────────────────────────────────────

    #[test]
    fn day_change_preempts_due_lesson_transitions() {
        let (mut e, clock) = engine_at(two_lesson_schedule(), mon(9, 10));
        e.poll_all();
        assert_eq!(e.lesson_state(), LessonState::AtClass);

        // Monday's lesson is long over *and* the day changed: only Reload.
        clock.set(tue(8, 55));
        assert_eq!(e.poll(), Some(Reload));
        assert_eq!(e.lesson_state(), LessonState::BeforeSchool);
        assert_eq!(e.weekday(), Weekday::Tue);
        assert_eq!(e.today()[0].name, "Art");
        assert_eq!(e.today()[0].start, tue(9, 0));

        assert_eq!(e.poll(), Some(ClassPrepare { index: 0 }));
    }

    #[test]
    fn rollover_batch_contains_exactly_one_reload_first() {
        let (mut e, clock) = engine_at(two_lesson_schedule(), mon(11, 0));
        e.poll_all();

        clock.set(tue(9, 5));
        let events = e.poll_all();
        assert_eq!(events, vec![Reload, ClassPrepare { index: 0 }, ClassBegin { index: 0 }]);
    }

    #[test]
    fn remap_takes_effect_on_the_next_poll() {
        let (mut e, _) = engine_at(two_lesson_schedule(), mon(8, 0));

        e.remap_weekday(Weekday::Mon, Weekday::Tue);
        assert_eq!(e.weekday(), Weekday::Mon, "not applied immediately");
        assert_eq!(e.today().len(), 2);

        assert_eq!(e.poll_all(), vec![Reload]);
        assert_eq!(e.weekday(), Weekday::Tue);
        let names: Vec<_> = e.today().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Art"]);
        // Lessons are still anchored on the calendar date.
        assert_eq!(e.today()[0].start, mon(9, 0));

        assert!(e.poll_all().is_empty());
    }

    #[test]
    fn clearing_a_remap_reloads_the_calendar_day() {
        let (mut e, _) = engine_at(two_lesson_schedule(), mon(8, 0));
        e.remap_weekday(Weekday::Mon, Weekday::Sun);
        assert_eq!(e.poll_all(), vec![Reload]);
        assert!(e.today().is_empty());

        e.clear_weekday_remap(Weekday::Mon);
        assert_eq!(e.poll_all(), vec![Reload]);
        assert_eq!(e.weekday(), Weekday::Mon);
        assert_eq!(e.today().len(), 2);
    }

    #[test]
    fn explicit_reload_does_not_consume_a_pending_remap() {
        let (mut e, _) = engine_at(two_lesson_schedule(), mon(8, 0));
        e.remap_weekday(Weekday::Mon, Weekday::Tue);
        e.reload();
        assert_eq!(e.weekday(), Weekday::Mon);
        assert_eq!(e.poll_all(), vec![Reload]);
        assert_eq!(e.weekday(), Weekday::Tue);
    }

    // ── Empty days ────────────────────────────────────────────────────────────

    #[test]
    fn empty_day_idles_after_school_without_events() {
        let sunday = mon(9, 0) - Duration::days(1);
        let (mut e, clock) = engine_at(two_lesson_schedule(), sunday);

        assert_eq!(e.weekday(), Weekday::Sun);
        assert!(e.today().is_empty());
        assert_eq!(e.lesson_state(), LessonState::AfterSchool);
        assert_eq!(e.current_index(), 0);
        assert!(e.poll_all().is_empty());
        clock.advance(Duration::hours(5));
        assert!(e.poll_all().is_empty());
        assert_eq!(e.progress(), Progress::Idle);

        assert!(e.advance_on().is_err());
        assert_eq!(e.hide_temporarily(), Err(EngineError::NoLessonToResume));
    }

    // ── Hide temporarily ──────────────────────────────────────────────────────

    #[test]
    fn hide_is_clamped_to_the_next_preparation_bell() {
        // finish 10:45, next prepare 10:48, hide 5 min, now 10:46 → delay 3 min
        let mut s = Schedule::new(
            periods(&["10:00-10:45", "10:58-11:40"]),
            Duration::minutes(10),
            Duration::minutes(5),
        );
        let tokens = s.parse_tokens(&["Math", "English"]);
        s.set_day(Weekday::Mon, tokens).unwrap();
        let (mut e, clock) = engine_at(s, mon(10, 46));
        e.poll_all();
        assert_eq!(e.lesson_state(), LessonState::Break);
        assert_eq!(e.today()[1].prepare, mon(10, 48));

        assert_eq!(e.hide_temporarily(), Ok(ClassBegin { index: 0 }));
        assert_eq!(e.lesson_state(), LessonState::AtClass);
        assert_eq!(e.current_index(), 0);
        assert_eq!(e.today()[0].delay, Duration::minutes(3));

        clock.set(mon(10, 47));
        assert!(e.poll_all().is_empty());
        clock.set(mon(10, 48));
        assert_eq!(e.poll_all(), vec![ClassFinish, ClassPrepare { index: 1 }]);
    }

    #[test]
    fn hide_after_school_is_not_clamped() {
        let (mut e, clock) = engine_at(two_lesson_schedule(), mon(11, 0));
        e.poll_all();
        assert_eq!(e.lesson_state(), LessonState::AfterSchool);

        assert_eq!(e.hide_temporarily(), Ok(ClassBegin { index: 1 }));
        // 11:00 + 5 min − 10:45
        assert_eq!(e.today()[1].delay, Duration::minutes(20));

        clock.set(mon(11, 5));
        assert_eq!(e.poll_all(), vec![ClassFinish]);
        assert_eq!(e.lesson_state(), LessonState::AfterSchool);
    }

    #[test]
    fn hide_is_rejected_during_a_lesson() {
        let (mut e, _) = engine_at(two_lesson_schedule(), mon(9, 10));
        e.poll_all();

        let err = e.hide_temporarily().unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidState {
                action: "hide temporarily",
                state: LessonState::AtClass
            }
        );
        assert_eq!(e.lesson_state(), LessonState::AtClass);
        assert_eq!(e.today()[0].delay, Duration::zero());
    }

    // ── Advance on / off ──────────────────────────────────────────────────────

    #[test]
    fn advance_on_starts_the_next_lesson_during_a_break() {
        let (mut e, clock) = engine_at(two_lesson_schedule(), mon(9, 46));
        e.poll_all();
        assert_eq!(e.lesson_state(), LessonState::Break);

        assert_eq!(e.advance_on(), Ok(ClassBegin { index: 1 }));
        assert_eq!(e.lesson_state(), LessonState::AtClass);

        clock.set(mon(9, 55));
        assert!(e.poll_all().is_empty(), "no second prepare/begin");
        clock.set(mon(10, 45));
        assert_eq!(e.poll_all(), vec![ClassFinish]);
        assert_eq!(e.lesson_state(), LessonState::AfterSchool);
    }

    #[test]
    fn advance_on_before_school_starts_the_first_lesson() {
        let (mut e, _) = engine_at(two_lesson_schedule(), mon(7, 0));
        assert_eq!(e.advance_on(), Ok(ClassBegin { index: 0 }));
        assert_eq!(e.current_index(), 0);
    }

    #[test]
    fn advance_on_is_rejected_in_class_and_after_school() {
        let (mut e, clock) = engine_at(two_lesson_schedule(), mon(9, 10));
        e.poll_all();
        assert!(matches!(
            e.advance_on(),
            Err(EngineError::InvalidState { state: LessonState::AtClass, .. })
        ));

        clock.set(mon(12, 0));
        e.poll_all();
        assert!(matches!(
            e.advance_on(),
            Err(EngineError::InvalidState { state: LessonState::AfterSchool, .. })
        ));
    }

    #[test]
    fn advance_off_ends_the_lesson_like_the_clock_would() {
        let (mut e, _) = engine_at(two_lesson_schedule(), mon(9, 10));
        e.poll_all();

        assert_eq!(e.advance_off(), Ok(ClassFinish));
        assert_eq!(e.lesson_state(), LessonState::Break);
        assert_eq!(e.current_index(), 1);
        assert!(e.poll_all().is_empty());

        assert!(e.advance_off().is_err(), "only valid at class");
    }

    // ── Schedule edits & commands ─────────────────────────────────────────────

    #[test]
    fn replacing_tokens_rederives_and_restarts_the_day() {
        let (mut e, _) = engine_at(two_lesson_schedule(), mon(9, 10));
        e.poll_all();

        assert_eq!(e.replace_today_tokens(&["~", "Lab"]), Ok(Reload));
        assert_eq!(e.lesson_state(), LessonState::BeforeSchool);
        assert_eq!(e.today().len(), 1);
        assert_eq!(e.today()[0].start, mon(9, 0));
        assert_eq!(e.today()[0].finish, mon(10, 45));

        assert_eq!(
            e.poll_all(),
            vec![ClassPrepare { index: 0 }, ClassBegin { index: 0 }]
        );
    }

    #[test]
    fn invalid_edit_leaves_the_day_untouched() {
        let (mut e, _) = engine_at(two_lesson_schedule(), mon(8, 0));

        let err = e.replace_today_tokens(&["A", "B", "C"]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Schedule(ConfigError::TooManySlots { slots: 3, periods: 2, .. })
        ));
        assert_eq!(e.today().len(), 2);
        assert_eq!(e.today()[0].name, "Math");
    }

    #[test]
    fn apply_dispatches_commands() {
        let (mut e, _) = engine_at(two_lesson_schedule(), mon(8, 0));

        assert_eq!(
            e.apply(Command::RemapWeekday {
                calendar: Weekday::Mon,
                target: Weekday::Tue
            }),
            Ok(None)
        );
        assert_eq!(e.apply(Command::AdvanceOn), Ok(Some(ClassBegin { index: 0 })));
        assert_eq!(
            e.apply(Command::SetDelay(Duration::minutes(1))),
            Ok(None)
        );
        assert_eq!(e.apply(Command::AdvanceOff), Ok(Some(ClassFinish)));
        assert!(e.apply(Command::AdvanceOff).is_err());
        assert_eq!(e.apply(Command::Reload), Ok(Some(Reload)));
        assert_eq!(
            e.apply(Command::ReplaceTodayTokens(vec!["Art".into()])),
            Ok(Some(Reload))
        );
    }

    // ── Progress ──────────────────────────────────────────────────────────────

    #[test]
    fn progress_follows_the_state() {
        let (mut e, clock) = engine_at(two_lesson_schedule(), mon(8, 0));
        assert_eq!(
            e.progress(),
            Progress::Countdown {
                remaining: Duration::minutes(50),
                total: None
            }
        );

        clock.set(mon(8, 55));
        e.poll_all();
        let preparing = e.progress();
        assert_eq!(
            preparing,
            Progress::Countdown {
                remaining: Duration::minutes(5),
                total: Some(Duration::minutes(10))
            }
        );
        assert_eq!(preparing.fraction_elapsed(), Some(0.5));

        clock.set(mon(9, 47));
        e.poll_all();
        assert_eq!(
            e.progress(),
            Progress::Countdown {
                remaining: Duration::minutes(3),
                total: Some(Duration::minutes(5))
            }
        );

        clock.set(mon(11, 0));
        e.poll_all();
        assert_eq!(e.progress(), Progress::Elapsed(Duration::minutes(15)));
    }

    #[test]
    fn self_study_is_reported_for_the_current_lesson() {
        let (mut e, clock) = engine_at(two_lesson_schedule(), mon(9, 10));
        e.poll_all();
        assert!(!e.current_is_self_study());

        clock.set(mon(10, 10));
        e.poll_all();
        assert!(e.current_is_self_study());
    }
}
