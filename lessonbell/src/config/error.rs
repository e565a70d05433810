/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error type for timetable configuration.
//!
//! Every variant is fatal at load time: the engine refuses to start from a
//! partially valid timetable.  The same type is reused when a schedule edit
//! arrives at runtime, so an edit is validated by exactly the rules that
//! applied to the file.

use chrono::Weekday;
use thiserror::Error;

/// A configuration value that cannot be turned into a usable [`Schedule`].
///
/// [`Schedule`]: crate::schedule::Schedule
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A period string does not have the `HH:MM-HH:MM` shape.
    #[error("malformed period '{period}': {reason}")]
    MalformedPeriod {
        period: String,
        reason: &'static str,
    },

    /// Hour above 23 or minute above 59.
    #[error("period '{period}' has a time of day out of range")]
    PeriodOutOfRange { period: String },

    /// The end of a period lies before its start.
    #[error("period '{period}' ends before it starts")]
    PeriodEndsBeforeStart { period: String },

    /// A period starts before the previous one has finished.
    #[error("period '{period}' starts before the previous period '{previous}' finishes")]
    PeriodOverlapsPrevious { period: String, previous: String },

    /// One of the seven weekday keys is absent from `schedule`.
    #[error("schedule has no entry for weekday {0} (expected keys 1..=7)")]
    MissingWeekday(u8),

    /// A `schedule` key outside `1..=7`.
    #[error("schedule key {0} is not a weekday (expected 1..=7)")]
    UnknownWeekday(u8),

    /// A day uses more timetable slots than there are periods.
    #[error("{weekday} needs {slots} timetable slot(s) but only {periods} period(s) are defined")]
    TooManySlots {
        weekday: Weekday,
        slots: usize,
        periods: usize,
    },

    /// A minute count is negative, NaN, infinite or longer than a day.
    #[error("'{field}' must be between 0 and 1440 minutes, got {value}")]
    InvalidMinutes { field: &'static str, value: f64 },

    /// Polling frequency must be positive, finite and give a representable
    /// non-zero poll interval.
    #[error("'inspect_frequency' must be a positive number of polls per second, got {0}")]
    InvalidFrequency(f64),

    /// The separator token may not be empty (it would collide with blanks).
    #[error("separator token must not be empty")]
    EmptySeparator,

    /// The separator may not be the continuation token `~`.
    #[error("separator token must not be the continuation token '~'")]
    SeparatorIsContinuation,
}
