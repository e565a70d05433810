/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Timetable period parsing: `"HH:MM-HH:MM"` → time-of-day offsets.
//!
//! Offsets are kept as [`Duration`]s since midnight rather than
//! `NaiveTime`s so they can be added straight onto "today at 00:00" when a
//! [`Lesson`](crate::lesson::Lesson) is built.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;

use crate::config::ConfigError;

/// Separator between the start and the end of a period string.
pub const PERIOD_SEP: char = '-';

/// One timetable slot: start and end as offsets from midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: Duration,
    pub finish: Duration,
}

impl Period {
    /// Parse `"10:05-10:40"` into `Period { start: 10h05m, finish: 10h40m }`.
    ///
    /// # Errors
    /// * [`ConfigError::MalformedPeriod`] – wrong separator, missing `:` or a
    ///   non-integer hour/minute.
    /// * [`ConfigError::PeriodOutOfRange`] – hour above 23 or minute above 59.
    /// * [`ConfigError::PeriodEndsBeforeStart`] – end earlier than start.
    pub fn parse(period: &str) -> Result<Self, ConfigError> {
        let (begin, end) = period
            .split_once(PERIOD_SEP)
            .ok_or_else(|| malformed(period, "expected '-' between start and end"))?;

        let start = parse_time_of_day(period, begin)?;
        let finish = parse_time_of_day(period, end)?;

        if finish < start {
            return Err(ConfigError::PeriodEndsBeforeStart {
                period: period.to_string(),
            });
        }
        Ok(Self { start, finish })
    }

    /// Length of the slot.
    pub fn length(&self) -> Duration {
        self.finish - self.start
    }
}

impl FromStr for Period {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sh, sm) = hours_minutes(self.start);
        let (fh, fm) = hours_minutes(self.finish);
        write!(f, "{sh:02}:{sm:02}{PERIOD_SEP}{fh:02}:{fm:02}")
    }
}

fn malformed(period: &str, reason: &'static str) -> ConfigError {
    ConfigError::MalformedPeriod {
        period: period.to_string(),
        reason,
    }
}

/// `"08:05"` → 8h05m.  `whole` is only used for error messages.
fn parse_time_of_day(whole: &str, part: &str) -> Result<Duration, ConfigError> {
    let (hour, minute) = part
        .trim()
        .split_once(':')
        .ok_or_else(|| malformed(whole, "expected ':' between hour and minute"))?;

    let hour: i64 = hour
        .trim()
        .parse()
        .map_err(|_| malformed(whole, "hour is not an integer"))?;
    let minute: i64 = minute
        .trim()
        .parse()
        .map_err(|_| malformed(whole, "minute is not an integer"))?;

    if !(0..24).contains(&hour) || !(0..60).contains(&minute) {
        return Err(ConfigError::PeriodOutOfRange {
            period: whole.to_string(),
        });
    }
    Ok(Duration::hours(hour) + Duration::minutes(minute))
}

fn hours_minutes(offset: Duration) -> (i64, i64) {
    let minutes = offset.num_minutes();
    (minutes / 60, minutes % 60)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
