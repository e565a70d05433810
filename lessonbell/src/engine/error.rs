/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error type for manual engine mutations.
//!
//! Polling never fails; only the mutation entry points of
//! [`ScheduleEngine`](super::ScheduleEngine) can be rejected.  A rejected
//! mutation leaves every engine field exactly as it was, so the caller may
//! log the error and carry on polling.
//!
//! | Variant | Typical cause |
//! |---|---|
//! | `InvalidState` | "hide" pressed during a lesson, "advance off" during a break |
//! | `NoLessonToResume` | "hide" before any lesson of the day has finished |
//! | `NoCurrentLesson` | "advance on" on a day without lessons |
//! | `Schedule` | schedule edit needing more periods than the timetable has |

use thiserror::Error;

use super::LessonState;
use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The mutation is not allowed in the current lesson-state.
    #[error("cannot {action} while {state:?}")]
    InvalidState {
        action: &'static str,
        state: LessonState,
    },

    /// "Hide temporarily" needs a finished lesson to re-open.
    #[error("no finished lesson to resume")]
    NoLessonToResume,

    /// The current index does not point at a lesson of today.
    #[error("no lesson at index {index} (today has {count} lesson(s))")]
    NoCurrentLesson { index: usize, count: usize },

    /// A schedule edit was rejected by timetable validation.
    #[error(transparent)]
    Schedule(#[from] ConfigError),
}
