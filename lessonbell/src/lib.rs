/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Lessonbell – class-schedule state machine
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── config/         – YAML timetable loading and validation
//! ├── schedule/       – weekly tokens, periods, derivation of today's lessons
//! ├── lesson.rs       – Token and Lesson value types
//! ├── engine/         – lesson-state machine, clock sources, mutation errors
//! ├── event.rs        – ScheduleEvent (out) and Command (in)
//! └── ticker.rs       – fixed-interval pacing of the polling loop
//! ```

pub mod config;
pub mod engine;
pub mod event;
pub mod lesson;
pub mod schedule;
pub mod ticker;
