/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Fixed-interval pacing for the polling loop.
//!
//! The next deadline is always "previous return + interval".  Work that
//! overruns the interval makes the next wait return immediately; missed
//! ticks are never replayed.
//!
//! The async path is a `tokio::time::Interval` with
//! [`MissedTickBehavior::Delay`], created on the first [`Ticker::tick`] so
//! that a ticker can be built and used for blocking waits outside a runtime.

use std::time::{Duration, Instant};

use tokio::time::{Interval, MissedTickBehavior};

/// Keeps a stable polling cadence despite variable work per cycle.
#[derive(Debug)]
pub struct Ticker {
    interval: Duration,
    last: Instant,
    async_interval: Option<Interval>,
}

impl Ticker {
    /// The first deadline is `interval` from now.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::now(),
            async_interval: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// How long a wait starting at `now` would sleep.
    pub fn remaining(&self, now: Instant) -> Duration {
        (self.last + self.interval).saturating_duration_since(now)
    }

    /// Block the calling thread until the next deadline.
    pub fn wait(&mut self) {
        let delay = self.remaining(Instant::now());
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        self.last = Instant::now();
    }

    /// Async counterpart of [`wait`](Self::wait) for the tokio driver loop.
    ///
    /// Cancel safe: a tick dropped inside `tokio::select!` is not lost.
    ///
    /// # Panics
    /// If the interval is zero, like `tokio::time::interval_at`.
    pub async fn tick(&mut self) {
        let (last, period) = (self.last, self.interval);
        let interval = self.async_interval.get_or_insert_with(|| {
            let start = tokio::time::Instant::from_std(last + period);
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        interval.tick().await;
        self.last = Instant::now();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
