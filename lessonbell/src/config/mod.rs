//! Timetable configuration loading.
//!
//! The expected YAML structure is:
//! ```yaml
//! schedule:
//!   1: [Chinese, Math, "|", English, "~", Physics]
//!   2: [Math, "", Art]
//!   3: []
//!   4: [Study, Study]
//!   5: [Math]
//!   6: []
//!   7: []
//! periods:
//!   - "08:00-08:45"
//!   - "08:55-09:40"
//!   - "10:00-10:45"
//!   - "10:55-11:40"
//! preparation_minutes: 2
//! temporary_hide_minutes: 5
//! separator: "|"
//! self_study: [Study]
//! inspect_frequency: 2.0
//! ```
//!
//! Schedule keys are ISO weekday numbers (1 = Monday) and all seven must be
//! present.  An unquoted `~` is YAML null; it is accepted and read as the
//! continuation token, exactly like the quoted `"~"`.

mod error;

pub use error::ConfigError;

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::Duration;
use serde::Deserialize;
use tracing::{debug, info};

use crate::lesson::CONTINUATION;
use crate::schedule::{weekday_from_number, Period, Schedule, DEFAULT_SEPARATOR};

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the YAML file layout.
///
/// This is kept private – callers work with [`ScheduleConfig`] instead.
#[derive(Debug, Deserialize)]
struct ScheduleConfigFile {
    schedule: BTreeMap<u8, Vec<Option<String>>>,
    periods: Vec<String>,
    preparation_minutes: f64,
    #[serde(default = "default_temporary_hide_minutes")]
    temporary_hide_minutes: f64,
    #[serde(default = "default_separator")]
    separator: String,
    #[serde(default)]
    self_study: Vec<String>,
    /// Polls per second.
    #[serde(default = "default_inspect_frequency")]
    inspect_frequency: f64,
}

fn default_temporary_hide_minutes() -> f64 {
    5.0
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

fn default_inspect_frequency() -> f64 {
    1.0
}

// ── Public data structures ────────────────────────────────────────────────────

/// Everything the driver needs: the validated schedule and the poll cadence.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub schedule: Schedule,
    /// `1 / inspect_frequency`.
    pub poll_interval: StdDuration,
}

impl ScheduleConfig {
    /// Parses `path` into a validated configuration.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, if the YAML is
    /// structurally invalid, or if any value fails [`ConfigError`]
    /// validation.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading timetable configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid configuration file: {}", path.display()))
    }

    /// Parses and validates configuration from a YAML string.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: ScheduleConfigFile =
            serde_yaml::from_str(content).context("Failed to parse YAML")?;
        Ok(Self::from_file(file)?)
    }

    fn from_file(file: ScheduleConfigFile) -> Result<Self, ConfigError> {
        if file.separator.is_empty() {
            return Err(ConfigError::EmptySeparator);
        }
        if file.separator == CONTINUATION {
            return Err(ConfigError::SeparatorIsContinuation);
        }
        let poll_interval = poll_interval(file.inspect_frequency)?;

        let periods = file
            .periods
            .iter()
            .map(|p| Period::parse(p))
            .collect::<Result<Vec<_>, _>>()?;
        check_ascending(&periods)?;
        let preparation = minutes("preparation_minutes", file.preparation_minutes)?;
        let temporary_hide = minutes("temporary_hide_minutes", file.temporary_hide_minutes)?;

        let mut schedule = Schedule::new(periods, preparation, temporary_hide)
            .with_separator(file.separator)
            .with_self_study(file.self_study);

        if let Some(&key) = file.schedule.keys().find(|&&k| weekday_from_number(k).is_none()) {
            return Err(ConfigError::UnknownWeekday(key));
        }
        for n in 1..=7u8 {
            let raw = file.schedule.get(&n).ok_or(ConfigError::MissingWeekday(n))?;
            let weekday = weekday_from_number(n).ok_or(ConfigError::UnknownWeekday(n))?;
            let raw: Vec<&str> = raw
                .iter()
                .map(|t| t.as_deref().unwrap_or(CONTINUATION))
                .collect();
            let tokens = schedule.parse_tokens(&raw);
            schedule.set_day(weekday, tokens)?;
            debug!("  {}: {}", weekday, schedule.describe_day(weekday));
        }

        let config = Self {
            poll_interval,
            schedule,
        };

        info!(
            periods = config.schedule.periods().len(),
            preparation_secs = config.schedule.preparation().num_seconds(),
            temporary_hide_secs = config.schedule.temporary_hide().num_seconds(),
            poll_interval_ms = config.poll_interval.as_millis() as u64,
            "Successfully loaded timetable configuration"
        );
        Ok(config)
    }
}

/// Upper bound for every minute setting: one day.
const MAX_MINUTES: f64 = 24.0 * 60.0;

/// Fractional minutes → `Duration`, rejecting negative, non-finite and
/// longer-than-a-day values.
fn minutes(field: &'static str, value: f64) -> Result<Duration, ConfigError> {
    if !value.is_finite() || !(0.0..=MAX_MINUTES).contains(&value) {
        return Err(ConfigError::InvalidMinutes { field, value });
    }
    Ok(Duration::milliseconds((value * 60_000.0).round() as i64))
}

/// Polls per second → poll interval.  The interval must be representable
/// and non-zero.
fn poll_interval(frequency: f64) -> Result<StdDuration, ConfigError> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return Err(ConfigError::InvalidFrequency(frequency));
    }
    StdDuration::try_from_secs_f64(1.0 / frequency)
        .ok()
        .filter(|interval| !interval.is_zero())
        .ok_or(ConfigError::InvalidFrequency(frequency))
}

/// Periods must be listed in time order without overlapping.
fn check_ascending(periods: &[Period]) -> Result<(), ConfigError> {
    for pair in periods.windows(2) {
        let (previous, period) = (&pair[0], &pair[1]);
        if period.start < previous.finish {
            return Err(ConfigError::PeriodOverlapsPrevious {
                period: period.to_string(),
                previous: previous.to_string(),
            });
        }
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
