//! Time utilities for dutyguard
//!
//! All duty arithmetic is flat minute-of-day arithmetic on a 24-hour clock.
//! A duty that releases "before" it reported is assumed to have crossed
//! midnight exactly once; no duty is ever longer than 24 hours.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `DUTYGUARD_MOCK_TIME` environment variable can be set
//! to override the system time for all time-sensitive operations. This is useful
//! for exercising the live FDP countdown and rolling windows.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 14:30:00`)

use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::DutyError;

/// Minutes in one day
pub const MINUTES_PER_DAY: u32 = 1440;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "DUTYGUARD_MOCK_TIME";

/// Cached mock time offset from the real time when the process started.
/// This allows mock time to advance naturally.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // This is the internal implementation that wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match NaiveDateTime::parse_from_str(&mock_time_str, "%Y-%m-%d %H:%M:%S") {
                    Ok(naive_dt) => match Local.from_local_datetime(&naive_dt).single() {
                        Some(mock_dt) => {
                            let offset = mock_dt.signed_duration_since(chrono::Local::now());
                            tracing::info!(
                                mock_time = %mock_time_str,
                                offset_secs = offset.num_seconds(),
                                "Mock time enabled"
                            );
                            return Some(offset);
                        }
                        None => tracing::warn!(
                            mock_time = %mock_time_str,
                            "Failed to convert mock time to local timezone"
                        ),
                    },
                    Err(_) => tracing::warn!(
                        mock_time = %mock_time_str,
                        expected_format = "%Y-%m-%d %H:%M:%S",
                        "Invalid mock time format"
                    ),
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // This is the wrapper that provides mock time support
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Format a DateTime with full date and time.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// A local time of day with minute resolution (`HH:MM`, 24-hour clock)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay { hour: 0, minute: 0 };

    /// Constructor for constant tables; out-of-range values fail to compile.
    pub const fn hm(hour: u8, minute: u8) -> Self {
        assert!(hour < 24 && minute < 60);
        Self { hour, minute }
    }

    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    /// Parse an `HH:MM` string. Returns `None` for anything else.
    pub fn parse(text: &str) -> Option<Self> {
        let (hour, minute) = text.split_once(':')?;

        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return None;
        }
        if !hour.bytes().chain(minute.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }

        Self::new(hour.parse().ok()?, minute.parse().ok()?)
    }

    /// Build from any minute count, normalizing into `[0, 1440)`.
    pub fn from_minutes_wrapping(minutes: i64) -> Self {
        let normalized = minutes.rem_euclid(MINUTES_PER_DAY as i64) as u32;
        Self {
            hour: (normalized / 60) as u8,
            minute: (normalized % 60) as u8,
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Minutes since midnight
    pub fn as_minutes(&self) -> u32 {
        (self.hour as u32) * 60 + self.minute as u32
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour as u32, self.minute as u32, 0).unwrap_or_default()
    }

    pub fn from_naive_time(time: NaiveTime) -> Self {
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = DutyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            DutyError::invalid(format!("Invalid time '{}': expected HH:MM (00:00-23:59)", s))
        })
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = DutyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// Parse an `HH:MM` string into minutes since midnight.
///
/// Returns `None` when the format is wrong or hour/minute are out of range.
pub fn time_of_day_to_minutes(text: &str) -> Option<u32> {
    TimeOfDay::parse(text).map(|t| t.as_minutes())
}

/// Format any minute count as `HH:MM`, wrapping negative and next-day values.
///
/// Use [`day_offset`] when a "+1" indicator is needed.
pub fn minutes_to_time_of_day(minutes: i64) -> String {
    TimeOfDay::from_minutes_wrapping(minutes).to_string()
}

/// Whole days contained in a minute count (floor division).
pub fn day_offset(minutes: i64) -> i64 {
    minutes.div_euclid(MINUTES_PER_DAY as i64)
}

/// Human-readable duration: `"8h"`, `"45m"`, `"12h 05m"`.
pub fn format_duration(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;

    if hours == 0 {
        format!("{}m", mins)
    } else if mins == 0 {
        format!("{}h", hours)
    } else {
        format!("{}h {:02}m", hours, mins)
    }
}

/// Duty length from report to release, wrapping past midnight.
pub fn duty_minutes(report: TimeOfDay, release: TimeOfDay) -> u32 {
    let diff = release.as_minutes() as i64 - report.as_minutes() as i64;
    if diff < 0 {
        (diff + MINUTES_PER_DAY as i64) as u32
    } else {
        diff as u32
    }
}

/// A half-open window `[start, end)` on a 24-hour clock
///
/// Windows whose end is at or before their start cross midnight
/// (e.g. 22:00 - 06:00).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl ClockWindow {
    pub const fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    pub fn crosses_midnight(&self) -> bool {
        self.end <= self.start
    }

    pub fn length_minutes(&self) -> u32 {
        duty_minutes(self.start, self.end)
    }

    /// Check if the given time of day falls within this window
    pub fn contains(&self, time: TimeOfDay) -> bool {
        if self.crosses_midnight() {
            time >= self.start || time < self.end
        } else {
            time >= self.start && time < self.end
        }
    }

    /// Whether the circular interval `[start_minute, start_minute + duration)`
    /// intersects this window.
    pub fn overlaps(&self, start_minute: u32, duration_minutes: u32) -> bool {
        if duration_minutes == 0 {
            return false;
        }
        if duration_minutes >= MINUTES_PER_DAY {
            return true;
        }

        let from = start_minute % MINUTES_PER_DAY;
        let to = from + duration_minutes;

        let start = self.start.as_minutes();
        let end = self.end.as_minutes();
        let segments: &[(u32, u32)] = if self.crosses_midnight() {
            &[(start, MINUTES_PER_DAY), (0, end)]
        } else {
            &[(start, end)]
        };

        // The interval may run into the following day, so test each segment
        // today and tomorrow.
        segments.iter().any(|&(seg_start, seg_end)| {
            [0, MINUTES_PER_DAY].iter().any(|&shift| {
                seg_start + shift < to && from < seg_end + shift
            })
        })
    }
}
