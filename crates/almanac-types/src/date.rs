//! Structured date/time values and the persisted authoritative record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::CalendarId;

/// A fully resolved calendar date and time of day.
///
/// `month` is the month's configured ordinal (not its position) and `day`
/// is 1-based. Hour, minute and second are bounded by the calendar's time
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CalendarDateTime {
    /// Year number; may be zero or negative.
    pub year: i64,
    /// Month ordinal.
    pub month: u32,
    /// Day of the month, starting at 1.
    pub day: u32,
    /// Hour of the day.
    pub hour: u32,
    /// Minute of the hour.
    pub minute: u32,
    /// Second of the minute.
    pub second: u32,
}

impl CalendarDateTime {
    /// A date at midnight.
    pub const fn date(year: i64, month: u32, day: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }

    /// The same date with the given time of day.
    pub const fn at(self, hour: u32, minute: u32, second: u32) -> Self {
        Self {
            hour,
            minute,
            second,
            ..self
        }
    }
}

/// The authoritative date handed to persistence by the primary process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SavedDate {
    /// The calendar this date belongs to.
    pub calendar_id: CalendarId,
    /// The current date and time of day.
    pub date: CalendarDateTime,
    /// The same instant as a linear count of seconds.
    pub world_seconds: i64,
    /// Wall-clock time the record was produced.
    pub saved_at: DateTime<Utc>,
}
