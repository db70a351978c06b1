//! Read-only snapshot structures for a presentation layer.
//!
//! Nothing here knows how it will be rendered. The engine builds a
//! [`CalendarSnapshot`] on demand; the presentation layer (typically a
//! `TypeScript` UI, hence the `ts-rs` bindings) only ever reads it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::ClockStatus;
use crate::ids::CalendarId;

/// Everything a calendar view needs, captured at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CalendarSnapshot {
    /// The calendar the snapshot was taken from.
    pub calendar_id: CalendarId,
    /// Human-readable calendar name.
    pub calendar_name: String,
    /// The authoritative date.
    pub current: DateDisplay,
    /// The focused date, if a day is selected.
    pub selected: Option<DateDisplay>,
    /// The month currently being browsed.
    pub visible: MonthView,
    /// Authoritative time of day, `HH:MM:SS`.
    pub time: String,
    /// Season of the current date.
    pub season: SeasonInfo,
    /// Phase of every moon on the current date.
    pub moons: Vec<MoonInfo>,
    /// Real-time clock state.
    pub clock_status: ClockStatus,
}

/// Display strings for one cursor's date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DateDisplay {
    /// Year number.
    pub year: i64,
    /// Year with prefix, postfix and name applied.
    pub year_display: String,
    /// Month name.
    pub month_name: String,
    /// Day of the month, starting at 1.
    pub day: u32,
    /// Weekday name, empty when the calendar has no weekdays.
    pub weekday_name: String,
    /// Full formatted date, e.g. `Hammer 3, 1492 DR`.
    pub text: String,
}

/// A month laid out as a grid of weeks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MonthView {
    /// Year number of the month shown.
    pub year: i64,
    /// Year with prefix, postfix and name applied.
    pub year_display: String,
    /// Month name.
    pub month_name: String,
    /// Month ordinal.
    pub month_ordinal: u32,
    /// Whether the month is intercalary.
    pub intercalary: bool,
    /// Weekday names in cycle order, one per grid column.
    pub weekday_headings: Vec<String>,
    /// Rows of `weekday_headings.len()` cells (at least one column).
    /// `None` marks a padding cell with no day.
    pub weeks: Vec<Vec<Option<DayCell>>>,
}

/// One day inside a [`MonthView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DayCell {
    /// Day of the month, starting at 1.
    pub number: u32,
    /// Whether this is the current day.
    pub current: bool,
    /// Whether this is the selected day.
    pub selected: bool,
    /// Moon phases on this day.
    pub moons: Vec<MoonInfo>,
}

/// Resolved season for a date. Empty strings when no seasons are defined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SeasonInfo {
    /// Season name.
    pub name: String,
    /// Display colour, with custom colours already resolved.
    pub color: String,
}

/// Resolved phase of one moon for a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MoonInfo {
    /// Moon name.
    pub moon: String,
    /// Phase name.
    pub phase: String,
    /// Phase icon key.
    pub icon: String,
    /// Moon display colour.
    pub color: String,
}
