//! Calendar shape and day counting.
//!
//! A [`Calendar`] is the immutable description of a calendar: its months
//! (with normal and leap-year lengths and intercalary flags), its weekday
//! cycle, its leap-year rule, seasons, moons and clock units. All date
//! arithmetic goes through a single currency, the *linear day*: a 1-based
//! count of days since the first day of year 0.
//!
//! # Intercalary months
//!
//! A month flagged `intercalary` is left out of day totals and the weekday
//! cycle unless `intercalary_include` is also set. Every counting method
//! takes an `ignore_intercalary_rules` flag; when set, every month counts.
//! Clock conversions ([`Calendar::date_to_seconds`] and
//! [`Calendar::seconds_to_date`]) always ignore the rules, since time keeps
//! passing on intercalary days.
//!
//! # Year zero
//!
//! [`LeapYearRule::leap_years_before`] leaves year 0 out of its count. The
//! `add_leap_diff` flag of [`Calendar::date_to_linear_day`] adds that leap
//! day back (when year 0 is a leap year), which makes the linear day an
//! exact count. Any two linear days that are subtracted to get a duration
//! must use the same flag.

use std::sync::Arc;

use almanac_types::{CalendarDateTime, CalendarId};
use tracing::debug;

use crate::leap::{self, LeapRule, LeapRuleError, LeapYearRule};
use crate::moon::{Moon, MoonError};
use crate::season::Season;
use crate::time::TimeUnits;

/// Errors raised while assembling a calendar.
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    /// The calendar has no months.
    #[error("a calendar needs at least one month")]
    NoMonths,

    /// A month definition is unusable.
    #[error("invalid month {ordinal}: {reason}")]
    InvalidMonth {
        /// Ordinal of the offending month.
        ordinal: u32,
        /// Explanation of what is wrong.
        reason: String,
    },

    /// A year would contain no days, which makes day counting diverge.
    #[error("a {kind} year has no days when {counting}")]
    EmptyYear {
        /// `"normal"` or `"leap"`.
        kind: &'static str,
        /// Which intercalary counting produced the empty year.
        counting: &'static str,
    },

    /// The first weekday offset is outside the weekday cycle.
    #[error("first weekday {index} is out of range for {count} weekdays")]
    FirstWeekday {
        /// Configured offset.
        index: usize,
        /// Number of weekdays.
        count: usize,
    },

    /// The leap-year rule is inconsistent.
    #[error("leap-year rule: {source}")]
    LeapRule {
        /// The underlying rule error.
        #[from]
        source: LeapRuleError,
    },

    /// A date does not exist in this calendar.
    #[error("invalid date {year}-{month}-{day}: {reason}")]
    InvalidDate {
        /// Requested year.
        year: i64,
        /// Requested month ordinal.
        month: u32,
        /// Requested day of the month.
        day: u32,
        /// Explanation of what is wrong.
        reason: String,
    },

    /// A moon definition is unusable.
    #[error("moon {name}: {source}")]
    Moon {
        /// Name of the offending moon.
        name: String,
        /// The underlying moon error.
        source: MoonError,
    },
}

/// One month of the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Month {
    /// Display name.
    pub name: String,
    /// Short display name.
    pub abbreviation: String,
    /// 1-based ordinal, strictly increasing through the calendar.
    pub ordinal: u32,
    /// Length in normal years.
    pub days: u32,
    /// Length in leap years.
    pub leap_days: u32,
    /// Excluded from day totals and the weekday cycle...
    pub intercalary: bool,
    /// ...unless this is also set.
    pub intercalary_include: bool,
}

impl Month {
    /// A regular month with the same length in every year.
    pub fn new(name: impl Into<String>, ordinal: u32, days: u32) -> Self {
        let name = name.into();
        let abbreviation = name.chars().take(3).collect();
        Self {
            name,
            abbreviation,
            ordinal,
            days,
            leap_days: days,
            intercalary: false,
            intercalary_include: false,
        }
    }

    /// Set the leap-year length.
    #[must_use]
    pub const fn with_leap_days(mut self, leap_days: u32) -> Self {
        self.leap_days = leap_days;
        self
    }

    /// Mark the month intercalary, optionally still counted.
    #[must_use]
    pub const fn intercalary(mut self, include: bool) -> Self {
        self.intercalary = true;
        self.intercalary_include = include;
        self
    }

    /// Length in a normal or leap year.
    pub const fn day_count(&self, leap: bool) -> u32 {
        if leap { self.leap_days } else { self.days }
    }

    /// Whether the month takes part in day totals.
    pub const fn is_counted(&self, ignore_intercalary_rules: bool) -> bool {
        ignore_intercalary_rules || !self.intercalary || self.intercalary_include
    }
}

/// One entry of the weekday cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Weekday {
    /// Display name.
    pub name: String,
    /// Short display name.
    pub abbreviation: String,
}

impl Weekday {
    /// A weekday whose abbreviation is its first two letters.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let abbreviation = name.chars().take(2).collect();
        Self { name, abbreviation }
    }
}

/// How year names are assigned to years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearNameBehaviour {
    /// Years before the start use the first name, years past the list the last.
    #[default]
    Default,
    /// Names cycle forever in both directions from the start year.
    Repeat,
}

/// Year formatting: prefix, postfix and optional year names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct YearDisplay {
    /// Text before the year number.
    pub prefix: String,
    /// Text after the year number.
    pub postfix: String,
    /// Names assigned to consecutive years.
    pub names: Vec<String>,
    /// Year that receives the first name.
    pub names_start: i64,
    /// How years outside the list are named.
    pub behaviour: YearNameBehaviour,
}

impl YearDisplay {
    /// The name for a year, if any names are configured.
    pub fn name_for(&self, year: i64) -> Option<&str> {
        let count = i64::try_from(self.names.len()).ok().filter(|c| *c > 0)?;
        let offset = year.saturating_sub(self.names_start);
        let index = match self.behaviour {
            YearNameBehaviour::Repeat => offset.rem_euclid(count),
            YearNameBehaviour::Default => offset.clamp(0, count.saturating_sub(1)),
        };
        usize::try_from(index)
            .ok()
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
    }

    /// `prefix + year + postfix`, followed by the year name in parentheses.
    pub fn format(&self, year: i64) -> String {
        let base = format!("{}{year}{}", self.prefix, self.postfix);
        match self.name_for(year) {
            Some(name) if !name.is_empty() => format!("{base} ({name})"),
            _ => base,
        }
    }
}

/// An immutable calendar definition.
#[derive(Debug, Clone)]
pub struct Calendar {
    id: CalendarId,
    name: String,
    months: Vec<Month>,
    weekdays: Vec<Weekday>,
    first_weekday: usize,
    leap_rule: Arc<dyn LeapYearRule>,
    units: TimeUnits,
    seasons: Vec<Season>,
    moons: Vec<Moon>,
    year_display: YearDisplay,
}

impl Calendar {
    /// Assemble a calendar and validate its shape.
    ///
    /// Month ordinals must be strictly increasing and at least 1, and
    /// both normal and leap years must contain at least one day with and
    /// without intercalary rules. The leap rule is checked for
    /// consistency over [`leap::VALIDATION_WINDOW`].
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError`] describing the first problem found.
    pub fn new(
        name: impl Into<String>,
        months: Vec<Month>,
        weekdays: Vec<Weekday>,
        leap_rule: Arc<dyn LeapYearRule>,
        units: TimeUnits,
    ) -> Result<Self, CalendarError> {
        if months.is_empty() {
            return Err(CalendarError::NoMonths);
        }
        let mut previous = 0_u32;
        for month in &months {
            if month.ordinal <= previous {
                return Err(CalendarError::InvalidMonth {
                    ordinal: month.ordinal,
                    reason: format!("ordinal must be greater than {previous}"),
                });
            }
            previous = month.ordinal;
        }
        leap::validate_rule(leap_rule.as_ref(), leap::VALIDATION_WINDOW)?;

        let calendar = Self {
            id: CalendarId::new(),
            name: name.into(),
            months,
            weekdays,
            first_weekday: 0,
            leap_rule,
            units,
            seasons: Vec::new(),
            moons: Vec::new(),
            year_display: YearDisplay::default(),
        };
        for (leap, kind) in [(false, "normal"), (true, "leap")] {
            for (ignore, counting) in [
                (false, "intercalary months are excluded"),
                (true, "every month is counted"),
            ] {
                if calendar.total_days_in_year(leap, ignore) <= 0 {
                    return Err(CalendarError::EmptyYear { kind, counting });
                }
            }
        }
        debug!(
            calendar = %calendar.id,
            months = calendar.months.len(),
            weekdays = calendar.weekdays.len(),
            "calendar assembled"
        );
        Ok(calendar)
    }

    /// A calendar with the built-in [`LeapRule`].
    ///
    /// # Errors
    ///
    /// See [`Calendar::new`].
    pub fn with_rule(
        name: impl Into<String>,
        months: Vec<Month>,
        weekdays: Vec<Weekday>,
        rule: LeapRule,
        units: TimeUnits,
    ) -> Result<Self, CalendarError> {
        Self::new(name, months, weekdays, Arc::new(rule), units)
    }

    /// Set the weekday index of the first day of year 0.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::FirstWeekday`] if the index is outside the
    /// weekday cycle.
    pub fn with_first_weekday(mut self, index: usize) -> Result<Self, CalendarError> {
        let count = self.weekdays.len();
        if index != 0 && index >= count {
            return Err(CalendarError::FirstWeekday { index, count });
        }
        self.first_weekday = index;
        Ok(self)
    }

    /// Attach seasons, in definition order.
    #[must_use]
    pub fn with_seasons(mut self, seasons: Vec<Season>) -> Self {
        self.seasons = seasons;
        self
    }

    /// Attach moons, normalizing each moon's phase lengths.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Moon`] if a moon cannot be normalized.
    pub fn with_moons(mut self, moons: Vec<Moon>) -> Result<Self, CalendarError> {
        let mut normalized = Vec::with_capacity(moons.len());
        for mut moon in moons {
            moon.normalize_phase_lengths()
                .and_then(|()| moon.validate())
                .map_err(|source| CalendarError::Moon {
                    name: moon.name.clone(),
                    source,
                })?;
            normalized.push(moon);
        }
        self.moons = normalized;
        Ok(self)
    }

    /// Set year formatting.
    #[must_use]
    pub fn with_year_display(mut self, year_display: YearDisplay) -> Self {
        self.year_display = year_display;
        self
    }

    /// This calendar's identifier.
    pub const fn id(&self) -> CalendarId {
        self.id
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Months in calendar order.
    pub fn months(&self) -> &[Month] {
        &self.months
    }

    /// The weekday cycle.
    pub fn weekdays(&self) -> &[Weekday] {
        &self.weekdays
    }

    /// Weekday index of the first day of year 0.
    pub const fn first_weekday(&self) -> usize {
        self.first_weekday
    }

    /// The leap-year rule.
    pub fn leap_rule(&self) -> &dyn LeapYearRule {
        self.leap_rule.as_ref()
    }

    /// Clock units.
    pub const fn units(&self) -> &TimeUnits {
        &self.units
    }

    /// Seasons in definition order.
    pub fn seasons(&self) -> &[Season] {
        &self.seasons
    }

    /// Moons with normalized phases.
    pub fn moons(&self) -> &[Moon] {
        &self.moons
    }

    /// Year formatting.
    pub const fn year_display(&self) -> &YearDisplay {
        &self.year_display
    }

    /// Whether `year` is a leap year under this calendar's rule.
    pub fn is_leap_year(&self, year: i64) -> bool {
        self.leap_rule.is_leap_year(year)
    }

    /// Position of the month with `ordinal`.
    pub fn month_index(&self, ordinal: u32) -> Option<usize> {
        self.months.iter().position(|m| m.ordinal == ordinal)
    }

    /// The month with `ordinal`.
    pub fn month_by_ordinal(&self, ordinal: u32) -> Option<&Month> {
        self.months.iter().find(|m| m.ordinal == ordinal)
    }

    /// Length of the month at `index` in `year`; zero for unknown months.
    pub fn days_in_month(&self, index: usize, year: i64) -> u32 {
        self.months
            .get(index)
            .map_or(0, |m| m.day_count(self.is_leap_year(year)))
    }

    /// Check that a date and time of day exist, returning the month and
    /// day positions.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidDate`] for an unknown month, a day
    /// outside the month's length in that year, or a time of day outside
    /// the clock units.
    pub fn resolve_date(&self, date: &CalendarDateTime) -> Result<(usize, usize), CalendarError> {
        let invalid = |reason: String| CalendarError::InvalidDate {
            year: date.year,
            month: date.month,
            day: date.day,
            reason,
        };
        let index = self
            .month_index(date.month)
            .ok_or_else(|| invalid("no month has this ordinal".to_owned()))?;
        let length = self.days_in_month(index, date.year);
        if date.day == 0 || date.day > length {
            return Err(invalid(format!("day must be between 1 and {length}")));
        }
        if !self.units.contains(date.hour, date.minute, date.second) {
            return Err(invalid(format!(
                "time {:02}:{:02}:{:02} is outside the clock units",
                date.hour, date.minute, date.second
            )));
        }
        let day = usize::try_from(date.day.saturating_sub(1))
            .map_err(|e| invalid(format!("day index: {e}")))?;
        Ok((index, day))
    }

    /// Sum of counted month lengths for a normal or leap year.
    pub fn total_days_in_year(&self, leap: bool, ignore_intercalary_rules: bool) -> i64 {
        self.months
            .iter()
            .filter(|m| m.is_counted(ignore_intercalary_rules))
            .map(|m| i64::from(m.day_count(leap)))
            .fold(0_i64, i64::saturating_add)
    }

    /// Length of `year`.
    pub fn year_length(&self, year: i64, ignore_intercalary_rules: bool) -> i64 {
        self.total_days_in_year(self.is_leap_year(year), ignore_intercalary_rules)
    }

    /// Extra days a leap year has over a normal one.
    pub fn leap_day_delta(&self, ignore_intercalary_rules: bool) -> i64 {
        self.total_days_in_year(true, ignore_intercalary_rules)
            .saturating_sub(self.total_days_in_year(false, ignore_intercalary_rules))
    }

    /// The leap day that [`LeapYearRule::leap_years_before`] leaves out
    /// for year 0.
    fn year_zero_leap_days(&self, ignore_intercalary_rules: bool) -> i64 {
        if self.is_leap_year(0) {
            self.leap_day_delta(ignore_intercalary_rules)
        } else {
            0
        }
    }

    /// Days from the first day of year 0 to the first day of `year`
    /// (negative for years before 0).
    pub fn days_before_year(&self, year: i64, ignore_intercalary_rules: bool) -> i64 {
        self.uncompensated_days_before_year(year, ignore_intercalary_rules)
            .saturating_add(self.year_zero_leap_days(ignore_intercalary_rules))
    }

    fn uncompensated_days_before_year(&self, year: i64, ignore_intercalary_rules: bool) -> i64 {
        let normal = self.total_days_in_year(false, ignore_intercalary_rules);
        normal.saturating_mul(year).saturating_add(
            self.leap_rule
                .leap_years_before(year)
                .saturating_mul(self.leap_day_delta(ignore_intercalary_rules)),
        )
    }

    /// Convert a date to its linear day.
    ///
    /// Sums whole years (with the leap-day correction), then the counted
    /// months before `month_ordinal` in that year, then `day` (at least 1).
    pub fn date_to_linear_day(
        &self,
        year: i64,
        month_ordinal: u32,
        day: u32,
        add_leap_diff: bool,
        ignore_intercalary_rules: bool,
    ) -> i64 {
        let mut days = self.uncompensated_days_before_year(year, ignore_intercalary_rules);
        if add_leap_diff {
            days = days.saturating_add(self.year_zero_leap_days(ignore_intercalary_rules));
        }
        let leap = self.is_leap_year(year);
        let preceding = self
            .months
            .iter()
            .take_while(|m| m.ordinal < month_ordinal)
            .filter(|m| m.is_counted(ignore_intercalary_rules))
            .map(|m| i64::from(m.day_count(leap)))
            .fold(0_i64, i64::saturating_add);
        days.saturating_add(preceding)
            .saturating_add(i64::from(day.max(1)))
    }

    /// Convert a second count to a date and time of day.
    ///
    /// Seconds split into whole days plus a time of day; the day count is
    /// made 1-based and located first within a year, then within that
    /// year's counted months.
    pub fn linear_day_to_date(
        &self,
        total_seconds: i64,
        ignore_intercalary_rules: bool,
    ) -> CalendarDateTime {
        let (days, hour, minute, second) = self.units.split(total_seconds);
        let (year, month, day) =
            self.locate_linear_day(days.saturating_add(1), ignore_intercalary_rules);
        CalendarDateTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Resolve a 1-based linear day to `(year, month ordinal, day)`.
    pub fn locate_linear_day(
        &self,
        linear_day: i64,
        ignore_intercalary_rules: bool,
    ) -> (i64, u32, u32) {
        let year = self.year_containing(linear_day, ignore_intercalary_rules);
        let mut remaining =
            linear_day.saturating_sub(self.days_before_year(year, ignore_intercalary_rules));
        let leap = self.is_leap_year(year);
        let mut last_counted = None;
        for month in self.months.iter().filter(|m| m.is_counted(ignore_intercalary_rules)) {
            let length = i64::from(month.day_count(leap));
            if length == 0 {
                continue;
            }
            if remaining <= length {
                let day = u32::try_from(remaining.max(1)).unwrap_or(1);
                return (year, month.ordinal, day);
            }
            remaining = remaining.saturating_sub(length);
            last_counted = Some(month);
        }
        // Only reachable for a leap rule that drifts outside its validated window.
        last_counted.map_or((year, 1, 1), |m| (year, m.ordinal, m.day_count(leap).max(1)))
    }

    /// The year whose days include `linear_day`, by bisection.
    ///
    /// Every year has at least one day, so the answer lies within
    /// `|linear_day| + 2` years of year 0.
    fn year_containing(&self, linear_day: i64, ignore_intercalary_rules: bool) -> i64 {
        let reach = linear_day.saturating_abs().saturating_add(2);
        // days_before_year(low) < linear_day <= days_before_year(high)
        let (mut low, mut high) = (reach.saturating_neg(), reach);
        while high.saturating_sub(low) > 1 {
            let mid = low.saturating_add(high.saturating_sub(low).div_euclid(2));
            if self.days_before_year(mid, ignore_intercalary_rules) < linear_day {
                low = mid;
            } else {
                high = mid;
            }
        }
        low
    }

    /// Total seconds for a date and time of day.
    ///
    /// Uses the exact linear day (every month counted, year-zero leap day
    /// included), so [`Calendar::seconds_to_date`] inverts it.
    pub fn date_to_seconds(&self, date: &CalendarDateTime) -> i64 {
        let linear = self.date_to_linear_day(date.year, date.month, date.day, true, true);
        linear
            .saturating_sub(1)
            .saturating_mul(self.units.seconds_per_day())
            .saturating_add(self.units.to_seconds(date.hour, date.minute, date.second))
    }

    /// Inverse of [`Calendar::date_to_seconds`].
    pub fn seconds_to_date(&self, total_seconds: i64) -> CalendarDateTime {
        self.linear_day_to_date(total_seconds, true)
    }

    /// Weekday index of a date, `0` when there are no weekdays.
    ///
    /// Days of an intercalary month outside the weekday cycle restart the
    /// cycle at index 0 on the month's first day.
    pub fn day_of_week(&self, year: i64, month_ordinal: u32, day: u32) -> usize {
        let Some(count) = i64::try_from(self.weekdays.len()).ok().filter(|c| *c > 0) else {
            return 0;
        };
        let position = match self.month_by_ordinal(month_ordinal) {
            Some(month) if !month.is_counted(false) => i64::from(day.max(1).saturating_sub(1)),
            _ => self
                .date_to_linear_day(year, month_ordinal, day, true, false)
                .saturating_sub(1)
                .saturating_add(i64::try_from(self.first_weekday).unwrap_or(0)),
        };
        usize::try_from(position.rem_euclid(count)).unwrap_or(0)
    }
}
