//! The clock primitive: time units and the authoritative time of day.
//!
//! [`TimeUnits`] fixes how many seconds make a minute, minutes an hour and
//! hours a day. [`Time`] holds the current hour/minute/second against those
//! units. Every arithmetic operation keeps the fields in range and reports
//! any overflow past midnight as a signed whole-day delta; the caller
//! decides what a day change means (see `CalendarEngine::advance_time`).

use almanac_types::TimeUnit;

/// Errors raised by clock configuration.
#[derive(Debug, thiserror::Error)]
pub enum TimeError {
    /// A unit count was zero or the day length overflows.
    #[error("invalid time units: {reason}")]
    InvalidUnits {
        /// Explanation of what is wrong with the units.
        reason: String,
    },
}

/// How seconds, minutes and hours compose into a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeUnits {
    seconds_per_minute: u32,
    minutes_per_hour: u32,
    hours_per_day: u32,
}

impl TimeUnits {
    /// Create a unit configuration. All three counts must be positive.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::InvalidUnits`] if any count is zero.
    pub fn new(
        seconds_per_minute: u32,
        minutes_per_hour: u32,
        hours_per_day: u32,
    ) -> Result<Self, TimeError> {
        for (label, value) in [
            ("seconds_per_minute", seconds_per_minute),
            ("minutes_per_hour", minutes_per_hour),
            ("hours_per_day", hours_per_day),
        ] {
            if value == 0 {
                return Err(TimeError::InvalidUnits {
                    reason: format!("{label} must be at least 1"),
                });
            }
        }
        Ok(Self {
            seconds_per_minute,
            minutes_per_hour,
            hours_per_day,
        })
    }

    /// The familiar 60/60/24 clock.
    pub const fn standard() -> Self {
        Self {
            seconds_per_minute: 60,
            minutes_per_hour: 60,
            hours_per_day: 24,
        }
    }

    /// Seconds in one minute.
    pub const fn seconds_per_minute(&self) -> u32 {
        self.seconds_per_minute
    }

    /// Minutes in one hour.
    pub const fn minutes_per_hour(&self) -> u32 {
        self.minutes_per_hour
    }

    /// Hours in one day.
    pub const fn hours_per_day(&self) -> u32 {
        self.hours_per_day
    }

    /// Seconds in one hour.
    pub fn seconds_per_hour(&self) -> i64 {
        i64::from(self.seconds_per_minute).saturating_mul(i64::from(self.minutes_per_hour))
    }

    /// Seconds in one day. Always at least 1.
    pub fn seconds_per_day(&self) -> i64 {
        self.seconds_per_hour()
            .saturating_mul(i64::from(self.hours_per_day))
            .max(1)
    }

    /// Seconds in one of the given unit.
    pub fn seconds_in(&self, unit: TimeUnit) -> i64 {
        match unit {
            TimeUnit::Second => 1,
            TimeUnit::Minute => i64::from(self.seconds_per_minute),
            TimeUnit::Hour => self.seconds_per_hour(),
        }
    }

    /// Seconds since midnight for a time of day.
    pub fn to_seconds(&self, hour: u32, minute: u32, second: u32) -> i64 {
        i64::from(hour)
            .saturating_mul(self.seconds_per_hour())
            .saturating_add(i64::from(minute).saturating_mul(i64::from(self.seconds_per_minute)))
            .saturating_add(i64::from(second))
    }

    /// Split a signed second count into whole days and an in-range time of
    /// day `(hour, minute, second)`. Negative counts borrow from the day.
    pub fn split(&self, seconds: i64) -> (i64, u32, u32, u32) {
        let per_day = self.seconds_per_day();
        let days = seconds.div_euclid(per_day);
        let of_day = seconds.rem_euclid(per_day);
        let per_hour = self.seconds_per_hour().max(1);
        let per_minute = i64::from(self.seconds_per_minute.max(1));
        let hour = of_day.div_euclid(per_hour);
        let minute = of_day.rem_euclid(per_hour).div_euclid(per_minute);
        let second = of_day.rem_euclid(per_minute);
        (
            days,
            u32::try_from(hour).unwrap_or(0),
            u32::try_from(minute).unwrap_or(0),
            u32::try_from(second).unwrap_or(0),
        )
    }

    /// Whether a time of day fits within these units.
    pub const fn contains(&self, hour: u32, minute: u32, second: u32) -> bool {
        hour < self.hours_per_day
            && minute < self.minutes_per_hour
            && second < self.seconds_per_minute
    }
}

impl Default for TimeUnits {
    fn default() -> Self {
        Self::standard()
    }
}

/// The authoritative time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Time {
    units: TimeUnits,
    hour: u32,
    minute: u32,
    second: u32,
}

impl Time {
    /// Midnight under the given units.
    pub const fn midnight(units: TimeUnits) -> Self {
        Self {
            units,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }

    /// The unit configuration.
    pub const fn units(&self) -> &TimeUnits {
        &self.units
    }

    /// Current hour.
    pub const fn hour(&self) -> u32 {
        self.hour
    }

    /// Current minute.
    pub const fn minute(&self) -> u32 {
        self.minute
    }

    /// Current second.
    pub const fn second(&self) -> u32 {
        self.second
    }

    /// Seconds since midnight.
    pub fn seconds_of_day(&self) -> i64 {
        self.units.to_seconds(self.hour, self.minute, self.second)
    }

    /// Replace the time of day with `seconds` past the current midnight,
    /// returning how many whole days that overflowed (negative when it
    /// went before midnight).
    pub fn set_seconds_of_day(&mut self, seconds: i64) -> i64 {
        let (days, hour, minute, second) = self.units.split(seconds);
        self.hour = hour;
        self.minute = minute;
        self.second = second;
        days
    }

    /// Move the clock by `amount` of `unit` (negative to go back),
    /// returning the signed day overflow.
    pub fn advance(&mut self, unit: TimeUnit, amount: i64) -> i64 {
        let delta = self.units.seconds_in(unit).saturating_mul(amount);
        let target = self.seconds_of_day().saturating_add(delta);
        self.set_seconds_of_day(target)
    }

    /// `HH:MM:SS` with zero padding.
    pub fn display(&self) -> String {
        format!("{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_units() {
        assert!(TimeUnits::new(0, 60, 24).is_err());
        assert!(TimeUnits::new(60, 0, 24).is_err());
        assert!(TimeUnits::new(60, 60, 0).is_err());
        assert!(TimeUnits::new(10, 10, 10).is_ok());
    }

    #[test]
    fn day_length_follows_units() {
        let units = TimeUnits::new(10, 20, 5).unwrap();
        assert_eq!(units.seconds_per_hour(), 200);
        assert_eq!(units.seconds_per_day(), 1000);
        assert_eq!(units.seconds_in(TimeUnit::Minute), 10);
    }

    #[test]
    fn split_borrows_for_negative_seconds() {
        let units = TimeUnits::standard();
        assert_eq!(units.split(90_061), (1, 1, 1, 1));
        assert_eq!(units.split(-1), (-1, 23, 59, 59));
        assert_eq!(units.split(0), (0, 0, 0, 0));
    }

    #[test]
    fn advance_within_day_reports_no_overflow() {
        let mut time = Time::midnight(TimeUnits::standard());
        assert_eq!(time.advance(TimeUnit::Minute, 90), 0);
        assert_eq!((time.hour(), time.minute(), time.second()), (1, 30, 0));
    }

    #[test]
    fn advance_past_midnight_reports_days() {
        let mut time = Time::midnight(TimeUnits::standard());
        assert_eq!(time.set_seconds_of_day(82_800), 0);
        assert_eq!(time.advance(TimeUnit::Hour, 2), 1);
        assert_eq!(time.hour(), 1);
        assert_eq!(time.advance(TimeUnit::Hour, 48), 2);
        assert_eq!(time.hour(), 1);
    }

    #[test]
    fn advance_backwards_reports_negative_days() {
        let mut time = Time::midnight(TimeUnits::standard());
        assert_eq!(time.advance(TimeUnit::Second, -1), -1);
        assert_eq!(time.display(), "23:59:59");
        assert_eq!(time.advance(TimeUnit::Hour, -48), -2);
        assert_eq!(time.display(), "23:59:59");
    }

    #[test]
    fn set_seconds_of_day_wraps_into_days() {
        let mut time = Time::midnight(TimeUnits::new(10, 10, 10).unwrap());
        assert_eq!(time.set_seconds_of_day(999), 0);
        assert_eq!(time.display(), "09:09:09");
        assert_eq!(time.set_seconds_of_day(1_000), 1);
        assert_eq!(time.display(), "00:00:00");
        assert_eq!(time.set_seconds_of_day(-1), -1);
        assert_eq!(time.display(), "09:09:09");
    }
}
