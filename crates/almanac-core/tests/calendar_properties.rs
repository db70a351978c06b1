//! Exhaustive property checks over small calendars.
//!
//! The calendars here are small enough that every date of several years
//! (including negative years and year 0) can be visited directly.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects, clippy::indexing_slicing)]

use std::num::NonZeroU32;
use std::sync::Arc;

use almanac_core::calendar::{Calendar, Month, Weekday};
use almanac_core::leap::{self, LeapRule, LeapYearRule};
use almanac_core::moon::{FirstNewMoon, Moon, MoonPhase, YearReset};
use almanac_core::navigation::{CursorDate, Cursors};
use almanac_core::time::TimeUnits;
use almanac_types::{CalendarDateTime, Cursor};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const YEARS: std::ops::RangeInclusive<i64> = -7..=9;

/// Ten days, a month that only exists in leap years, an uncounted
/// festival day, then seven days. Leap years every third year; four
/// weekdays; short clock units.
fn odd_calendar() -> Calendar {
    let months = vec![
        Month::new("Thaw", 1, 10),
        Month::new("Gap", 2, 0).with_leap_days(2),
        Month::new("Feast", 3, 1).intercalary(false),
        Month::new("Dusk", 4, 7),
    ];
    let weekdays = ["North", "East", "South", "West"].into_iter().map(Weekday::new).collect();
    let units = TimeUnits::new(10, 6, 4).unwrap();
    Calendar::with_rule(
        "Odd",
        months,
        weekdays,
        LeapRule::Modulus(NonZeroU32::new(3).unwrap()),
        units,
    )
    .unwrap()
}

fn every_date(calendar: &Calendar) -> Vec<(i64, usize, u32, u32)> {
    let mut dates = Vec::new();
    for year in YEARS {
        for (index, month) in calendar.months().iter().enumerate() {
            for day in 1..=calendar.days_in_month(index, year) {
                dates.push((year, index, month.ordinal, day));
            }
        }
    }
    dates
}

#[test]
fn every_instant_round_trips() {
    let calendar = odd_calendar();
    for (year, _, month, day) in every_date(&calendar) {
        for (hour, minute, second) in [(0, 0, 0), (1, 2, 3), (3, 5, 9)] {
            let date = CalendarDateTime::date(year, month, day).at(hour, minute, second);
            let seconds = calendar.date_to_seconds(&date);
            assert_eq!(calendar.seconds_to_date(seconds), date);
        }
    }
}

#[test]
fn linear_day_is_strictly_increasing() {
    let calendar = odd_calendar();
    let mut previous = None;
    for (year, _, month, day) in every_date(&calendar) {
        let linear = calendar.date_to_linear_day(year, month, day, true, true);
        if let Some(previous) = previous {
            assert_eq!(linear, previous + 1, "{year}-{month}-{day}");
        }
        previous = Some(linear);
    }
}

#[test]
fn counted_days_are_strictly_increasing() {
    let calendar = odd_calendar();
    let mut previous = None;
    for (year, index, month, day) in every_date(&calendar) {
        if !calendar.months()[index].is_counted(false) {
            continue;
        }
        let linear = calendar.date_to_linear_day(year, month, day, true, false);
        if let Some(previous) = previous {
            assert_eq!(linear, previous + 1, "{year}-{month}-{day}");
        }
        previous = Some(linear);
    }
}

#[test]
fn weekdays_cycle_over_counted_days() {
    let calendar = odd_calendar();
    let count = u32::try_from(calendar.weekdays().len()).unwrap();
    for (year, index, month, day) in every_date(&calendar) {
        if !calendar.months()[index].is_counted(false)
            || day + count > calendar.days_in_month(index, year)
        {
            continue;
        }
        assert_eq!(
            calendar.day_of_week(year, month, day + count),
            calendar.day_of_week(year, month, day)
        );
    }
}

#[test]
fn leap_counter_steps_with_the_predicate() {
    for rule in [
        LeapRule::None,
        LeapRule::Gregorian,
        LeapRule::Modulus(NonZeroU32::new(3).unwrap()),
        LeapRule::Modulus(NonZeroU32::new(1).unwrap()),
    ] {
        for year in -1_000..=1_000 {
            let step = rule.leap_years_before(year + 1) - rule.leap_years_before(year);
            assert_eq!(step, i64::from(rule.is_leap_year(year)), "{rule:?} {year}");
        }
        assert!(leap::validate_rule(&rule, leap::VALIDATION_WINDOW).is_ok());
    }
}

#[test]
fn day_walks_never_land_on_missing_months() {
    let calendar = odd_calendar();
    let mut cursors = Cursors::at(-7, 0, 0);
    let total: i64 = YEARS.map(|y| calendar.year_length(y, true)).sum();
    for _ in 0..total - 1 {
        cursors.advance_day(&calendar, 1, almanac_types::DayCursor::Current);
        let date = *cursors.get(Cursor::Current);
        let month = date.month.unwrap();
        let day = u32::try_from(date.day.unwrap()).unwrap();
        assert!(day < calendar.days_in_month(month, date.year), "{date:?}");
    }
    assert_eq!(*cursors.get(Cursor::Current), CursorDate::new(9, 3, Some(6)));
}

#[test]
fn month_walks_skip_missing_months_both_ways() {
    let calendar = odd_calendar();
    let mut cursors = Cursors::at(0, 0, 0);
    for _ in 0..60 {
        cursors.advance_month(&calendar, 1, Cursor::Selected);
        let date = *cursors.get(Cursor::Selected);
        assert!(calendar.days_in_month(date.month.unwrap(), date.year) > 0, "{date:?}");
    }
    for _ in 0..60 {
        cursors.advance_month(&calendar, -1, Cursor::Selected);
        let date = *cursors.get(Cursor::Selected);
        assert!(calendar.days_in_month(date.month.unwrap(), date.year) > 0, "{date:?}");
    }
}

#[test]
fn moon_phases_cover_every_day_of_a_cycle() {
    let months = vec![Month::new("Only", 1, 100)];
    let calendar = Calendar::with_rule(
        "Moonlit",
        months,
        vec![Weekday::new("Day")],
        LeapRule::None,
        TimeUnits::standard(),
    )
    .unwrap();
    let moon = Moon {
        name: "Pale".to_owned(),
        color: "#eeeeee".to_owned(),
        cycle_length: dec!(29.5),
        cycle_day_adjust: Decimal::ZERO,
        phases: vec![MoonPhase::new("New", true, "new"), MoonPhase::new("Rest", false, "rest")],
        first_new_moon: FirstNewMoon {
            year_reset: YearReset::None,
            year: 0,
            month: 1,
            day: 1,
        },
    };
    let calendar = calendar.with_moons(vec![moon]).unwrap();
    let moon = &calendar.moons()[0];
    assert_eq!(moon.phases[1].length, dec!(28.5));
    let sum: Decimal = moon.phases.iter().map(|p| p.length).sum();
    assert_eq!(sum, dec!(29.5));

    // Day 31 is 30 days in: half a day into the second cycle.
    for day in 1..=31 {
        let phase = moon.resolve_phase(&calendar, 0, 1, day).unwrap();
        let expected = if day == 1 || day == 31 { "New" } else { "Rest" };
        assert_eq!(phase.name, expected, "day {day}");
    }
}

#[test]
fn custom_rule_trait_objects_are_accepted() {
    /// Leap years on every odd year.
    #[derive(Debug)]
    struct OddYears;

    impl LeapYearRule for OddYears {
        fn is_leap_year(&self, year: i64) -> bool {
            year.rem_euclid(2) == 1
        }

        fn leap_years_before(&self, year: i64) -> i64 {
            year.div_euclid(2)
        }
    }

    let calendar = Calendar::new(
        "Odd years",
        vec![Month::new("One", 1, 10).with_leap_days(11)],
        vec![Weekday::new("Day")],
        Arc::new(OddYears),
        TimeUnits::standard(),
    )
    .unwrap();
    assert_eq!(calendar.year_length(3, false), 11);
    assert_eq!(calendar.days_before_year(4, false), 42);
}
