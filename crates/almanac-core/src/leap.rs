//! Leap-year rules.
//!
//! A rule answers two questions about an integer year: is it a leap year,
//! and how many leap years came before it. Day counting depends on the two
//! answers agreeing exactly; a rule whose counter drifts from its predicate
//! shifts every date after the drift by the leap-day delta. [`validate_rule`]
//! checks that agreement over a window of years and is run whenever a
//! calendar is built.
//!
//! # Conventions
//!
//! - `leap_years_before(year)` counts leap years in `[1, year)`. Year 0 is
//!   deliberately left out, so for rules where year 0 is a leap year the
//!   count at year 0 is `-1`. Callers that need an exact day count add the
//!   year-zero leap day back in (see `Calendar::date_to_linear_day`).
//! - For every year, `leap_years_before(year + 1) - leap_years_before(year)`
//!   is `1` when `is_leap_year(year)` and `0` otherwise, including zero and
//!   negative years.

use std::fmt;
use std::num::NonZeroU32;
use std::ops::RangeInclusive;

use rust_decimal::Decimal;

/// How far the default neighbour searches look before giving up.
const NEIGHBOUR_SCAN_LIMIT: i64 = 10_000;

/// Errors raised when a leap-year rule is inconsistent.
#[derive(Debug, thiserror::Error)]
pub enum LeapRuleError {
    /// The counter and the predicate disagree at a year.
    #[error(
        "leap rule inconsistent at year {year}: is_leap_year = {is_leap}, \
         but leap_years_before steps from {before} to {after}"
    )]
    Inconsistent {
        /// The first year where the disagreement was found.
        year: i64,
        /// The predicate's answer for `year`.
        is_leap: bool,
        /// `leap_years_before(year)`.
        before: i64,
        /// `leap_years_before(year + 1)`.
        after: i64,
    },
}

/// A leap-year rule over integer years.
///
/// Implementors only need [`is_leap_year`](Self::is_leap_year) and
/// [`leap_years_before`](Self::leap_years_before); the neighbour searches
/// and [`fraction`](Self::fraction) have scanning defaults.
pub trait LeapYearRule: fmt::Debug + Send + Sync {
    /// Whether `year` is a leap year.
    fn is_leap_year(&self, year: i64) -> bool;

    /// Number of leap years in `[1, year)`, negative for years below 1.
    fn leap_years_before(&self, year: i64) -> i64;

    /// The latest leap year at or before `year`, if one exists nearby.
    fn previous_leap_year(&self, year: i64) -> Option<i64> {
        let floor = year.saturating_sub(NEIGHBOUR_SCAN_LIMIT);
        let mut candidate = year;
        while candidate >= floor {
            if self.is_leap_year(candidate) {
                return Some(candidate);
            }
            candidate = candidate.checked_sub(1)?;
        }
        None
    }

    /// The earliest leap year strictly after `year`, if one exists nearby.
    fn next_leap_year(&self, year: i64) -> Option<i64> {
        let ceiling = year.saturating_add(NEIGHBOUR_SCAN_LIMIT);
        let mut candidate = year.checked_add(1)?;
        while candidate <= ceiling {
            if self.is_leap_year(candidate) {
                return Some(candidate);
            }
            candidate = candidate.checked_add(1)?;
        }
        None
    }

    /// Progress of `year` from the previous leap year toward the next one,
    /// in `[0, 1)`. Zero for rules without leap years.
    fn fraction(&self, year: i64) -> Decimal {
        let (Some(previous), Some(next)) =
            (self.previous_leap_year(year), self.next_leap_year(year))
        else {
            return Decimal::ZERO;
        };
        let elapsed = Decimal::from(year.saturating_sub(previous));
        let span = Decimal::from(next.saturating_sub(previous));
        elapsed.checked_div(span).unwrap_or(Decimal::ZERO)
    }
}

/// The built-in leap-year rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeapRule {
    /// No leap years at all.
    #[default]
    None,
    /// Every fourth year, except centuries not divisible by 400.
    Gregorian,
    /// Every year divisible by the modulus.
    Modulus(NonZeroU32),
}

impl LeapYearRule for LeapRule {
    fn is_leap_year(&self, year: i64) -> bool {
        match *self {
            Self::None => false,
            Self::Gregorian => {
                (year.rem_euclid(4) == 0 && year.rem_euclid(100) != 0) || year.rem_euclid(400) == 0
            }
            Self::Modulus(every) => year.rem_euclid(i64::from(every.get())) == 0,
        }
    }

    fn leap_years_before(&self, year: i64) -> i64 {
        let last = year.saturating_sub(1);
        match *self {
            Self::None => 0,
            Self::Gregorian => last
                .div_euclid(4)
                .saturating_sub(last.div_euclid(100))
                .saturating_add(last.div_euclid(400)),
            Self::Modulus(every) => last.div_euclid(i64::from(every.get())),
        }
    }

    fn previous_leap_year(&self, year: i64) -> Option<i64> {
        match *self {
            Self::None => None,
            Self::Modulus(every) => year.checked_sub(year.rem_euclid(i64::from(every.get()))),
            // Gregorian leap years are never more than eight years apart.
            Self::Gregorian => (0..=8_i64)
                .filter_map(|back| year.checked_sub(back))
                .find(|candidate| self.is_leap_year(*candidate)),
        }
    }

    fn next_leap_year(&self, year: i64) -> Option<i64> {
        match *self {
            Self::None => None,
            Self::Modulus(every) => {
                let period = i64::from(every.get());
                year.checked_add(period.checked_sub(year.rem_euclid(period))?)
            }
            Self::Gregorian => (1..=8_i64)
                .filter_map(|ahead| year.checked_add(ahead))
                .find(|candidate| self.is_leap_year(*candidate)),
        }
    }

    fn fraction(&self, year: i64) -> Decimal {
        match *self {
            Self::None => Decimal::ZERO,
            Self::Modulus(every) => {
                let period = i64::from(every.get());
                Decimal::from(year.rem_euclid(period))
                    .checked_div(Decimal::from(period))
                    .unwrap_or(Decimal::ZERO)
            }
            Self::Gregorian => {
                let (Some(previous), Some(next)) =
                    (self.previous_leap_year(year), self.next_leap_year(year))
                else {
                    return Decimal::ZERO;
                };
                Decimal::from(year.saturating_sub(previous))
                    .checked_div(Decimal::from(next.saturating_sub(previous)))
                    .unwrap_or(Decimal::ZERO)
            }
        }
    }
}

/// Years checked by [`validate_rule`] when a calendar is built.
pub const VALIDATION_WINDOW: RangeInclusive<i64> = -2_000..=4_000;

/// Check that a rule's counter steps by exactly the predicate over `years`.
///
/// # Errors
///
/// Returns [`LeapRuleError::Inconsistent`] at the first year where
/// `leap_years_before(year + 1) - leap_years_before(year)` differs from
/// `is_leap_year(year)`.
pub fn validate_rule(
    rule: &dyn LeapYearRule,
    years: RangeInclusive<i64>,
) -> Result<(), LeapRuleError> {
    for year in years {
        let Some(next) = year.checked_add(1) else {
            break;
        };
        let before = rule.leap_years_before(year);
        let after = rule.leap_years_before(next);
        let is_leap = rule.is_leap_year(year);
        let expected = i64::from(is_leap);
        if after.checked_sub(before) != Some(expected) {
            return Err(LeapRuleError::Inconsistent {
                year,
                is_leap,
                before,
                after,
            });
        }
    }
    Ok(())
}
