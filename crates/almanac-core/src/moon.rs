//! Moon phase resolution.
//!
//! A moon has a cycle length in (possibly fractional) days and an ordered
//! list of phases. Phases flagged `single_day` last exactly one day; the
//! rest share whatever remains of the cycle. The phase on a date comes
//! from the days elapsed since a reference new moon, folded into one cycle
//! and walked against the accumulated phase lengths.
//!
//! # Precision
//!
//! Cycle arithmetic uses [`Decimal`]. Normalized phase lengths are rounded
//! to [`PHASE_PRECISION`] decimal places and the rounding residue is given
//! to the last shared phase, so the stored lengths sum to the cycle length
//! exactly. Resolution is accurate to about a day around phase boundaries.
//!
//! # Reference resets
//!
//! The reference new moon can be re-anchored every leap year or every X
//! years ([`YearReset`]). A re-anchored reference drifts by a fraction of a
//! day per year relative to the true phase; that drift is added back as a
//! fractional-day adjustment.

use std::num::NonZeroU32;

use almanac_types::MoonInfo;
use rust_decimal::Decimal;

use crate::calendar::Calendar;

/// Decimal places kept for normalized phase lengths.
pub const PHASE_PRECISION: u32 = 6;

/// Allowed difference between the phase-length sum and the cycle length.
pub const PHASE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, PHASE_PRECISION);

/// Errors raised by moon definitions.
#[derive(Debug, thiserror::Error)]
pub enum MoonError {
    /// The cycle length is zero or negative.
    #[error("cycle length must be positive, got {cycle_length}")]
    NonPositiveCycle {
        /// Configured cycle length.
        cycle_length: Decimal,
    },

    /// The moon has no phases.
    #[error("a moon needs at least one phase")]
    NoPhases,

    /// Single-day phases alone are longer than the cycle.
    #[error("{single_days} single-day phases do not fit in a {cycle_length}-day cycle")]
    SingleDaysExceedCycle {
        /// Number of single-day phases.
        single_days: usize,
        /// Configured cycle length.
        cycle_length: Decimal,
    },

    /// Phase lengths do not add up to the cycle length.
    #[error("phase lengths sum to {sum}, expected {cycle_length}")]
    PhaseSum {
        /// Sum of phase lengths.
        sum: Decimal,
        /// Configured cycle length.
        cycle_length: Decimal,
    },

    /// Decimal arithmetic overflowed.
    #[error("arithmetic overflow normalizing phase lengths")]
    ArithmeticOverflow,
}

/// When the reference new moon is re-anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearReset {
    /// Never; the configured first new moon is used for every date.
    #[default]
    None,
    /// On the most recent leap year at or before the queried year.
    LeapYear,
    /// On the most recent multiple of X at or before the queried year.
    EveryXYears(NonZeroU32),
}

/// The reference new moon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstNewMoon {
    /// Re-anchoring policy.
    pub year_reset: YearReset,
    /// Year of the first new moon (ignored when re-anchoring).
    pub year: i64,
    /// Month ordinal of the first new moon.
    pub month: u32,
    /// Day of the first new moon.
    pub day: u32,
}

/// One phase of a moon's cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoonPhase {
    /// Display name.
    pub name: String,
    /// Length in days; set by [`Moon::normalize_phase_lengths`].
    pub length: Decimal,
    /// Whether the phase lasts exactly one day.
    pub single_day: bool,
    /// Icon key for the presentation layer.
    pub icon: String,
}

impl MoonPhase {
    /// A phase of unspecified length.
    pub fn new(name: impl Into<String>, single_day: bool, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            length: Decimal::ZERO,
            single_day,
            icon: icon.into(),
        }
    }
}

/// A moon with an independent cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Moon {
    /// Display name.
    pub name: String,
    /// Display colour.
    pub color: String,
    /// Days per full cycle.
    pub cycle_length: Decimal,
    /// Shift applied to the position within the cycle.
    pub cycle_day_adjust: Decimal,
    /// Phases in cycle order, starting at the new moon.
    pub phases: Vec<MoonPhase>,
    /// The reference new moon.
    pub first_new_moon: FirstNewMoon,
}

impl Moon {
    /// Give single-day phases a length of 1 and split the rest of the cycle
    /// evenly between the other phases.
    ///
    /// # Errors
    ///
    /// Returns [`MoonError`] if the cycle is not positive, there are no
    /// phases, or the single-day phases do not fit in the cycle.
    pub fn normalize_phase_lengths(&mut self) -> Result<(), MoonError> {
        if self.cycle_length <= Decimal::ZERO {
            return Err(MoonError::NonPositiveCycle {
                cycle_length: self.cycle_length,
            });
        }
        if self.phases.is_empty() {
            return Err(MoonError::NoPhases);
        }
        let single_days = self.phases.iter().filter(|p| p.single_day).count();
        let shared = self.phases.len().saturating_sub(single_days);
        let remaining = self
            .cycle_length
            .checked_sub(Decimal::from(single_days))
            .ok_or(MoonError::ArithmeticOverflow)?;
        if remaining < Decimal::ZERO {
            return Err(MoonError::SingleDaysExceedCycle {
                single_days,
                cycle_length: self.cycle_length,
            });
        }

        let each = if shared == 0 {
            Decimal::ZERO
        } else {
            remaining
                .checked_div(Decimal::from(shared))
                .ok_or(MoonError::ArithmeticOverflow)?
                .round_dp(PHASE_PRECISION)
        };
        let mut assigned = Decimal::ZERO;
        let mut shared_seen = 0_usize;
        for phase in &mut self.phases {
            if phase.single_day {
                phase.length = Decimal::ONE;
                continue;
            }
            shared_seen = shared_seen.saturating_add(1);
            phase.length = if shared_seen == shared {
                remaining
                    .checked_sub(assigned)
                    .ok_or(MoonError::ArithmeticOverflow)?
            } else {
                each
            };
            assigned = assigned
                .checked_add(phase.length)
                .ok_or(MoonError::ArithmeticOverflow)?;
        }
        Ok(())
    }

    /// Check that phase lengths sum to the cycle length.
    ///
    /// # Errors
    ///
    /// Returns [`MoonError::PhaseSum`] if they differ by more than
    /// [`PHASE_TOLERANCE`].
    pub fn validate(&self) -> Result<(), MoonError> {
        let sum = self
            .phases
            .iter()
            .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.length))
            .ok_or(MoonError::ArithmeticOverflow)?;
        let difference = sum
            .checked_sub(self.cycle_length)
            .ok_or(MoonError::ArithmeticOverflow)?
            .abs();
        if difference > PHASE_TOLERANCE {
            return Err(MoonError::PhaseSum {
                sum,
                cycle_length: self.cycle_length,
            });
        }
        Ok(())
    }

    /// Linear day of the reference new moon for `year`, plus the
    /// fractional-day drift adjustment of the reset policy.
    fn reference_for(&self, calendar: &Calendar, year: i64) -> (i64, Decimal) {
        let fnm = &self.first_new_moon;
        let anchor = |anchor_year: i64| {
            calendar.date_to_linear_day(anchor_year, fnm.month, fnm.day, true, true)
        };
        match fnm.year_reset {
            YearReset::None => (anchor(fnm.year), Decimal::ZERO),
            YearReset::LeapYear => match calendar.leap_rule().previous_leap_year(year) {
                Some(leap_year) if leap_year == year => (anchor(leap_year), Decimal::ZERO),
                Some(leap_year) => (anchor(leap_year), calendar.leap_rule().fraction(year)),
                None => (anchor(fnm.year), Decimal::ZERO),
            },
            YearReset::EveryXYears(every) => {
                let every = i64::from(every.get());
                let into = year.rem_euclid(every);
                let adjustment = if into == 0 {
                    Decimal::ZERO
                } else {
                    Decimal::from(into)
                        .checked_div(Decimal::from(every))
                        .unwrap_or(Decimal::ZERO)
                };
                (anchor(year.saturating_sub(into)), adjustment)
            }
        }
    }

    /// Days into the cycle on a date, shifted by `cycle_day_adjust`.
    pub fn days_into_cycle(
        &self,
        calendar: &Calendar,
        year: i64,
        month: u32,
        day: u32,
    ) -> Option<Decimal> {
        let (reference, adjustment) = self.reference_for(calendar, year);
        let days = calendar.date_to_linear_day(year, month, day, true, true);
        let since = Decimal::from(days.saturating_sub(reference)).checked_add(adjustment)?;
        let cycles = since.checked_div(self.cycle_length)?;
        let within = cycles.checked_sub(cycles.floor())?;
        within
            .checked_mul(self.cycle_length)?
            .checked_add(self.cycle_day_adjust)
    }

    /// Index of the phase on a date.
    ///
    /// Falls back to the first phase when the position lands outside every
    /// phase (cycle-boundary rounding, or an adjustment past the cycle).
    pub fn phase_index(&self, calendar: &Calendar, year: i64, month: u32, day: u32) -> usize {
        let Some(position) = self.days_into_cycle(calendar, year, month, day) else {
            return 0;
        };
        let mut start = Decimal::ZERO;
        for (index, phase) in self.phases.iter().enumerate() {
            let Some(end) = start.checked_add(phase.length) else {
                break;
            };
            if position >= start && position < end {
                return index;
            }
            start = end;
        }
        0
    }

    /// The phase on a date; `None` only for a moon without phases.
    pub fn resolve_phase(
        &self,
        calendar: &Calendar,
        year: i64,
        month: u32,
        day: u32,
    ) -> Option<&MoonPhase> {
        self.phases.get(self.phase_index(calendar, year, month, day))
    }

    /// Display data for the phase on a date.
    pub fn info_for(
        &self,
        calendar: &Calendar,
        year: i64,
        month: u32,
        day: u32,
    ) -> Option<MoonInfo> {
        self.resolve_phase(calendar, year, month, day).map(|phase| MoonInfo {
            moon: self.name.clone(),
            phase: phase.name.clone(),
            icon: phase.icon.clone(),
            color: self.color.clone(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calendar::{Month, Weekday};
    use crate::leap::LeapRule;
    use crate::time::TimeUnits;

    fn phases() -> Vec<MoonPhase> {
        vec![
            MoonPhase::new("New", true, "new"),
            MoonPhase::new("Waxing", false, "waxing"),
            MoonPhase::new("Full", true, "full"),
            MoonPhase::new("Waning", false, "waning"),
        ]
    }

    fn moon(cycle_length: Decimal, year_reset: YearReset) -> Moon {
        let mut moon = Moon {
            name: "Luna".to_owned(),
            color: "#ffffff".to_owned(),
            cycle_length,
            cycle_day_adjust: Decimal::ZERO,
            phases: phases(),
            first_new_moon: FirstNewMoon {
                year_reset,
                year: 0,
                month: 1,
                day: 1,
            },
        };
        moon.normalize_phase_lengths().unwrap();
        moon
    }

    fn calendar() -> Calendar {
        let months = vec![Month::new("Only", 1, 20).with_leap_days(21)];
        let weekdays = vec![Weekday::new("One")];
        let rule = LeapRule::Modulus(NonZeroU32::new(4).unwrap());
        Calendar::with_rule("Moonlit", months, weekdays, rule, TimeUnits::standard()).unwrap()
    }

    fn phase_name(moon: &Moon, cal: &Calendar, year: i64, day: u32) -> String {
        moon.resolve_phase(cal, year, 1, day).unwrap().name.clone()
    }

    #[test]
    fn single_day_phase_leaves_the_rest_to_the_other() {
        let mut moon = moon(dec!(10), YearReset::None);
        moon.cycle_length = dec!(29.5);
        moon.phases = vec![
            MoonPhase::new("New", true, "new"),
            MoonPhase::new("Rest", false, "rest"),
        ];
        moon.normalize_phase_lengths().unwrap();
        assert_eq!(moon.phases[0].length, Decimal::ONE);
        assert_eq!(moon.phases[1].length, dec!(28.5));
    }

    #[test]
    fn rounded_lengths_sum_exactly_to_cycle() {
        let mut moon = moon(dec!(10), YearReset::None);
        moon.cycle_length = dec!(29.53059);
        moon.phases = (0..8)
            .map(|i| MoonPhase::new(format!("P{i}"), i % 2 == 0, "icon"))
            .collect();
        moon.normalize_phase_lengths().unwrap();
        let sum: Decimal = moon.phases.iter().map(|p| p.length).sum();
        assert_eq!(sum, dec!(29.53059));
        assert!(moon.validate().is_ok());
        assert_eq!(moon.phases[1].length, dec!(6.382648));
    }

    #[test]
    fn normalization_rejects_bad_cycles() {
        let mut moon = moon(dec!(10), YearReset::None);
        moon.cycle_length = dec!(1.5);
        assert!(matches!(
            moon.normalize_phase_lengths(),
            Err(MoonError::SingleDaysExceedCycle { single_days: 2, .. })
        ));
        moon.cycle_length = Decimal::ZERO;
        assert!(matches!(
            moon.normalize_phase_lengths(),
            Err(MoonError::NonPositiveCycle { .. })
        ));
        moon.cycle_length = dec!(10);
        moon.phases.clear();
        assert!(matches!(moon.normalize_phase_lengths(), Err(MoonError::NoPhases)));
    }

    #[test]
    fn validate_detects_hand_edited_lengths() {
        let mut moon = moon(dec!(10), YearReset::None);
        moon.phases[1].length = dec!(5);
        assert!(matches!(moon.validate(), Err(MoonError::PhaseSum { .. })));
    }

    #[test]
    fn phases_follow_the_cycle() {
        let cal = calendar();
        let moon = moon(dec!(10), YearReset::None);
        assert_eq!(phase_name(&moon, &cal, 0, 1), "New");
        assert_eq!(phase_name(&moon, &cal, 0, 2), "Waxing");
        assert_eq!(phase_name(&moon, &cal, 0, 5), "Waxing");
        assert_eq!(phase_name(&moon, &cal, 0, 6), "Full");
        assert_eq!(phase_name(&moon, &cal, 0, 7), "Waning");
        assert_eq!(phase_name(&moon, &cal, 0, 11), "New");
    }

    #[test]
    fn every_day_of_a_cycle_has_exactly_one_phase() {
        let cal = calendar();
        let moon = moon(dec!(10), YearReset::None);
        let mut counts = [0_u32; 4];
        for day in 1..=10 {
            counts[moon.phase_index(&cal, 0, 1, day)] += 1;
        }
        assert_eq!(counts, [1, 4, 1, 4]);
    }

    #[test]
    fn cycle_day_adjust_shifts_position() {
        let cal = calendar();
        let mut moon = moon(dec!(10), YearReset::None);
        moon.cycle_day_adjust = Decimal::ONE;
        assert_eq!(phase_name(&moon, &cal, 0, 1), "Waxing");
        // Past the end of the cycle falls back to the first phase.
        moon.cycle_day_adjust = dec!(20);
        assert_eq!(phase_name(&moon, &cal, 0, 1), "New");
    }

    #[test]
    fn dates_before_the_reference_fold_into_the_cycle() {
        let cal = calendar();
        let mut moon = moon(dec!(10), YearReset::None);
        moon.first_new_moon.year = 1;
        // Year 0 is a 21-day leap year; day 12 is 10 days before year 1.
        assert_eq!(phase_name(&moon, &cal, 0, 12), "New");
        assert_eq!(phase_name(&moon, &cal, 0, 13), "Waxing");
    }

    #[test]
    fn leap_year_reset_reanchors_with_fraction() {
        let cal = calendar();
        let moon = moon(dec!(10), YearReset::LeapYear);
        assert_eq!(phase_name(&moon, &cal, 8, 1), "New");
        // 21 days after the year-8 anchor plus a quarter-year drift.
        let position = moon.days_into_cycle(&cal, 9, 1, 1).unwrap();
        assert_eq!(position, dec!(1.25));
        assert_eq!(phase_name(&moon, &cal, 9, 1), "Waxing");
    }

    #[test]
    fn every_x_years_reset_reanchors_with_fraction() {
        let cal = calendar();
        let moon = moon(dec!(10), YearReset::EveryXYears(NonZeroU32::new(3).unwrap()));
        assert_eq!(phase_name(&moon, &cal, 6, 1), "New");
        // Year 6 has 20 days; a third of a day of drift keeps day 1 of year 7 new.
        assert_eq!(phase_name(&moon, &cal, 7, 1), "New");
        assert_eq!(phase_name(&moon, &cal, 7, 2), "Waxing");
    }

    #[test]
    fn info_carries_moon_and_phase() {
        let cal = calendar();
        let moon = moon(dec!(10), YearReset::None);
        let info = moon.info_for(&cal, 0, 1, 6).unwrap();
        assert_eq!(info.moon, "Luna");
        assert_eq!(info.phase, "Full");
        assert_eq!(info.icon, "full");
    }
}
