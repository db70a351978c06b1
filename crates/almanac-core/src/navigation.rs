//! Cursor navigation: the current/selected/visible state machine.
//!
//! Each of the three cursors is a [`CursorDate`]: a year plus the position
//! of at most one flagged month and at most one flagged day. Holding a
//! single `Option<usize>` per cursor makes "at most one month per cursor"
//! a property of the type rather than a convention over boolean flags.
//!
//! # Carry propagation
//!
//! Month moves carry into the year arithmetically; day moves go through the
//! calendar's linear day count, so any distance lands in one step. Months
//! with no days in the year being entered cannot be landed on and are
//! skipped in the direction of travel.
//! Calendar construction guarantees every year has at least one day, so a
//! skip always terminates within two years' worth of months.
//!
//! # Visible follows current
//!
//! Whenever the current cursor lands in a different month, the visible
//! cursor is moved to that month so the UI follows the authoritative date.

use almanac_types::{Cursor, DayCursor};
use tracing::debug;

use crate::calendar::Calendar;

/// One cursor's position.
///
/// `month` and `day` are zero-based positions, not ordinals. The visible
/// cursor never carries a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorDate {
    /// Year number.
    pub year: i64,
    /// Position of the flagged month, if any.
    pub month: Option<usize>,
    /// Position of the flagged day within the month, if any.
    pub day: Option<usize>,
}

impl CursorDate {
    /// A cursor flagging `month` (and optionally `day`) in `year`.
    pub const fn new(year: i64, month: usize, day: Option<usize>) -> Self {
        Self {
            year,
            month: Some(month),
            day,
        }
    }

    /// The flagged day as a 1-based day of the month.
    pub fn day_number(&self) -> Option<u32> {
        self.day
            .and_then(|d| u32::try_from(d).ok())
            .map(|d| d.saturating_add(1))
    }
}

/// The three cursors of a calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursors {
    current: CursorDate,
    selected: CursorDate,
    visible: CursorDate,
}

impl Cursors {
    /// All three cursors on the same day; the visible cursor on its month.
    pub const fn at(year: i64, month: usize, day: usize) -> Self {
        let date = CursorDate::new(year, month, Some(day));
        Self {
            current: date,
            selected: date,
            visible: CursorDate::new(year, month, None),
        }
    }

    /// A cursor's position.
    pub const fn get(&self, cursor: Cursor) -> &CursorDate {
        match cursor {
            Cursor::Current => &self.current,
            Cursor::Selected => &self.selected,
            Cursor::Visible => &self.visible,
        }
    }

    const fn get_mut(&mut self, cursor: Cursor) -> &mut CursorDate {
        match cursor {
            Cursor::Current => &mut self.current,
            Cursor::Selected => &mut self.selected,
            Cursor::Visible => &mut self.visible,
        }
    }

    /// Place a cursor directly. The visible cursor drops any day; moving
    /// the current cursor to another month moves the visible cursor too.
    pub fn set(&mut self, cursor: Cursor, date: CursorDate) {
        let previous = *self.get(cursor);
        let date = if cursor == Cursor::Visible {
            CursorDate { day: None, ..date }
        } else {
            date
        };
        *self.get_mut(cursor) = date;
        if cursor == Cursor::Current && (previous.year, previous.month) != (date.year, date.month) {
            self.follow_current();
        }
    }

    /// Point selected at current and bring visible back to current's month.
    pub const fn today(&mut self) {
        self.selected = self.current;
        self.follow_current();
    }

    const fn follow_current(&mut self) {
        self.visible = CursorDate {
            year: self.current.year,
            month: self.current.month,
            day: None,
        };
    }

    /// Add `amount` years to a cursor.
    ///
    /// With `also_advance_month` the cursor is re-resolved to the first
    /// month (or the last one when moving backward). Otherwise the month is
    /// kept, skipped if it has no days in the new year, and the day is
    /// clamped to the month's new length.
    pub fn advance_year(
        &mut self,
        calendar: &Calendar,
        amount: i64,
        cursor: Cursor,
        also_advance_month: bool,
    ) {
        let forward = amount >= 0;
        let date = self.get_mut(cursor);
        date.year = date.year.saturating_add(amount);
        if also_advance_month {
            self.set_month(calendar, if forward { 0 } else { -1 }, cursor, forward);
            return;
        }
        self.settle(calendar, cursor, forward);
        if cursor == Cursor::Current {
            self.follow_current();
        }
    }

    /// Flag the month at position `index` for a cursor.
    ///
    /// Negative indices select the last month and indices past the end are
    /// clamped. A month with no days in the cursor's year is skipped in the
    /// direction given by `moving_forward`. On the current cursor the day
    /// is seeded to the first day (forward) or last day (backward) and the
    /// visible cursor follows; other cursors lose their day.
    pub fn set_month(
        &mut self,
        calendar: &Calendar,
        index: i64,
        cursor: Cursor,
        moving_forward: bool,
    ) {
        let Some(last) = calendar.months().len().checked_sub(1) else {
            return;
        };
        let index = if index < 0 {
            last
        } else {
            usize::try_from(index).map_or(last, |i| i.min(last))
        };
        let year = self.get(cursor).year;
        let (year, index) = skip_empty(calendar, year, index, moving_forward);

        let day = if cursor == Cursor::Current {
            let length = calendar.days_in_month(index, year);
            let seeded = if moving_forward { 0 } else { length.saturating_sub(1) };
            usize::try_from(seeded).ok()
        } else {
            None
        };
        *self.get_mut(cursor) = CursorDate {
            year,
            month: Some(index),
            day,
        };
        if cursor == Cursor::Current {
            self.follow_current();
        }
    }

    /// Move a cursor by `amount` months, carrying whole years.
    pub fn advance_month(&mut self, calendar: &Calendar, amount: i64, cursor: Cursor) {
        let Some(count) = i64::try_from(calendar.months().len()).ok().filter(|c| *c > 0) else {
            return;
        };
        let date = self.get(cursor);
        let index = date.month.and_then(|m| i64::try_from(m).ok()).unwrap_or(0);
        let target = index.saturating_add(amount);
        let years = target.div_euclid(count);
        if years != 0 {
            debug!(?cursor, years, "month move carried across year boundary");
            let date = self.get_mut(cursor);
            date.year = date.year.saturating_add(years);
        }
        self.set_month(calendar, target.rem_euclid(count), cursor, amount > 0);
    }

    /// Move the current or selected cursor by `amount` days.
    ///
    /// Without a flagged day the move starts from day 1 of the cursor's
    /// month. Overflow past the end of a month continues from day 1 of the
    /// next non-empty month; underflow continues from the last day of the
    /// previous one.
    pub fn advance_day(&mut self, calendar: &Calendar, amount: i64, cursor: DayCursor) {
        let cursor = Cursor::from(cursor);
        let start = *self.get(cursor);
        let month = start.month.or(self.visible.month).unwrap_or(0);
        let forward = amount >= 0;
        let (year, index) = skip_empty(calendar, start.year, month, forward);
        let Some(ordinal) = calendar.months().get(index).map(|m| m.ordinal) else {
            return;
        };
        let length = calendar.days_in_month(index, year);
        let day = start
            .day
            .and_then(|d| u32::try_from(d).ok())
            .map_or(1, |d| d.saturating_add(1))
            .clamp(1, length.max(1));

        // Every month counts here, so the linear day steps through exactly
        // the months a cursor can land on, whole years included.
        let target = calendar
            .date_to_linear_day(year, ordinal, day, true, true)
            .saturating_add(amount);
        let (landed_year, landed_ordinal, day) = calendar.locate_linear_day(target, true);
        if landed_year != year {
            debug!(
                ?cursor,
                years = landed_year.saturating_sub(year),
                "day move carried across year boundary"
            );
        }
        let index = calendar.month_index(landed_ordinal).unwrap_or(index);

        let date = CursorDate {
            year: landed_year,
            month: Some(index),
            day: usize::try_from(day.saturating_sub(1)).ok(),
        };
        self.set(cursor, date);
    }

    /// Skip an empty month and clamp the day after a year change.
    fn settle(&mut self, calendar: &Calendar, cursor: Cursor, forward: bool) {
        let date = *self.get(cursor);
        let Some(month) = date.month else {
            return;
        };
        let (year, index) = skip_empty(calendar, date.year, month, forward);
        let length = usize::try_from(calendar.days_in_month(index, year)).unwrap_or(0);
        let day = date.day.map(|d| d.min(length.saturating_sub(1)));
        *self.get_mut(cursor) = CursorDate {
            year,
            month: Some(index),
            day,
        };
    }
}

/// One month over in the given direction, carrying into the year.
fn step(calendar: &Calendar, year: i64, index: usize, forward: bool) -> (i64, usize) {
    let last = calendar.months().len().saturating_sub(1);
    if forward {
        if index >= last {
            (year.saturating_add(1), 0)
        } else {
            (year, index.saturating_add(1))
        }
    } else if index == 0 {
        (year.saturating_sub(1), last)
    } else {
        (year, index.saturating_sub(1))
    }
}

/// `(year, index)` if that month has days, otherwise the first month with
/// days in the direction of travel.
fn skip_empty(calendar: &Calendar, year: i64, index: usize, forward: bool) -> (i64, usize) {
    let mut position = (year, index);
    let limit = calendar.months().len().saturating_mul(2);
    for _ in 0..=limit {
        if calendar.days_in_month(position.1, position.0) > 0 {
            return position;
        }
        debug!(year = position.0, month = position.1, forward, "skipping month with no days");
        position = step(calendar, position.0, position.1, forward);
    }
    position
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;
    use crate::calendar::{Month, Weekday};
    use crate::leap::LeapRule;
    use crate::time::TimeUnits;

    /// Four months; "Leapling" only exists in leap years (every 4th).
    fn calendar() -> Calendar {
        let months = vec![
            Month::new("Frost", 1, 10),
            Month::new("Leapling", 2, 0).with_leap_days(3),
            Month::new("Bloom", 3, 12),
            Month::new("Harvest", 4, 8),
        ];
        let rule = LeapRule::Modulus(NonZeroU32::new(4).unwrap());
        let weekdays = vec![Weekday::new("Only")];
        Calendar::with_rule("Nav", months, weekdays, rule, TimeUnits::standard()).unwrap()
    }

    fn position(cursors: &Cursors, cursor: Cursor) -> (i64, Option<usize>, Option<usize>) {
        let date = cursors.get(cursor);
        (date.year, date.month, date.day)
    }

    #[test]
    fn forward_month_skips_empty_month_in_normal_year() {
        let cal = calendar();
        let mut cursors = Cursors::at(1, 0, 4);
        cursors.advance_month(&cal, 1, Cursor::Current);
        assert_eq!(position(&cursors, Cursor::Current), (1, Some(2), Some(0)));
    }

    #[test]
    fn backward_month_skips_empty_month_and_seeds_last_day() {
        let cal = calendar();
        let mut cursors = Cursors::at(1, 2, 4);
        cursors.advance_month(&cal, -1, Cursor::Current);
        assert_eq!(position(&cursors, Cursor::Current), (1, Some(0), Some(9)));
    }

    #[test]
    fn empty_month_is_reachable_in_leap_year() {
        let cal = calendar();
        let mut cursors = Cursors::at(4, 0, 0);
        cursors.advance_month(&cal, 1, Cursor::Current);
        assert_eq!(position(&cursors, Cursor::Current), (4, Some(1), Some(0)));
    }

    #[test]
    fn month_overflow_carries_years() {
        let cal = calendar();
        let mut cursors = Cursors::at(1, 3, 0);
        cursors.advance_month(&cal, 1, Cursor::Selected);
        assert_eq!(position(&cursors, Cursor::Selected), (2, Some(0), None));
        cursors.advance_month(&cal, 9, Cursor::Selected);
        // 0 + 9 = two years and one month on; year 4 is a leap year.
        assert_eq!(position(&cursors, Cursor::Selected), (4, Some(1), None));
        cursors.advance_month(&cal, -6, Cursor::Selected);
        // Month 3 of year 2.
        assert_eq!(position(&cursors, Cursor::Selected), (2, Some(3), None));
    }

    #[test]
    fn month_underflow_into_empty_month_keeps_moving_back() {
        let cal = calendar();
        let mut cursors = Cursors::at(2, 2, 0);
        cursors.advance_month(&cal, -5, Cursor::Visible);
        // Position 2 - 5 = -3: year 1, month 1 (empty), skipped back to month 0.
        assert_eq!(position(&cursors, Cursor::Visible), (1, Some(0), None));
    }

    #[test]
    fn visible_follows_current_month_changes() {
        let cal = calendar();
        let mut cursors = Cursors::at(1, 0, 0);
        cursors.advance_month(&cal, 2, Cursor::Visible);
        cursors.advance_month(&cal, 1, Cursor::Current);
        assert_eq!(position(&cursors, Cursor::Visible), (1, Some(2), None));
        // Selected is independent of current.
        assert_eq!(position(&cursors, Cursor::Selected), (1, Some(0), Some(0)));
    }

    #[test]
    fn day_overflow_carries_into_next_month_and_year() {
        let cal = calendar();
        let mut cursors = Cursors::at(1, 0, 8);
        cursors.advance_day(&cal, 3, DayCursor::Current);
        // Day 9 of Frost + 3 = day 2 of Bloom (Leapling is empty in year 1).
        assert_eq!(position(&cursors, Cursor::Current), (1, Some(2), Some(1)));
        cursors.advance_day(&cal, 19, DayCursor::Current);
        // Day 2 of Bloom + 19 = day 21 → Harvest day 9 → overflow to year 2 Frost day 1.
        assert_eq!(position(&cursors, Cursor::Current), (2, Some(0), Some(0)));
    }

    #[test]
    fn day_underflow_carries_back_across_year() {
        let cal = calendar();
        let mut cursors = Cursors::at(4, 0, 0);
        cursors.advance_day(&cal, -1, DayCursor::Selected);
        assert_eq!(position(&cursors, Cursor::Selected), (3, Some(3), Some(7)));
        cursors.advance_day(&cal, -8, DayCursor::Selected);
        assert_eq!(position(&cursors, Cursor::Selected), (3, Some(2), Some(11)));
    }

    #[test]
    fn day_moves_are_reversible() {
        let cal = calendar();
        let mut cursors = Cursors::at(3, 2, 5);
        for amount in [1_i64, 7, 30, 95, 400] {
            cursors.advance_day(&cal, amount, DayCursor::Current);
            cursors.advance_day(&cal, -amount, DayCursor::Current);
            assert_eq!(position(&cursors, Cursor::Current), (3, Some(2), Some(5)), "{amount}");
        }
    }

    #[test]
    fn long_day_moves_carry_whole_years() {
        let cal = calendar();
        // Four years hold 10 + 12 + 8 days three times plus one 33-day leap
        // year, so 123 days is a whole four-year cycle.
        let mut cursors = Cursors::at(1, 2, 5);
        cursors.advance_day(&cal, 1_230_000_000, DayCursor::Current);
        assert_eq!(position(&cursors, Cursor::Current), (40_000_001, Some(2), Some(5)));
        assert_eq!(position(&cursors, Cursor::Visible), (40_000_001, Some(2), None));
        cursors.advance_day(&cal, -123_000_000_000_000, DayCursor::Current);
        assert_eq!(
            position(&cursors, Cursor::Current),
            (-3_999_959_999_999, Some(2), Some(5))
        );
    }

    #[test]
    fn day_move_without_flagged_day_starts_at_day_one() {
        let cal = calendar();
        let mut cursors = Cursors::at(1, 0, 0);
        cursors.set(Cursor::Selected, CursorDate::new(1, 0, None));
        cursors.advance_day(&cal, 2, DayCursor::Selected);
        assert_eq!(position(&cursors, Cursor::Selected), (1, Some(0), Some(2)));
    }

    #[test]
    fn year_move_with_month_reset() {
        let cal = calendar();
        let mut cursors = Cursors::at(1, 2, 3);
        cursors.advance_year(&cal, 1, Cursor::Current, true);
        assert_eq!(position(&cursors, Cursor::Current), (2, Some(0), Some(0)));
        cursors.advance_year(&cal, -1, Cursor::Current, true);
        assert_eq!(position(&cursors, Cursor::Current), (1, Some(3), Some(7)));
    }

    #[test]
    fn year_move_out_of_leap_year_skips_vanishing_month() {
        let cal = calendar();
        let mut cursors = Cursors::at(4, 1, 2);
        cursors.advance_year(&cal, 1, Cursor::Selected, false);
        assert_eq!(position(&cursors, Cursor::Selected), (5, Some(2), Some(2)));
        let mut cursors = Cursors::at(4, 1, 2);
        cursors.advance_year(&cal, -1, Cursor::Current, false);
        assert_eq!(position(&cursors, Cursor::Current), (3, Some(0), Some(2)));
        assert_eq!(position(&cursors, Cursor::Visible), (3, Some(0), None));
    }

    #[test]
    fn set_month_clamps_and_wraps_negative() {
        let cal = calendar();
        let mut cursors = Cursors::at(1, 0, 0);
        cursors.set_month(&cal, -1, Cursor::Visible, false);
        assert_eq!(position(&cursors, Cursor::Visible), (1, Some(3), None));
        cursors.set_month(&cal, 99, Cursor::Visible, true);
        assert_eq!(position(&cursors, Cursor::Visible), (1, Some(3), None));
    }

    #[test]
    fn today_resets_selection_and_view() {
        let cal = calendar();
        let mut cursors = Cursors::at(1, 0, 3);
        cursors.advance_month(&cal, 5, Cursor::Visible);
        cursors.advance_day(&cal, 20, DayCursor::Selected);
        cursors.today();
        assert_eq!(cursors.get(Cursor::Selected), cursors.get(Cursor::Current));
        assert_eq!(position(&cursors, Cursor::Visible), (1, Some(0), None));
    }

    #[test]
    fn visible_cursor_never_holds_a_day() {
        let mut cursors = Cursors::at(1, 0, 3);
        cursors.set(Cursor::Visible, CursorDate::new(2, 1, Some(4)));
        assert_eq!(position(&cursors, Cursor::Visible), (2, Some(1), None));
    }
}
