//! The calendar engine: one explicit handle per calendar.
//!
//! [`CalendarEngine`] owns a [`Calendar`] definition together with its
//! mutable state: the three cursors, the authoritative time of day, the
//! synchronization flags and the real-time clock. Nothing is global;
//! several engines can coexist in one process.
//!
//! # Authoritative changes
//!
//! Operations on the current cursor (and on the time of day) change the
//! authoritative date. They are only allowed for elevated users, update
//! local state first, then raise the local-change flag and push the new
//! world time to the host before handing the date to persistence. The
//! selected and visible cursors are browsing state and never reach the
//! host.

use almanac_types::{
    CalendarDateTime, Cursor, DayCursor, MoonInfo, ReconcileOutcome, SavedDate, SeasonInfo,
    SyncMode, TimeUnit,
};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::calendar::{Calendar, CalendarError};
use crate::clock::{ClockSettings, RealTimeClock};
use crate::navigation::{CursorDate, Cursors};
use crate::season;
use crate::sync::{SyncDecision, SyncError, SyncHost, SyncState};
use crate::time::Time;

/// A calendar definition and its cursor, clock and sync state.
#[derive(Debug, Clone)]
pub struct CalendarEngine {
    calendar: Calendar,
    cursors: Cursors,
    time: Time,
    sync: SyncState,
    clock: RealTimeClock,
}

impl CalendarEngine {
    /// Start an engine with every cursor on `start`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidDate`] if `start` does not exist in
    /// the calendar.
    pub fn new(
        calendar: Calendar,
        start: &CalendarDateTime,
        mode: SyncMode,
        clock: ClockSettings,
    ) -> Result<Self, CalendarError> {
        let (month, day) = calendar.resolve_date(start)?;
        let units = *calendar.units();
        let mut time = Time::midnight(units);
        time.set_seconds_of_day(units.to_seconds(start.hour, start.minute, start.second));
        info!(
            calendar = %calendar.id(),
            name = calendar.name(),
            year = start.year,
            month = start.month,
            day = start.day,
            ?mode,
            "calendar engine started"
        );
        Ok(Self {
            cursors: Cursors::at(start.year, month, day),
            calendar,
            time,
            sync: SyncState::new(mode),
            clock: RealTimeClock::new(clock),
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The calendar definition.
    pub const fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// All three cursors.
    pub const fn cursors(&self) -> &Cursors {
        &self.cursors
    }

    /// One cursor's position.
    pub const fn cursor(&self, cursor: Cursor) -> &CursorDate {
        self.cursors.get(cursor)
    }

    /// The authoritative time of day.
    pub const fn time(&self) -> &Time {
        &self.time
    }

    /// Integration mode and reentrancy flags.
    pub const fn sync_state(&self) -> &SyncState {
        &self.sync
    }

    /// Change the integration mode.
    pub const fn set_sync_mode(&mut self, mode: SyncMode) {
        self.sync.set_mode(mode);
    }

    /// The real-time clock.
    pub const fn clock(&self) -> &RealTimeClock {
        &self.clock
    }

    /// The real-time clock, for start/stop/pause.
    pub const fn clock_mut(&mut self) -> &mut RealTimeClock {
        &mut self.clock
    }

    // -----------------------------------------------------------------------
    // Reading dates
    // -----------------------------------------------------------------------

    /// A cursor's date; `None` when it has no flagged day. Only the
    /// current cursor carries a time of day.
    pub fn date_of(&self, cursor: Cursor) -> Option<CalendarDateTime> {
        let date = self.cursors.get(cursor);
        let month = self.calendar.months().get(date.month?)?;
        let mut resolved = CalendarDateTime::date(date.year, month.ordinal, date.day_number()?);
        if cursor == Cursor::Current {
            resolved = resolved.at(self.time.hour(), self.time.minute(), self.time.second());
        }
        Some(resolved)
    }

    /// The authoritative date and time.
    pub fn current_date(&self) -> CalendarDateTime {
        self.date_of(Cursor::Current).unwrap_or_else(|| {
            let date = self.cursors.get(Cursor::Current);
            let ordinal = self.calendar.months().first().map_or(1, |m| m.ordinal);
            CalendarDateTime::date(date.year, ordinal, 1)
        })
    }

    /// The authoritative instant as total seconds.
    pub fn world_seconds(&self) -> i64 {
        self.calendar.date_to_seconds(&self.current_date())
    }

    /// The record handed to persistence.
    pub fn saved_date(&self) -> SavedDate {
        SavedDate {
            calendar_id: self.calendar.id(),
            date: self.current_date(),
            world_seconds: self.world_seconds(),
            saved_at: Utc::now(),
        }
    }

    /// Season in effect on a day of the year.
    pub fn season_for(&self, month_ordinal: u32, day: u32) -> SeasonInfo {
        season::resolve(self.calendar.seasons(), month_ordinal, day)
    }

    /// Season of the current date.
    pub fn current_season(&self) -> SeasonInfo {
        let date = self.current_date();
        self.season_for(date.month, date.day)
    }

    /// Phase of every moon on a date.
    pub fn moons_for(&self, year: i64, month_ordinal: u32, day: u32) -> Vec<MoonInfo> {
        self.calendar
            .moons()
            .iter()
            .filter_map(|moon| moon.info_for(&self.calendar, year, month_ordinal, day))
            .collect()
    }

    /// Phase of every moon on the current date.
    pub fn current_moons(&self) -> Vec<MoonInfo> {
        let date = self.current_date();
        self.moons_for(date.year, date.month, date.day)
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Add years to a cursor. See [`Cursors::advance_year`].
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotPermitted`] when moving the current cursor
    /// without an elevated user.
    pub fn advance_year(
        &mut self,
        amount: i64,
        cursor: Cursor,
        also_advance_month: bool,
        host: &dyn SyncHost,
    ) -> Result<(), SyncError> {
        self.navigate(cursor, host, |cursors, calendar| {
            cursors.advance_year(calendar, amount, cursor, also_advance_month);
        })
    }

    /// Add months to a cursor. See [`Cursors::advance_month`].
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotPermitted`] when moving the current cursor
    /// without an elevated user.
    pub fn advance_month(
        &mut self,
        amount: i64,
        cursor: Cursor,
        host: &dyn SyncHost,
    ) -> Result<(), SyncError> {
        self.navigate(cursor, host, |cursors, calendar| {
            cursors.advance_month(calendar, amount, cursor);
        })
    }

    /// Add days to the current or selected cursor. See
    /// [`Cursors::advance_day`].
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotPermitted`] when moving the current cursor
    /// without an elevated user.
    pub fn advance_day(
        &mut self,
        amount: i64,
        cursor: DayCursor,
        host: &dyn SyncHost,
    ) -> Result<(), SyncError> {
        self.navigate(cursor.into(), host, |cursors, calendar| {
            cursors.advance_day(calendar, amount, cursor);
        })
    }

    /// Move the authoritative clock by `amount` of `unit` (negative to go
    /// back), carrying whole days into the current cursor.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotPermitted`] without an elevated user.
    pub fn advance_time(
        &mut self,
        unit: TimeUnit,
        amount: i64,
        host: &dyn SyncHost,
    ) -> Result<(), SyncError> {
        if !host.is_elevated_user() {
            return Err(SyncError::NotPermitted);
        }
        self.sync.mark_time_change();
        self.commit(host, |engine| {
            let days = engine.time.advance(unit, amount);
            if days != 0 {
                debug!(days, "time overflowed into the date");
                engine.cursors.advance_day(&engine.calendar, days, DayCursor::Current);
            }
        })
    }

    /// Set the authoritative date and time explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotPermitted`] without an elevated user, or
    /// [`SyncError::InvalidDate`] if the date does not exist.
    pub fn set_current_date(
        &mut self,
        date: &CalendarDateTime,
        host: &dyn SyncHost,
    ) -> Result<(), SyncError> {
        let (month, day) = self.calendar.resolve_date(date)?;
        self.commit(host, |engine| {
            engine
                .cursors
                .set(Cursor::Current, CursorDate::new(date.year, month, Some(day)));
            let seconds = engine
                .calendar
                .units()
                .to_seconds(date.hour, date.minute, date.second);
            engine.time.set_seconds_of_day(seconds);
        })
    }

    /// Focus a day.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidDate`] if the day does not exist.
    pub fn select_day(
        &mut self,
        year: i64,
        month_ordinal: u32,
        day: u32,
    ) -> Result<(), CalendarError> {
        let (month, day) = self
            .calendar
            .resolve_date(&CalendarDateTime::date(year, month_ordinal, day))?;
        self.cursors.set(Cursor::Selected, CursorDate::new(year, month, Some(day)));
        Ok(())
    }

    /// Reset the selected and visible cursors to the current date.
    pub const fn today(&mut self) {
        self.cursors.today();
    }

    fn navigate(
        &mut self,
        cursor: Cursor,
        host: &dyn SyncHost,
        change: impl FnOnce(&mut Cursors, &Calendar),
    ) -> Result<(), SyncError> {
        if cursor == Cursor::Current {
            return self.commit(host, |engine| change(&mut engine.cursors, &engine.calendar));
        }
        change(&mut self.cursors, &self.calendar);
        Ok(())
    }

    /// Apply an authoritative change, push it to the host and persist it.
    fn commit(
        &mut self,
        host: &dyn SyncHost,
        change: impl FnOnce(&mut Self),
    ) -> Result<(), SyncError> {
        if !host.is_elevated_user() {
            return Err(SyncError::NotPermitted);
        }
        let before = self.world_seconds();
        change(self);
        let after = self.world_seconds();
        let delta = after.saturating_sub(before);
        if delta != 0 {
            self.sync.mark_time_change();
            if let Err(e) = host.push_world_time(after, delta) {
                warn!(error = %e, total_seconds = after, "world time push failed");
            }
        }
        self.persist(host);
        Ok(())
    }

    fn persist(&self, host: &dyn SyncHost) -> bool {
        match host.save_authoritative_date(self.saved_date()) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "saving the authoritative date failed");
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // World time sync
    // -----------------------------------------------------------------------

    /// Mark the next notification as coming from a combat round.
    pub const fn note_combat_round_change(&mut self) {
        self.sync.mark_combat_change();
    }

    /// Handle a notification that the host's world clock changed by
    /// `change_amount` to `new_total_seconds`.
    ///
    /// Applied times replace the current cursor and time of day; the
    /// primary process then persists the result. Both reentrancy flags are
    /// cleared whatever happens.
    pub fn reconcile_from_external_time(
        &mut self,
        new_total_seconds: i64,
        change_amount: i64,
        host: &dyn SyncHost,
    ) -> ReconcileOutcome {
        let decision = self.sync.decide(change_amount);
        let mut persisted = false;
        match decision {
            SyncDecision::Apply => {
                self.apply_world_seconds(new_total_seconds);
                if host.is_primary_authority() {
                    persisted = self.persist(host);
                }
                info!(
                    total_seconds = new_total_seconds,
                    change_amount,
                    persisted,
                    "applied external world time"
                );
            }
            SyncDecision::Echo => {
                debug!(total_seconds = new_total_seconds, "ignoring echo of local time change");
            }
            SyncDecision::Ignore => {
                info!(
                    total_seconds = new_total_seconds,
                    change_amount,
                    mode = ?self.sync.mode(),
                    "external world time change ignored"
                );
            }
            SyncDecision::Unchanged => {}
        }
        self.sync.clear();
        decision.outcome(persisted)
    }

    /// Replace the current date and time of day with a world-seconds value.
    fn apply_world_seconds(&mut self, total_seconds: i64) {
        let date = self.calendar.seconds_to_date(total_seconds);
        match self.calendar.resolve_date(&date) {
            Ok((month, day)) => {
                self.cursors
                    .set(Cursor::Current, CursorDate::new(date.year, month, Some(day)));
                let seconds = self
                    .calendar
                    .units()
                    .to_seconds(date.hour, date.minute, date.second);
                self.time.set_seconds_of_day(seconds);
            }
            Err(e) => warn!(error = %e, total_seconds, "world time does not resolve to a date"),
        }
    }

    // -----------------------------------------------------------------------
    // Real-time clock
    // -----------------------------------------------------------------------

    /// Advance the authoritative time by one clock update if the clock is
    /// running. Returns whether time moved.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotPermitted`] without an elevated user.
    pub fn tick_clock(&mut self, host: &dyn SyncHost) -> Result<bool, SyncError> {
        if !self.clock.is_running() {
            return Ok(false);
        }
        let seconds = self.clock.seconds_per_update();
        self.advance_time(TimeUnit::Second, seconds, host)?;
        Ok(true)
    }

    /// Combat began; pauses a unified clock.
    pub fn combat_started(&mut self) {
        self.clock.combat_started();
    }

    /// Combat ended; resumes a clock paused by combat.
    pub fn combat_ended(&mut self) {
        self.clock.combat_ended();
    }
}
