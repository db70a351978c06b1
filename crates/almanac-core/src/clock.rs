//! Real-time clock: advances the authoritative time while started.
//!
//! Every update interval the clock moves the engine's time forward by
//! `update_frequency * game_time_ratio` seconds. It is stopped until
//! started explicitly. When `unify_with_combat` is set, combat pauses a
//! running clock and the end of combat resumes it; a clock that was
//! stopped or paused by hand is left alone.
//!
//! [`run`] is the async driver. It owns no state of its own: it locks the
//! shared engine once per interval and exits when the shutdown signal
//! flips.

use std::sync::Arc;
use std::time::Duration;

use almanac_types::ClockStatus;
use tokio::sync::{Mutex, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::engine::CalendarEngine;
use crate::sync::SyncHost;

/// How the real-time clock paces game time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSettings {
    /// Game seconds per real second.
    pub game_time_ratio: u32,
    /// Real seconds between updates.
    pub update_frequency: u32,
    /// Pause while combat is running.
    pub unify_with_combat: bool,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            game_time_ratio: 1,
            update_frequency: 1,
            unify_with_combat: true,
        }
    }
}

/// Run state of the real-time clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RealTimeClock {
    settings: ClockSettings,
    status: ClockStatus,
    paused_by_combat: bool,
}

impl RealTimeClock {
    /// A stopped clock.
    pub const fn new(settings: ClockSettings) -> Self {
        Self {
            settings,
            status: ClockStatus::Stopped,
            paused_by_combat: false,
        }
    }

    /// Pacing settings.
    pub const fn settings(&self) -> &ClockSettings {
        &self.settings
    }

    /// Current run state.
    pub const fn status(&self) -> ClockStatus {
        self.status
    }

    /// Whether the next update will advance time.
    pub const fn is_running(&self) -> bool {
        matches!(self.status, ClockStatus::Started)
    }

    /// Game seconds added per update.
    pub fn seconds_per_update(&self) -> i64 {
        i64::from(self.settings.update_frequency)
            .saturating_mul(i64::from(self.settings.game_time_ratio))
    }

    /// Real time between updates.
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.settings.update_frequency.max(1)))
    }

    /// Start (or resume) the clock.
    pub fn start(&mut self) {
        self.status = ClockStatus::Started;
        self.paused_by_combat = false;
        info!("real-time clock started");
    }

    /// Stop the clock.
    pub fn stop(&mut self) {
        self.status = ClockStatus::Stopped;
        self.paused_by_combat = false;
        info!("real-time clock stopped");
    }

    /// Pause a running clock.
    pub fn pause(&mut self) {
        if self.is_running() {
            self.status = ClockStatus::Paused;
            info!("real-time clock paused");
        }
    }

    /// Resume a paused clock.
    pub fn resume(&mut self) {
        if self.status == ClockStatus::Paused {
            self.status = ClockStatus::Started;
            self.paused_by_combat = false;
            info!("real-time clock resumed");
        }
    }

    /// Combat began.
    pub fn combat_started(&mut self) {
        if self.settings.unify_with_combat && self.is_running() {
            self.pause();
            self.paused_by_combat = true;
        }
    }

    /// Combat ended.
    pub fn combat_ended(&mut self) {
        if self.paused_by_combat {
            self.resume();
        }
    }
}

/// Drive the engine's real-time clock every `period` until `shutdown`
/// becomes `true` or its sender is dropped.
pub async fn run(
    engine: Arc<Mutex<CalendarEngine>>,
    host: Arc<dyn SyncHost>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;
    info!(period_ms = period.as_millis(), "real-time clock loop running");

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = interval.tick() => {
                let mut engine = engine.lock().await;
                match engine.tick_clock(host.as_ref()) {
                    Ok(true) => debug!(seconds = engine.world_seconds(), "clock advanced"),
                    Ok(false) => {}
                    Err(e) => warn!(error = %e, "clock update rejected"),
                }
            }
        }
    }
    info!("real-time clock loop stopped");
}
