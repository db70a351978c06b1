//! In-process stand-in for the host world clock and persistence layer.
//!
//! The engine talks to its host through a [`ChannelHost`]. This task sits
//! on the other end of that channel: it keeps the host's world time,
//! notifies the engine of every change exactly as a real host would
//! (including echoes of the engine's own pushes), and logs saved records.
//! Combat rounds advance the world clock from the host side and are
//! flagged on the engine first, so they take the combat-round path of
//! reconciliation.

use std::sync::Arc;
use std::time::Duration;

use almanac_core::engine::CalendarEngine;
use almanac_core::sync::{ChannelHost, HostCommand};
use almanac_types::ReconcileOutcome;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, info, warn};

/// Seconds a combat round advances the world clock.
pub const COMBAT_ROUND_SECONDS: i64 = 6;

/// The host's copy of the world time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldClock {
    total_seconds: i64,
}

impl WorldClock {
    /// A world clock at `total_seconds`.
    pub const fn new(total_seconds: i64) -> Self {
        Self { total_seconds }
    }

    /// Current world time.
    pub const fn total_seconds(&self) -> i64 {
        self.total_seconds
    }

    /// Set the world time, returning the signed change.
    pub const fn set(&mut self, total_seconds: i64) -> i64 {
        let delta = total_seconds.saturating_sub(self.total_seconds);
        self.total_seconds = total_seconds;
        delta
    }

    /// Advance by one combat round, returning the new time.
    pub const fn combat_round(&mut self) -> i64 {
        self.total_seconds = self.total_seconds.saturating_add(COMBAT_ROUND_SECONDS);
        self.total_seconds
    }
}

/// Notify the engine that the world clock changed.
async fn notify(
    engine: &Mutex<CalendarEngine>,
    host: &ChannelHost,
    total_seconds: i64,
    delta: i64,
) -> ReconcileOutcome {
    let outcome = engine
        .lock()
        .await
        .reconcile_from_external_time(total_seconds, delta, host);
    debug!(total_seconds, delta, ?outcome, "world time notification handled");
    outcome
}

/// Serve host commands until `shutdown` flips or the channel closes.
///
/// When `combat_every` is set, a combat round is played at that period.
pub async fn run(
    engine: Arc<Mutex<CalendarEngine>>,
    host: Arc<ChannelHost>,
    mut commands: mpsc::UnboundedReceiver<HostCommand>,
    mut world: WorldClock,
    combat_every: Option<Duration>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut combat = combat_every.map(tokio::time::interval);
    if let Some(interval) = combat.as_mut() {
        interval.tick().await;
    }
    info!(total_seconds = world.total_seconds(), "host world clock running");

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            command = commands.recv() => {
                match command {
                    Some(HostCommand::PushWorldTime { total_seconds, delta }) => {
                        let observed = world.set(total_seconds);
                        if observed != delta {
                            warn!(delta, observed, "pushed delta disagrees with host clock");
                        }
                        notify(&engine, &host, total_seconds, observed).await;
                    }
                    Some(HostCommand::Save(record)) => match serde_json::to_string(&record) {
                        Ok(json) => info!(record = %json, "authoritative date saved"),
                        Err(e) => warn!(error = %e, "failed to encode saved date"),
                    },
                    None => break,
                }
            }
            () = async {
                match combat.as_mut() {
                    Some(interval) => {
                        interval.tick().await;
                    }
                    None => std::future::pending::<()>().await,
                }
            } => {
                let total_seconds = world.combat_round();
                engine.lock().await.note_combat_round_change();
                let outcome = notify(&engine, &host, total_seconds, COMBAT_ROUND_SECONDS).await;
                info!(total_seconds, ?outcome, "combat round played");
            }
        }
    }
    info!(total_seconds = world.total_seconds(), "host world clock stopped");
}
