//! Reconciliation with an externally owned world clock.
//!
//! Both this engine and the host can change "the current time". The host
//! side is reached through [`SyncHost`]; pushes and saves are
//! fire-and-forget, so local state is always updated before the host hears
//! about it and nothing is rolled back if the host later fails.
//!
//! # Echo suppression
//!
//! [`SyncState`] carries two reentrancy flags. `time_change_triggered` is
//! raised before every push the engine makes, so that the host's echo of
//! that push is recognised and not applied a second time.
//! `combat_change_triggered` marks that the next notification comes from a
//! combat round, which the engine applies even when it is the arbiter. Both
//! flags are cleared at the end of every notification, whatever branch was
//! taken.
//!
//! # Single writer
//!
//! Only the process for which [`SyncHost::is_primary_authority`] holds
//! persists a reconciled date; every other process applies it locally.

use std::sync::atomic::{AtomicBool, Ordering};

use almanac_types::{ReconcileOutcome, SavedDate, SyncMode};
use tokio::sync::mpsc;
use tracing::debug;

use crate::calendar::CalendarError;

/// Errors reported by a host collaborator.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The host is no longer accepting commands.
    #[error("host channel closed: {reason}")]
    Closed {
        /// What was being sent when the channel was found closed.
        reason: String,
    },
}

/// Errors raised by operations that change the authoritative date.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The acting user may not change the authoritative date.
    #[error("only an elevated user may change the current date")]
    NotPermitted,

    /// The requested date does not exist in the calendar.
    #[error("invalid date: {source}")]
    InvalidDate {
        /// The underlying calendar error.
        #[from]
        source: CalendarError,
    },
}

/// The external collaborators of the engine.
///
/// Implementations must not block: pushes and saves are queued and their
/// outcome is only ever logged by the engine.
pub trait SyncHost: Send + Sync {
    /// Push a new authoritative time to the host's world clock.
    ///
    /// `delta` is the signed change from the previous value.
    fn push_world_time(&self, total_seconds: i64, delta: i64) -> Result<(), HostError>;

    /// Persist the authoritative date.
    fn save_authoritative_date(&self, record: SavedDate) -> Result<(), HostError>;

    /// Whether this process is the single elected writer.
    fn is_primary_authority(&self) -> bool;

    /// Whether the acting user may change the authoritative date.
    fn is_elevated_user(&self) -> bool;
}

/// What a notification handler should do with an inbound time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    /// Nothing changed.
    Unchanged,
    /// The notification echoes the engine's own push.
    Echo,
    /// Apply the new time to the current cursor.
    Apply,
    /// Not applicable under the current mode.
    Ignore,
}

/// Integration mode and reentrancy flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncState {
    mode: SyncMode,
    time_change_triggered: bool,
    combat_change_triggered: bool,
}

impl SyncState {
    /// Fresh state with both flags clear.
    pub const fn new(mode: SyncMode) -> Self {
        Self {
            mode,
            time_change_triggered: false,
            combat_change_triggered: false,
        }
    }

    /// The integration mode.
    pub const fn mode(&self) -> SyncMode {
        self.mode
    }

    /// Change the integration mode.
    pub const fn set_mode(&mut self, mode: SyncMode) {
        self.mode = mode;
    }

    /// Whether the next notification is expected to echo a local push.
    pub const fn time_change_triggered(&self) -> bool {
        self.time_change_triggered
    }

    /// Whether the next notification comes from a combat round.
    pub const fn combat_change_triggered(&self) -> bool {
        self.combat_change_triggered
    }

    /// Raise the local-change flag. Called before every push.
    pub const fn mark_time_change(&mut self) {
        self.time_change_triggered = true;
    }

    /// Raise the combat-round flag.
    pub const fn mark_combat_change(&mut self) {
        self.combat_change_triggered = true;
    }

    /// Clear both flags.
    pub const fn clear(&mut self) {
        self.time_change_triggered = false;
        self.combat_change_triggered = false;
    }

    /// Decide how to handle a notification carrying `change_amount`.
    ///
    /// Arbiter modes apply combat-round changes and recognise their own
    /// echoes; host-following modes apply anything that is not an echo.
    pub const fn decide(&self, change_amount: i64) -> SyncDecision {
        if change_amount == 0 {
            return SyncDecision::Unchanged;
        }
        if self.mode.is_arbiter() && (self.time_change_triggered || self.combat_change_triggered) {
            return if self.time_change_triggered {
                SyncDecision::Echo
            } else {
                SyncDecision::Apply
            };
        }
        if self.mode.follows_host() && !self.time_change_triggered {
            return SyncDecision::Apply;
        }
        if self.time_change_triggered {
            SyncDecision::Echo
        } else {
            SyncDecision::Ignore
        }
    }
}

impl SyncDecision {
    /// The outcome reported for this decision.
    pub const fn outcome(self, persisted: bool) -> ReconcileOutcome {
        match self {
            Self::Unchanged => ReconcileOutcome::Unchanged,
            Self::Echo => ReconcileOutcome::Echo,
            Self::Apply => ReconcileOutcome::Applied { persisted },
            Self::Ignore => ReconcileOutcome::Ignored,
        }
    }
}

/// A command queued for the host by [`ChannelHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// Set the host world clock.
    PushWorldTime {
        /// New total seconds.
        total_seconds: i64,
        /// Signed change from the previous value.
        delta: i64,
    },
    /// Persist the authoritative date.
    Save(SavedDate),
}

/// A host reached over an unbounded tokio channel.
///
/// Sends never block and never wait for the host; the receiving task
/// applies commands in order.
#[derive(Debug)]
pub struct ChannelHost {
    tx: mpsc::UnboundedSender<HostCommand>,
    primary: AtomicBool,
    elevated: AtomicBool,
}

impl ChannelHost {
    /// Create a host and the receiver its commands arrive on.
    pub fn new(primary: bool, elevated: bool) -> (Self, mpsc::UnboundedReceiver<HostCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let host = Self {
            tx,
            primary: AtomicBool::new(primary),
            elevated: AtomicBool::new(elevated),
        };
        (host, rx)
    }

    /// Change whether this process is the elected writer.
    pub fn set_primary(&self, primary: bool) {
        self.primary.store(primary, Ordering::Release);
    }

    /// Change whether the acting user is elevated.
    pub fn set_elevated(&self, elevated: bool) {
        self.elevated.store(elevated, Ordering::Release);
    }

    fn send(&self, command: HostCommand) -> Result<(), HostError> {
        self.tx.send(command).map_err(|e| HostError::Closed {
            reason: format!("{:?}", e.0),
        })
    }
}

impl SyncHost for ChannelHost {
    fn push_world_time(&self, total_seconds: i64, delta: i64) -> Result<(), HostError> {
        self.send(HostCommand::PushWorldTime {
            total_seconds,
            delta,
        })
    }

    fn save_authoritative_date(&self, record: SavedDate) -> Result<(), HostError> {
        self.send(HostCommand::Save(record))
    }

    fn is_primary_authority(&self) -> bool {
        self.primary.load(Ordering::Acquire)
    }

    fn is_elevated_user(&self) -> bool {
        self.elevated.load(Ordering::Acquire)
    }
}

/// A host for an engine running on its own: pushes and saves go nowhere,
/// and the process is both primary and elevated.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedHost;

impl SyncHost for DetachedHost {
    fn push_world_time(&self, total_seconds: i64, delta: i64) -> Result<(), HostError> {
        debug!(total_seconds, delta, "detached host dropped world time push");
        Ok(())
    }

    fn save_authoritative_date(&self, record: SavedDate) -> Result<(), HostError> {
        debug!(calendar = %record.calendar_id, "detached host dropped save");
        Ok(())
    }

    fn is_primary_authority(&self) -> bool {
        true
    }

    fn is_elevated_user(&self) -> bool {
        true
    }
}
