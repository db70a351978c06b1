//! Enumeration types for the Almanac calendar engine.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Cursors
// ---------------------------------------------------------------------------

/// One of the three independent date pointers tracked per calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Cursor {
    /// The authoritative date: persisted and broadcast to the host.
    Current,
    /// The date the user has focused in the UI.
    Selected,
    /// The month the UI is browsing.
    Visible,
}

/// A cursor that tracks a day as well as a month.
///
/// Day-level navigation is only meaningful for these two; the visible
/// cursor only ever points at a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum DayCursor {
    /// See [`Cursor::Current`].
    Current,
    /// See [`Cursor::Selected`].
    Selected,
}

impl From<DayCursor> for Cursor {
    fn from(cursor: DayCursor) -> Self {
        match cursor {
            DayCursor::Current => Self::Current,
            DayCursor::Selected => Self::Selected,
        }
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Unit of clock arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    /// One second.
    Second,
    /// One minute (configurable number of seconds).
    Minute,
    /// One hour (configurable number of minutes).
    Hour,
}

/// Run state of the real-time clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum ClockStatus {
    /// Not advancing; must be started explicitly.
    #[default]
    Stopped,
    /// Advancing on every update interval.
    Started,
    /// Temporarily halted (e.g. during combat); resumes to `Started`.
    Paused,
}

// ---------------------------------------------------------------------------
// Synchronization
// ---------------------------------------------------------------------------

/// How the engine's authoritative clock relates to the host's world clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// The engine is the arbiter; external changes only apply when they
    /// come from combat rounds.
    #[default]
    SelfAuthoritative,
    /// The engine defers entirely to the host clock.
    ThirdParty,
    /// Both: the engine arbitrates and also follows host changes.
    Mixed,
}

impl SyncMode {
    /// Whether the engine arbitrates combat-round time changes.
    pub const fn is_arbiter(self) -> bool {
        matches!(self, Self::SelfAuthoritative | Self::Mixed)
    }

    /// Whether the engine follows changes made by the host.
    pub const fn follows_host(self) -> bool {
        matches!(self, Self::ThirdParty | Self::Mixed)
    }
}

/// What an inbound world-time notification did to local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ReconcileOutcome {
    /// The notification carried a zero change.
    Unchanged,
    /// The notification echoed a change this engine issued itself.
    Echo,
    /// The new time was applied to the current cursor.
    Applied {
        /// Whether the merged date was handed to persistence.
        persisted: bool,
    },
    /// The notification was not applicable under the current mode.
    Ignored,
}
