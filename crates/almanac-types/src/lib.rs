//! Shared type definitions for the Almanac calendar engine.
//!
//! This crate holds the values that cross crate boundaries: cursor and
//! unit selectors, resolved dates, the persisted authoritative record, and
//! the read-only projection handed to a presentation layer. Projection types
//! flow downstream to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for calendar identifiers
//! - [`enums`] -- Cursor, unit, clock and synchronization selectors
//! - [`date`] -- Resolved date/time values and the persisted record
//! - [`projection`] -- Snapshot structures for rendering

pub mod date;
pub mod enums;
pub mod ids;
pub mod projection;

// Re-export all public types at crate root for convenience.
pub use date::{CalendarDateTime, SavedDate};
pub use enums::{ClockStatus, Cursor, DayCursor, ReconcileOutcome, SyncMode, TimeUnit};
pub use ids::CalendarId;
pub use projection::{CalendarSnapshot, DateDisplay, DayCell, MonthView, MoonInfo, SeasonInfo};
