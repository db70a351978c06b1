//! Calendar arithmetic, navigation and world-clock sync for Almanac.
//!
//! This crate owns everything that happens behind a calendar view: turning
//! dates into linear days and seconds, moving the three cursors, resolving
//! moon phases and seasons, and reconciling the authoritative date with an
//! externally owned world clock.
//!
//! # Modules
//!
//! - [`calendar`] -- Calendar definition, day counting and weekday math.
//! - [`clock`] -- Real-time clock settings, run state and async driver.
//! - [`config`] -- Configuration loading from `almanac-config.yaml` into
//!   strongly-typed structs.
//! - [`engine`] -- [`CalendarEngine`], the per-calendar state handle.
//! - [`leap`] -- [`LeapYearRule`] trait and built-in rules.
//! - [`moon`] -- Moon cycles and phase resolution.
//! - [`navigation`] -- The current/selected/visible cursor state machine.
//! - [`projection`] -- Snapshots and month grids for a presentation layer.
//! - [`season`] -- Season lookup.
//! - [`sync`] -- [`SyncHost`] trait and echo-suppression state.
//! - [`time`] -- Clock units and time of day.
//!
//! [`CalendarEngine`]: engine::CalendarEngine
//! [`LeapYearRule`]: leap::LeapYearRule
//! [`SyncHost`]: sync::SyncHost

pub mod calendar;
pub mod clock;
pub mod config;
pub mod engine;
pub mod leap;
pub mod moon;
pub mod navigation;
pub mod projection;
pub mod season;
pub mod sync;
pub mod time;
