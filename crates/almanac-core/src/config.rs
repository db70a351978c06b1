//! Configuration loading and typed config structures.
//!
//! A calendar is described in YAML (`almanac-config.yaml` by default).
//! Every field has a default, so an empty document yields a Gregorian
//! twelve-month calendar with seven weekdays, four seasons and one moon.
//! [`AlmanacConfig::build_engine`] turns the document into a validated
//! [`CalendarEngine`]; every configuration inconsistency is reported there
//! rather than left to drift at runtime.

use std::num::NonZeroU32;
use std::path::Path;
use std::sync::Arc;

use almanac_types::{CalendarDateTime, SyncMode};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::calendar::{Calendar, CalendarError, Month, Weekday, YearDisplay, YearNameBehaviour};
use crate::clock::ClockSettings;
use crate::engine::CalendarEngine;
use crate::leap::{LeapRule, LeapYearRule};
use crate::moon::{FirstNewMoon, Moon, MoonPhase, YearReset};
use crate::season::Season;
use crate::time::{TimeError, TimeUnits};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is present but unusable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },

    /// The clock units are unusable.
    #[error("time config: {source}")]
    Time {
        /// The underlying time error.
        #[from]
        source: TimeError,
    },

    /// The calendar shape is unusable.
    #[error("calendar config: {source}")]
    Calendar {
        /// The underlying calendar error.
        #[from]
        source: CalendarError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AlmanacConfig {
    /// Calendar shape and starting date.
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// Clock units.
    #[serde(default)]
    pub time: TimeConfig,

    /// World-clock integration.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Real-time clock pacing.
    #[serde(default)]
    pub clock: ClockConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AlmanacConfig {
    /// Load configuration from a YAML file.
    ///
    /// Environment variables override YAML values:
    /// - `ALMANAC_SYNC_MODE` overrides `sync.mode`
    /// - `ALMANAC_PRIMARY` overrides `sync.primary`
    /// - `ALMANAC_LOG_LEVEL` overrides `logging.level`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config = Self::parse_without_env(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string, ignoring the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse_without_env(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit; treat it as all defaults.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override selected values with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Some(mode) = std::env::var("ALMANAC_SYNC_MODE")
            .ok()
            .and_then(|v| parse_sync_mode(&v))
        {
            self.sync.mode = mode;
        }
        if let Some(primary) = std::env::var("ALMANAC_PRIMARY")
            .ok()
            .and_then(|v| v.trim().parse::<bool>().ok())
        {
            self.sync.primary = primary;
        }
        if let Ok(val) = std::env::var("ALMANAC_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Validate the document and assemble the calendar it describes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first inconsistency found.
    pub fn build_calendar(&self) -> Result<Calendar, ConfigError> {
        let units = TimeUnits::new(
            self.time.seconds_per_minute,
            self.time.minutes_per_hour,
            self.time.hours_per_day,
        )?;
        let cal = &self.calendar;
        let months = cal
            .months
            .iter()
            .zip(1_u32..)
            .map(|(month, position)| month.to_month(position))
            .collect();
        let weekdays = cal.weekdays.iter().map(Weekday::new).collect();
        let rule = cal.leap_year.to_rule()?;
        let moons = cal
            .moons
            .iter()
            .map(MoonConfig::to_moon)
            .collect::<Result<Vec<_>, _>>()?;

        let calendar = Calendar::new(cal.name.clone(), months, weekdays, rule, units)?
            .with_first_weekday(cal.first_weekday)?
            .with_seasons(cal.seasons.iter().map(SeasonConfig::to_season).collect())
            .with_moons(moons)?
            .with_year_display(cal.year.to_display());
        Ok(calendar)
    }

    /// Validate the document and start an engine on its current date.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the calendar is inconsistent or the
    /// current date does not exist in it.
    pub fn build_engine(&self) -> Result<CalendarEngine, ConfigError> {
        let calendar = self.build_calendar()?;
        let current = &self.calendar.current;
        let start = CalendarDateTime::date(current.year, current.month, current.day).at(
            current.hour,
            current.minute,
            current.second,
        );
        let clock = ClockSettings {
            game_time_ratio: self.clock.game_time_ratio,
            update_frequency: self.clock.update_frequency,
            unify_with_combat: self.clock.unify_with_combat,
        };
        if clock.update_frequency == 0 {
            return Err(ConfigError::Invalid {
                reason: "clock.update_frequency must be at least 1".to_owned(),
            });
        }
        Ok(CalendarEngine::new(calendar, &start, self.sync.mode, clock)?)
    }
}

fn parse_sync_mode(value: &str) -> Option<SyncMode> {
    match value.trim().to_ascii_lowercase().as_str() {
        "self_authoritative" | "self" => Some(SyncMode::SelfAuthoritative),
        "third_party" => Some(SyncMode::ThirdParty),
        "mixed" => Some(SyncMode::Mixed),
        _ => None,
    }
}

/// Calendar shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CalendarConfig {
    /// Human-readable calendar name.
    #[serde(default = "default_calendar_name")]
    pub name: String,

    /// Months in calendar order.
    #[serde(default = "default_months")]
    pub months: Vec<MonthConfig>,

    /// Weekday names in cycle order.
    #[serde(default = "default_weekdays")]
    pub weekdays: Vec<String>,

    /// Weekday index of the first day of year 0.
    #[serde(default = "default_first_weekday")]
    pub first_weekday: usize,

    /// Leap-year rule.
    #[serde(default)]
    pub leap_year: LeapYearConfig,

    /// Year formatting.
    #[serde(default)]
    pub year: YearConfig,

    /// Seasons, in ascending start order.
    #[serde(default = "default_seasons")]
    pub seasons: Vec<SeasonConfig>,

    /// Moons.
    #[serde(default = "default_moons")]
    pub moons: Vec<MoonConfig>,

    /// The authoritative date at startup.
    #[serde(default)]
    pub current: CurrentDateConfig,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            name: default_calendar_name(),
            months: default_months(),
            weekdays: default_weekdays(),
            first_weekday: default_first_weekday(),
            leap_year: LeapYearConfig::default(),
            year: YearConfig::default(),
            seasons: default_seasons(),
            moons: default_moons(),
            current: CurrentDateConfig::default(),
        }
    }
}

/// One month.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MonthConfig {
    /// Display name.
    pub name: String,

    /// Short name; the first three letters when omitted.
    #[serde(default)]
    pub abbreviation: Option<String>,

    /// Ordinal; the month's position (1-based) when omitted.
    #[serde(default)]
    pub ordinal: Option<u32>,

    /// Length in normal years.
    pub days: u32,

    /// Length in leap years; `days` when omitted.
    #[serde(default)]
    pub leap_days: Option<u32>,

    /// Excluded from day totals and the weekday cycle.
    #[serde(default)]
    pub intercalary: bool,

    /// Counted despite being intercalary.
    #[serde(default)]
    pub intercalary_include: bool,
}

impl MonthConfig {
    fn new(name: &str, days: u32) -> Self {
        Self {
            name: name.to_owned(),
            abbreviation: None,
            ordinal: None,
            days,
            leap_days: None,
            intercalary: false,
            intercalary_include: false,
        }
    }

    fn to_month(&self, position: u32) -> Month {
        let mut month = Month::new(self.name.clone(), self.ordinal.unwrap_or(position), self.days)
            .with_leap_days(self.leap_days.unwrap_or(self.days));
        if let Some(abbreviation) = &self.abbreviation {
            month.abbreviation.clone_from(abbreviation);
        }
        if self.intercalary {
            month = month.intercalary(self.intercalary_include);
        }
        month
    }
}

/// Kind of leap-year rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeapRuleKind {
    /// No leap years.
    None,
    /// Every 4 years except centuries not divisible by 400.
    #[default]
    Gregorian,
    /// Every `modulus` years.
    Custom,
}

/// Leap-year rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LeapYearConfig {
    /// Which rule to use.
    #[serde(default)]
    pub rule: LeapRuleKind,

    /// Period of the custom rule.
    #[serde(default = "default_leap_modulus")]
    pub modulus: u32,
}

impl Default for LeapYearConfig {
    fn default() -> Self {
        Self {
            rule: LeapRuleKind::default(),
            modulus: default_leap_modulus(),
        }
    }
}

impl LeapYearConfig {
    fn to_rule(self) -> Result<Arc<dyn LeapYearRule>, ConfigError> {
        let rule = match self.rule {
            LeapRuleKind::None => LeapRule::None,
            LeapRuleKind::Gregorian => LeapRule::Gregorian,
            LeapRuleKind::Custom => {
                LeapRule::Modulus(NonZeroU32::new(self.modulus).ok_or_else(|| ConfigError::Invalid {
                    reason: "leap_year.modulus must be at least 1 for a custom rule".to_owned(),
                })?)
            }
        };
        Ok(Arc::new(rule))
    }
}

/// Year formatting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct YearConfig {
    /// Text before the year number.
    #[serde(default)]
    pub prefix: String,

    /// Text after the year number.
    #[serde(default)]
    pub postfix: String,

    /// Names assigned to consecutive years.
    #[serde(default)]
    pub names: Vec<String>,

    /// Year receiving the first name.
    #[serde(default)]
    pub names_start: i64,

    /// `default` or `repeat`.
    #[serde(default)]
    pub names_behaviour: YearNamesBehaviourConfig,
}

/// How years outside the name list are named.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearNamesBehaviourConfig {
    /// Clamp to the first/last name.
    #[default]
    Default,
    /// Cycle through the names.
    Repeat,
}

impl YearConfig {
    fn to_display(&self) -> YearDisplay {
        YearDisplay {
            prefix: self.prefix.clone(),
            postfix: self.postfix.clone(),
            names: self.names.clone(),
            names_start: self.names_start,
            behaviour: match self.names_behaviour {
                YearNamesBehaviourConfig::Default => YearNameBehaviour::Default,
                YearNamesBehaviourConfig::Repeat => YearNameBehaviour::Repeat,
            },
        }
    }
}

/// One season.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeasonConfig {
    /// Display name.
    pub name: String,

    /// Colour, or `custom` to use `custom_color`.
    #[serde(default)]
    pub color: String,

    /// Colour used when `color` is `custom`.
    #[serde(default)]
    pub custom_color: Option<String>,

    /// Ordinal of the starting month.
    pub starting_month: u32,

    /// Starting day of that month.
    pub starting_day: u32,
}

impl SeasonConfig {
    fn to_season(&self) -> Season {
        Season {
            name: self.name.clone(),
            color: self.color.clone(),
            custom_color: self.custom_color.clone(),
            starting_month: self.starting_month,
            starting_day: self.starting_day,
        }
    }
}

/// One moon.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MoonConfig {
    /// Display name.
    pub name: String,

    /// Display colour.
    #[serde(default = "default_moon_color")]
    pub color: String,

    /// Days per cycle.
    pub cycle_length: Decimal,

    /// Shift of the position within the cycle.
    #[serde(default)]
    pub cycle_day_adjust: Decimal,

    /// Phases in cycle order.
    #[serde(default = "default_phases")]
    pub phases: Vec<PhaseConfig>,

    /// Reference new moon.
    #[serde(default)]
    pub first_new_moon: FirstNewMoonConfig,
}

impl MoonConfig {
    fn to_moon(&self) -> Result<Moon, ConfigError> {
        Ok(Moon {
            name: self.name.clone(),
            color: self.color.clone(),
            cycle_length: self.cycle_length,
            cycle_day_adjust: self.cycle_day_adjust,
            phases: self
                .phases
                .iter()
                .map(|p| MoonPhase::new(p.name.clone(), p.single_day, p.icon.clone()))
                .collect(),
            first_new_moon: self.first_new_moon.to_first_new_moon(&self.name)?,
        })
    }
}

/// One moon phase.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PhaseConfig {
    /// Display name.
    pub name: String,

    /// Whether the phase lasts exactly one day.
    #[serde(default)]
    pub single_day: bool,

    /// Icon key.
    #[serde(default)]
    pub icon: String,
}

/// Reference re-anchoring policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearResetConfig {
    /// Never re-anchor.
    #[default]
    None,
    /// Re-anchor every leap year.
    LeapYear,
    /// Re-anchor every `year_x` years.
    XYears,
}

/// Reference new moon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FirstNewMoonConfig {
    /// Re-anchoring policy.
    #[serde(default)]
    pub year_reset: YearResetConfig,

    /// Period for `x_years`.
    #[serde(default)]
    pub year_x: u32,

    /// Year of the reference new moon.
    #[serde(default)]
    pub year: i64,

    /// Month ordinal of the reference new moon.
    #[serde(default = "default_one")]
    pub month: u32,

    /// Day of the reference new moon.
    #[serde(default = "default_one")]
    pub day: u32,
}

impl Default for FirstNewMoonConfig {
    fn default() -> Self {
        Self {
            year_reset: YearResetConfig::None,
            year_x: 0,
            year: 0,
            month: 1,
            day: 1,
        }
    }
}

impl FirstNewMoonConfig {
    fn to_first_new_moon(self, moon: &str) -> Result<FirstNewMoon, ConfigError> {
        let year_reset = match self.year_reset {
            YearResetConfig::None => YearReset::None,
            YearResetConfig::LeapYear => YearReset::LeapYear,
            YearResetConfig::XYears => {
                let every = NonZeroU32::new(self.year_x).ok_or_else(|| ConfigError::Invalid {
                    reason: format!("moon {moon}: first_new_moon.year_x must be at least 1"),
                })?;
                YearReset::EveryXYears(every)
            }
        };
        Ok(FirstNewMoon {
            year_reset,
            year: self.year,
            month: self.month,
            day: self.day,
        })
    }
}

/// The authoritative date at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CurrentDateConfig {
    /// Year.
    #[serde(default = "default_current_year")]
    pub year: i64,
    /// Month ordinal.
    #[serde(default = "default_one")]
    pub month: u32,
    /// Day of the month.
    #[serde(default = "default_one")]
    pub day: u32,
    /// Hour.
    #[serde(default)]
    pub hour: u32,
    /// Minute.
    #[serde(default)]
    pub minute: u32,
    /// Second.
    #[serde(default)]
    pub second: u32,
}

impl Default for CurrentDateConfig {
    fn default() -> Self {
        Self {
            year: default_current_year(),
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }
}

/// Clock units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimeConfig {
    /// Seconds in a minute.
    #[serde(default = "default_sixty")]
    pub seconds_per_minute: u32,
    /// Minutes in an hour.
    #[serde(default = "default_sixty")]
    pub minutes_per_hour: u32,
    /// Hours in a day.
    #[serde(default = "default_hours_per_day")]
    pub hours_per_day: u32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            seconds_per_minute: 60,
            minutes_per_hour: 60,
            hours_per_day: default_hours_per_day(),
        }
    }
}

/// World-clock integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SyncConfig {
    /// How the engine relates to the host clock.
    #[serde(default)]
    pub mode: SyncMode,
    /// Whether this process is the elected writer.
    #[serde(default = "default_true")]
    pub primary: bool,
    /// Whether the local user may change the authoritative date.
    #[serde(default = "default_true")]
    pub elevated: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mode: SyncMode::default(),
            primary: true,
            elevated: true,
        }
    }
}

/// Real-time clock pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ClockConfig {
    /// Game seconds per real second.
    #[serde(default = "default_one")]
    pub game_time_ratio: u32,
    /// Real seconds between updates.
    #[serde(default = "default_one")]
    pub update_frequency: u32,
    /// Pause while combat is running.
    #[serde(default = "default_true")]
    pub unify_with_combat: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            game_time_ratio: 1,
            update_frequency: 1,
            unify_with_combat: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

fn default_calendar_name() -> String {
    "Gregorian".to_owned()
}

fn default_months() -> Vec<MonthConfig> {
    let mut months: Vec<MonthConfig> = [
        ("January", 31),
        ("February", 28),
        ("March", 31),
        ("April", 30),
        ("May", 31),
        ("June", 30),
        ("July", 31),
        ("August", 31),
        ("September", 30),
        ("October", 31),
        ("November", 30),
        ("December", 31),
    ]
    .iter()
    .map(|(name, days)| MonthConfig::new(name, *days))
    .collect();
    if let Some(february) = months.get_mut(1) {
        february.leap_days = Some(29);
    }
    months
}

fn default_weekdays() -> Vec<String> {
    [
        "Sunday",
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
    ]
    .iter()
    .map(|s| (*s).to_owned())
    .collect()
}

/// The proleptic Gregorian 1 January of year 0 is a Saturday.
const fn default_first_weekday() -> usize {
    6
}

const fn default_leap_modulus() -> u32 {
    4
}

fn default_seasons() -> Vec<SeasonConfig> {
    [
        ("Spring", "#fffce8", 3, 20),
        ("Summer", "#f3fff3", 6, 21),
        ("Fall", "#fff7f2", 9, 22),
        ("Winter", "#f2f8ff", 12, 21),
    ]
    .iter()
    .map(|(name, color, month, day)| SeasonConfig {
        name: (*name).to_owned(),
        color: (*color).to_owned(),
        custom_color: None,
        starting_month: *month,
        starting_day: *day,
    })
    .collect()
}

fn default_moons() -> Vec<MoonConfig> {
    vec![MoonConfig {
        name: "Moon".to_owned(),
        color: default_moon_color(),
        cycle_length: Decimal::new(2_953_059, 5),
        cycle_day_adjust: Decimal::ZERO,
        phases: default_phases(),
        first_new_moon: FirstNewMoonConfig {
            year_reset: YearResetConfig::None,
            year_x: 0,
            year: 2000,
            month: 1,
            day: 6,
        },
    }]
}

fn default_moon_color() -> String {
    "#ffffff".to_owned()
}

fn default_phases() -> Vec<PhaseConfig> {
    [
        ("New Moon", true, "new"),
        ("Waxing Crescent", false, "waxing-crescent"),
        ("First Quarter", true, "first-quarter"),
        ("Waxing Gibbous", false, "waxing-gibbous"),
        ("Full Moon", true, "full"),
        ("Waning Gibbous", false, "waning-gibbous"),
        ("Last Quarter", true, "last-quarter"),
        ("Waning Crescent", false, "waning-crescent"),
    ]
    .iter()
    .map(|(name, single_day, icon)| PhaseConfig {
        name: (*name).to_owned(),
        single_day: *single_day,
        icon: (*icon).to_owned(),
    })
    .collect()
}

const fn default_current_year() -> i64 {
    2024
}

const fn default_one() -> u32 {
    1
}

const fn default_sixty() -> u32 {
    60
}

const fn default_hours_per_day() -> u32 {
    24
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use almanac_types::Cursor;

    use super::*;

    #[test]
    fn default_config_builds_a_gregorian_engine() {
        let engine = AlmanacConfig::default().build_engine().unwrap();
        let calendar = engine.calendar();
        assert_eq!(calendar.months().len(), 12);
        assert_eq!(calendar.total_days_in_year(false, false), 365);
        assert_eq!(calendar.total_days_in_year(true, false), 366);
        assert!(calendar.is_leap_year(2024));
        // 1 January 2024 was a Monday.
        assert_eq!(calendar.day_of_week(2024, 1, 1), 1);
        assert_eq!(engine.cursor(Cursor::Current).year, 2024);
        assert_eq!(engine.current_season().name, "Winter");
        assert_eq!(engine.current_moons().len(), 1);
    }

    #[test]
    fn default_moon_is_new_on_its_reference_date() {
        let engine = AlmanacConfig::default().build_engine().unwrap();
        let phases = engine.moons_for(2000, 1, 6);
        assert_eq!(phases[0].phase, "New Moon");
        let phases = engine.moons_for(2000, 1, 21);
        assert_eq!(phases[0].phase, "Full Moon");
    }

    #[test]
    fn empty_yaml_is_all_defaults() {
        let config = AlmanacConfig::parse_without_env("").unwrap();
        assert_eq!(config, AlmanacConfig::default());
    }

    #[test]
    fn parse_custom_calendar() {
        let yaml = r"
calendar:
  name: Harptos
  months:
    - { name: Hammer, days: 30 }
    - { name: Midwinter, days: 1, intercalary: true }
    - { name: Alturiak, days: 30 }
    - { name: Shieldmeet, days: 0, leap_days: 1, intercalary: true }
  weekdays: [One, Two, Three, Four, Five, Six, Seven, Eight, Nine, Ten]
  first_weekday: 0
  leap_year: { rule: custom, modulus: 4 }
  year: { postfix: ' DR', names: [Ash, Birch], names_start: 1490, names_behaviour: repeat }
  seasons:
    - { name: Winter, color: custom, custom_color: '#0000ff', starting_month: 1, starting_day: 1 }
  moons:
    - name: Selune
      cycle_length: 30.4375
      phases:
        - { name: New, single_day: true }
        - { name: Waxing }
        - { name: Full, single_day: true }
        - { name: Waning }
      first_new_moon: { year_reset: x_years, year_x: 4, month: 1, day: 1 }
  current: { year: 1491, month: 3, day: 5, hour: 9 }
time: { seconds_per_minute: 60, minutes_per_hour: 60, hours_per_day: 24 }
sync: { mode: mixed, primary: false }
clock: { game_time_ratio: 10, update_frequency: 5 }
logging: { level: debug }
";
        let config = AlmanacConfig::parse_without_env(yaml).unwrap();
        assert_eq!(config.sync.mode, SyncMode::Mixed);
        assert!(!config.sync.primary);
        assert_eq!(config.logging.level, "debug");
        let engine = config.build_engine().unwrap();
        let calendar = engine.calendar();
        assert_eq!(calendar.months()[1].ordinal, 2);
        assert!(calendar.months()[1].intercalary);
        assert_eq!(calendar.total_days_in_year(false, false), 60);
        assert_eq!(calendar.total_days_in_year(true, true), 62);
        assert_eq!(calendar.year_display().format(1491), "1491 DR (Birch)");
        assert_eq!(engine.current_season().color, "#0000ff");
        assert_eq!(engine.current_date(), CalendarDateTime::date(1491, 3, 5).at(9, 0, 0));
        assert_eq!(engine.clock().seconds_per_update(), 50);
        let phases = &calendar.moons()[0].phases;
        assert_eq!(phases[1].length, Decimal::new(1_421_875, 5));
    }

    #[test]
    fn rejects_zero_time_units() {
        let config = AlmanacConfig::parse_without_env("time: { hours_per_day: 0 }").unwrap();
        assert!(matches!(config.build_engine(), Err(ConfigError::Time { .. })));
    }

    #[test]
    fn rejects_zero_leap_modulus() {
        let yaml = "calendar: { leap_year: { rule: custom, modulus: 0 } }";
        let config = AlmanacConfig::parse_without_env(yaml).unwrap();
        assert!(matches!(config.build_engine(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn rejects_zero_year_x() {
        let yaml = r"
calendar:
  moons:
    - { name: Broken, cycle_length: 10, first_new_moon: { year_reset: x_years } }
";
        let config = AlmanacConfig::parse_without_env(yaml).unwrap();
        let err = config.build_engine().unwrap_err();
        assert!(err.to_string().contains("year_x"), "{err}");
    }

    #[test]
    fn rejects_moon_with_too_many_single_days() {
        let yaml = r"
calendar:
  moons:
    - name: Tiny
      cycle_length: 1.5
      phases: [{ name: A, single_day: true }, { name: B, single_day: true }]
";
        let config = AlmanacConfig::parse_without_env(yaml).unwrap();
        assert!(matches!(
            config.build_engine(),
            Err(ConfigError::Calendar {
                source: CalendarError::Moon { .. }
            })
        ));
    }

    #[test]
    fn rejects_out_of_range_first_weekday() {
        let config = AlmanacConfig::parse_without_env("calendar: { first_weekday: 7 }").unwrap();
        assert!(matches!(
            config.build_engine(),
            Err(ConfigError::Calendar {
                source: CalendarError::FirstWeekday { .. }
            })
        ));
    }

    #[test]
    fn rejects_current_date_outside_month() {
        let yaml = "calendar: { current: { year: 2023, month: 2, day: 29 } }";
        let config = AlmanacConfig::parse_without_env(yaml).unwrap();
        assert!(matches!(
            config.build_engine(),
            Err(ConfigError::Calendar {
                source: CalendarError::InvalidDate { .. }
            })
        ));
    }

    #[test]
    fn rejects_calendar_without_months() {
        let config = AlmanacConfig::parse_without_env("calendar: { months: [] }").unwrap();
        assert!(matches!(
            config.build_engine(),
            Err(ConfigError::Calendar {
                source: CalendarError::NoMonths
            })
        ));
    }

    #[test]
    fn sync_mode_names() {
        assert_eq!(parse_sync_mode("third_party"), Some(SyncMode::ThirdParty));
        assert_eq!(parse_sync_mode(" Mixed "), Some(SyncMode::Mixed));
        assert_eq!(parse_sync_mode("self"), Some(SyncMode::SelfAuthoritative));
        assert_eq!(parse_sync_mode("nope"), None);
    }

    #[test]
    fn load_example_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("almanac-config.yaml");
        let config = AlmanacConfig::from_file(&path).unwrap();
        assert!(config.build_engine().is_ok());
    }
}
