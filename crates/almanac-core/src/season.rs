//! Season resolution.
//!
//! Seasons are defined by the day they start on. There is no coverage
//! requirement: the season in effect on a date is the last one, in
//! definition order, whose start is on or before that date within the
//! year. Dates before every start fall back to the last defined season,
//! which is the one carried over from the end of the previous year.

use almanac_types::SeasonInfo;

/// Colour keyword that defers to [`Season::custom_color`].
pub const CUSTOM_COLOR: &str = "custom";

/// A season and the date it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Season {
    /// Display name.
    pub name: String,
    /// Colour name or hex value, or [`CUSTOM_COLOR`].
    pub color: String,
    /// Colour used when `color` is [`CUSTOM_COLOR`].
    pub custom_color: Option<String>,
    /// Ordinal of the month the season starts in.
    pub starting_month: u32,
    /// Day of that month the season starts on.
    pub starting_day: u32,
}

impl Season {
    /// A season starting on `starting_day` of month `starting_month`.
    pub fn new(
        name: impl Into<String>,
        color: impl Into<String>,
        starting_month: u32,
        starting_day: u32,
    ) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            custom_color: None,
            starting_month,
            starting_day,
        }
    }

    /// The colour to display, resolving [`CUSTOM_COLOR`].
    pub fn display_color(&self) -> &str {
        if self.color == CUSTOM_COLOR {
            self.custom_color.as_deref().unwrap_or_default()
        } else {
            &self.color
        }
    }

    /// Whether this season has started by `(month_ordinal, day)`.
    const fn started_by(&self, month_ordinal: u32, day: u32) -> bool {
        (self.starting_month == month_ordinal && self.starting_day <= day)
            || self.starting_month < month_ordinal
    }
}

/// The season in effect on `(month_ordinal, day)`.
///
/// Later matches override earlier ones, so seasons should be defined in
/// ascending start order for predictable results.
pub fn season_for(seasons: &[Season], month_ordinal: u32, day: u32) -> Option<&Season> {
    seasons
        .iter()
        .rev()
        .find(|s| s.started_by(month_ordinal, day))
        .or_else(|| seasons.last())
}

/// Display data for the season in effect; empty when there are no seasons.
pub fn resolve(seasons: &[Season], month_ordinal: u32, day: u32) -> SeasonInfo {
    season_for(seasons, month_ordinal, day).map_or_else(SeasonInfo::default, |s| SeasonInfo {
        name: s.name.clone(),
        color: s.display_color().to_owned(),
    })
}
