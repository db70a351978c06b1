//! Snapshot building for a presentation layer.
//!
//! Turns engine state into the read-only structures of
//! [`almanac_types::projection`]. Month grids lay a month's days out in
//! rows of one cell per weekday, starting at the weekday of the month's
//! first day; cells before the first day and after the last are `None`.

use almanac_types::{CalendarSnapshot, Cursor, DateDisplay, DayCell, MonthView};

use crate::engine::CalendarEngine;

/// Everything a calendar view needs, captured now.
pub fn snapshot(engine: &CalendarEngine) -> CalendarSnapshot {
    let visible = engine.cursor(Cursor::Visible);
    let current = engine.cursor(Cursor::Current);
    let visible_month = visible.month.or(current.month).unwrap_or(0);
    CalendarSnapshot {
        calendar_id: engine.calendar().id(),
        calendar_name: engine.calendar().name().to_owned(),
        current: display(engine, Cursor::Current).unwrap_or_else(|| fallback_display(engine)),
        selected: display(engine, Cursor::Selected),
        visible: month_view(engine, visible.year, visible_month),
        time: engine.time().display(),
        season: engine.current_season(),
        moons: engine.current_moons(),
        clock_status: engine.clock().status(),
    }
}

/// Display strings for a cursor with a flagged day.
pub fn display(engine: &CalendarEngine, cursor: Cursor) -> Option<DateDisplay> {
    let date = engine.date_of(cursor)?;
    let calendar = engine.calendar();
    let month = calendar.month_by_ordinal(date.month)?;
    let weekday_name = calendar
        .weekdays()
        .get(calendar.day_of_week(date.year, date.month, date.day))
        .map(|w| w.name.clone())
        .unwrap_or_default();
    let year_display = calendar.year_display().format(date.year);
    Some(DateDisplay {
        year: date.year,
        text: format!("{} {}, {year_display}", month.name, date.day),
        year_display,
        month_name: month.name.clone(),
        day: date.day,
        weekday_name,
    })
}

fn fallback_display(engine: &CalendarEngine) -> DateDisplay {
    let date = engine.current_date();
    let year_display = engine.calendar().year_display().format(date.year);
    DateDisplay {
        year: date.year,
        text: year_display.clone(),
        year_display,
        month_name: String::new(),
        day: date.day,
        weekday_name: String::new(),
    }
}

/// The month at position `month` of `year` as a week grid.
pub fn month_view(engine: &CalendarEngine, year: i64, month: usize) -> MonthView {
    let calendar = engine.calendar();
    let Some(definition) = calendar.months().get(month) else {
        return MonthView {
            year,
            year_display: calendar.year_display().format(year),
            month_name: String::new(),
            month_ordinal: 0,
            intercalary: false,
            weekday_headings: Vec::new(),
            weeks: Vec::new(),
        };
    };

    let week_length = calendar.weekdays().len().max(1);
    let offset = calendar.day_of_week(year, definition.ordinal, 1);
    let current = flagged_day(engine, Cursor::Current, year, month);
    let selected = flagged_day(engine, Cursor::Selected, year, month);

    let mut cells: Vec<Option<DayCell>> = vec![None; offset];
    for number in 1..=calendar.days_in_month(month, year) {
        cells.push(Some(DayCell {
            number,
            current: current == Some(number),
            selected: selected == Some(number),
            moons: engine.moons_for(year, definition.ordinal, number),
        }));
    }
    let padding = cells.len().next_multiple_of(week_length).saturating_sub(cells.len());
    cells.extend(std::iter::repeat_n(None, padding));
    let weeks = cells.chunks(week_length).map(<[_]>::to_vec).collect();

    MonthView {
        year,
        year_display: calendar.year_display().format(year),
        month_name: definition.name.clone(),
        month_ordinal: definition.ordinal,
        intercalary: definition.intercalary,
        weekday_headings: calendar.weekdays().iter().map(|w| w.name.clone()).collect(),
        weeks,
    }
}

/// The 1-based day a cursor flags in the given month, if any.
fn flagged_day(engine: &CalendarEngine, cursor: Cursor, year: i64, month: usize) -> Option<u32> {
    let date = engine.cursor(cursor);
    if date.year == year && date.month == Some(month) {
        date.day_number()
    } else {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use almanac_types::{CalendarDateTime, SyncMode};

    use super::*;
    use crate::calendar::{Calendar, Month, Weekday, YearDisplay};
    use crate::clock::ClockSettings;
    use crate::leap::LeapRule;
    use crate::season::Season;
    use crate::time::TimeUnits;

    fn engine() -> CalendarEngine {
        let months = vec![Month::new("First", 1, 15), Month::new("Second", 2, 16)];
        let weekdays = (1..=5).map(|i| Weekday::new(format!("Day{i}"))).collect();
        let units = TimeUnits::standard();
        let calendar = Calendar::with_rule("Pair", months, weekdays, LeapRule::None, units)
            .unwrap()
            .with_seasons(vec![Season::new("Dry", "#ffcc00", 1, 1)])
            .with_year_display(YearDisplay {
                postfix: " AR".to_owned(),
                ..YearDisplay::default()
            });
        CalendarEngine::new(
            calendar,
            &CalendarDateTime::date(3, 2, 4).at(6, 30, 0),
            SyncMode::SelfAuthoritative,
            ClockSettings::default(),
        )
        .unwrap()
    }

    #[test]
    fn snapshot_describes_current_date() {
        let snapshot = snapshot(&engine());
        assert_eq!(snapshot.current.text, "Second 4, 3 AR");
        assert_eq!(snapshot.current.month_name, "Second");
        assert_eq!(snapshot.time, "06:30:00");
        assert_eq!(snapshot.season.name, "Dry");
        assert!(snapshot.moons.is_empty());
        assert_eq!(snapshot.selected.as_ref().map(|s| s.day), Some(4));
    }

    #[test]
    fn month_grid_starts_at_first_weekday() {
        let engine = engine();
        // Year 3 starts on linear day 94: (94 - 1) mod 5 = 3. Month 2 starts
        // 15 days later, at weekday 3.
        let view = month_view(&engine, 3, 1);
        assert_eq!(view.weekday_headings.len(), 5);
        let first_row = &view.weeks[0];
        assert!(first_row[..3].iter().all(Option::is_none));
        assert_eq!(first_row[3].as_ref().unwrap().number, 1);
        // 3 padding + 16 days = 19 cells, padded to 20.
        assert_eq!(view.weeks.len(), 4);
        assert!(view.weeks.iter().all(|w| w.len() == 5));
        assert!(view.weeks[3][4].is_none());
        let flagged: Vec<_> = view.weeks.iter().flatten().flatten().filter(|c| c.current).collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].number, 4);
    }

    #[test]
    fn other_months_have_no_flags() {
        let view = month_view(&engine(), 3, 0);
        assert!(view.weeks.iter().flatten().flatten().all(|c| !c.current && !c.selected));
    }

    #[test]
    fn unknown_month_yields_empty_view() {
        let view = month_view(&engine(), 3, 9);
        assert!(view.weeks.is_empty());
        assert_eq!(view.month_ordinal, 0);
    }

    #[test]
    fn snapshot_serializes_for_the_presentation_layer() {
        let json = serde_json::to_value(snapshot(&engine())).unwrap();
        assert_eq!(json["clock_status"], "stopped");
        assert_eq!(json["visible"]["month_name"], "Second");
    }
}
