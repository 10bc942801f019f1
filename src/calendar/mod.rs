//! Month-grid projection of the shared event calendar.
//!
//! Everything here is pure: the same (cursor, events, today) always projects
//! the same grid, and nothing is cached between renders.

pub mod day;
pub mod reminder;
pub mod schedule;
pub mod view;

use std::collections::HashSet;

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime};
use log::debug;
use serde::Serialize;

use crate::models::Event;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// ISO `YYYY-MM-DD` key for a day; `month` is zero-based.
pub fn date_key(year: i32, month: u32, day: u32) -> String {
    format!("{:04}-{:02}-{:02}", year, month + 1, day)
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

/// `None` for absent, empty or malformed clock strings.
pub fn parse_time(raw: Option<&str>) -> Option<NaiveTime> {
    raw.map(str::trim)
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| NaiveTime::parse_from_str(raw, TIME_FORMAT).ok())
}

/// Calendar position: a year plus a zero-based month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthCursor {
    pub year: i32,
    pub month: u32,
}

impl MonthCursor {
    /// Months past 11 roll into following years.
    pub fn new(year: i32, month: u32) -> Self {
        MonthCursor { year, month: 0 }.advance(i64::from(month))
    }

    pub fn containing(date: NaiveDate) -> Self {
        MonthCursor {
            year: date.year(),
            month: date.month0(),
        }
    }

    /// The wall-clock month.
    pub fn today() -> Self {
        Self::containing(Local::now().date_naive())
    }

    /// Moves by `months` (negative goes back), rolling the year either way.
    /// Years are held inside the range chrono can represent.
    pub fn advance(self, months: i64) -> Self {
        let total = (i64::from(self.year) * 12 + i64::from(self.month)).saturating_add(months);
        let year = total.div_euclid(12);
        if year < i64::from(NaiveDate::MIN.year()) {
            return MonthCursor { year: NaiveDate::MIN.year(), month: 0 };
        }
        if year > i64::from(NaiveDate::MAX.year()) {
            return MonthCursor { year: NaiveDate::MAX.year(), month: 11 };
        }
        MonthCursor {
            year: year as i32,
            month: total.rem_euclid(12) as u32,
        }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
    }

    /// Day zero of the following month; December always has 31.
    pub fn days_in_month(&self) -> u32 {
        if self.month == 11 {
            return if self.first_day().is_some() { 31 } else { 0 };
        }
        match NaiveDate::from_ymd_opt(self.year, self.month + 2, 1) {
            Some(next_first) => (next_first - Duration::days(1)).day(),
            None => 0,
        }
    }

    /// Blank cells before the 1st; weeks start on Sunday.
    pub fn leading_blanks(&self) -> u32 {
        self.first_day()
            .map(|first| first.weekday().num_days_from_sunday())
            .unwrap_or(0)
    }

    pub fn label(&self) -> String {
        self.first_day()
            .map(|first| first.format("%B %Y").to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CalendarCell {
    Blank,
    Day(DayCell),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCell {
    pub day: u32,
    pub date: String,
    pub has_event: bool,
    pub is_today: bool,
}

/// One month's projection. [`MonthGrid::cells`] is lazy and can be
/// iterated any number of times.
#[derive(Debug, Clone)]
pub struct MonthGrid {
    cursor: MonthCursor,
    today: NaiveDate,
    event_dates: HashSet<String>,
}

impl MonthGrid {
    /// Scoping by club happens once here, not per cell. Events whose date
    /// does not parse never mark a cell.
    pub fn project(cursor: MonthCursor, events: &[Event], scope: Option<&str>, today: NaiveDate) -> Self {
        let event_dates = events
            .iter()
            .filter(|event| scope.map_or(true, |club_id| event.club_id == club_id))
            .filter(|event| {
                let valid = parse_date(&event.date).is_some();
                if !valid {
                    debug!("event '{}' has malformed date '{}'", event.id, event.date);
                }
                valid
            })
            .map(|event| event.date.clone())
            .collect();
        MonthGrid {
            cursor,
            today,
            event_dates,
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = CalendarCell> + '_ {
        let blanks = (0..self.cursor.leading_blanks()).map(|_| CalendarCell::Blank);
        let days = (1..=self.cursor.days_in_month()).map(move |day| {
            let date = date_key(self.cursor.year, self.cursor.month, day);
            let is_today = NaiveDate::from_ymd_opt(self.cursor.year, self.cursor.month + 1, day)
                == Some(self.today);
            CalendarCell::Day(DayCell {
                day,
                has_event: self.event_dates.contains(&date),
                date,
                is_today,
            })
        });
        blanks.chain(days)
    }

    pub fn view(&self) -> MonthView {
        MonthView {
            year: self.cursor.year,
            month: self.cursor.month,
            label: self.cursor.label(),
            cells: self.cells().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub cells: Vec<CalendarCell>,
}

#[cfg(test)]
pub(crate) fn event_on(id: &str, date: &str, time: Option<&str>, club_id: &str) -> Event {
    Event {
        id: id.to_string(),
        title: format!("event {id}"),
        date: date.to_string(),
        time: time.map(str::to_string),
        category: "social".to_string(),
        club_id: club_id.to_string(),
        club_name: club_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day_cells(grid: &MonthGrid) -> Vec<DayCell> {
        grid.cells()
            .filter_map(|cell| match cell {
                CalendarCell::Day(day) => Some(day),
                CalendarCell::Blank => None,
            })
            .collect()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn january_2024_has_one_blank_then_31_days() {
        let events = vec![event_on("e1", "2024-01-15", None, "global")];
        let grid = MonthGrid::project(MonthCursor::new(2024, 0), &events, None, ymd(2024, 3, 1));
        let cells: Vec<CalendarCell> = grid.cells().collect();

        assert_eq!(cells[0], CalendarCell::Blank);
        assert!(matches!(cells[1], CalendarCell::Day(ref d) if d.day == 1));
        let days = day_cells(&grid);
        assert_eq!(days.len(), 31);
        let marked: Vec<u32> = days.iter().filter(|d| d.has_event).map(|d| d.day).collect();
        assert_eq!(marked, vec![15]);
        assert_eq!(days[14].date, "2024-01-15");
    }

    #[test]
    fn every_month_has_blanks_for_weekday_then_its_days() {
        for year in [1900, 2000, 2023, 2024, 2100] {
            for month in 0..12 {
                let cursor = MonthCursor::new(year, month);
                let grid = MonthGrid::project(cursor, &[], None, ymd(2024, 1, 1));
                let first = ymd(year, month + 1, 1);
                let expected_days = match month + 1 {
                    2 if first.leap_year() => 29,
                    2 => 28,
                    4 | 6 | 9 | 11 => 30,
                    _ => 31,
                };
                let blanks = grid.cells().take_while(|c| *c == CalendarCell::Blank).count();
                assert_eq!(blanks as u32, first.weekday().num_days_from_sunday());
                assert_eq!(day_cells(&grid).len(), expected_days, "{year}-{month}");
            }
        }
    }

    #[test]
    fn advance_rolls_years_and_reverses() {
        let start = MonthCursor::new(2024, 10);
        assert_eq!(start.advance(3), MonthCursor { year: 2025, month: 1 });
        assert_eq!(start.advance(-11), MonthCursor { year: 2023, month: 11 });
        for n in [-500, -13, -12, -1, 0, 1, 12, 25, 1000] {
            assert_eq!(start.advance(n).advance(-n), start);
        }
        assert_eq!(MonthCursor::new(2024, 14), MonthCursor { year: 2025, month: 2 });
    }

    #[test]
    fn has_event_uses_exact_string_equality() {
        let events = vec![
            event_on("a", "2024-02-5", None, "global"),
            event_on("b", "not a date", None, "global"),
            event_on("c", "2024-02-29", Some("10:00"), "global"),
        ];
        let grid = MonthGrid::project(MonthCursor::new(2024, 1), &events, None, ymd(2000, 1, 1));
        let marked: Vec<String> = day_cells(&grid)
            .into_iter()
            .filter(|d| d.has_event)
            .map(|d| d.date)
            .collect();
        assert_eq!(marked, vec!["2024-02-29"]);
    }

    #[test]
    fn club_scope_hides_other_clubs() {
        let events = vec![
            event_on("a", "2024-03-01", None, "chess"),
            event_on("b", "2024-03-02", None, "go"),
        ];
        let cursor = MonthCursor::new(2024, 2);
        let scoped = MonthGrid::project(cursor, &events, Some("go"), ymd(2000, 1, 1));
        let marked: Vec<u32> = day_cells(&scoped).iter().filter(|d| d.has_event).map(|d| d.day).collect();
        assert_eq!(marked, vec![2]);

        let unscoped = MonthGrid::project(cursor, &events, None, ymd(2000, 1, 1));
        assert_eq!(day_cells(&unscoped).iter().filter(|d| d.has_event).count(), 2);
    }

    #[test]
    fn marks_today_and_restarts_cleanly() {
        let grid = MonthGrid::project(MonthCursor::new(2024, 6), &[], None, ymd(2024, 7, 4));
        let today: Vec<u32> = day_cells(&grid).iter().filter(|d| d.is_today).map(|d| d.day).collect();
        assert_eq!(today, vec![4]);
        assert_eq!(grid.cells().count(), grid.cells().count());

        let view = grid.view();
        assert_eq!(view.label, "July 2024");
        assert_eq!(view.cells.len(), grid.cells().count());
    }

    #[test]
    fn huge_offsets_stay_inside_the_calendar() {
        let far = MonthCursor::new(2024, 0).advance(i64::MAX);
        assert_eq!(far, MonthCursor { year: NaiveDate::MAX.year(), month: 11 });
        let early = MonthCursor::new(2024, 0).advance(i64::MIN);
        assert_eq!(early, MonthCursor { year: NaiveDate::MIN.year(), month: 0 });

        for cursor in [far, early, MonthCursor::new(300_000, 0), MonthCursor::new(-300_000, 5)] {
            let grid = MonthGrid::project(cursor, &[], None, ymd(2024, 1, 1));
            assert_eq!(day_cells(&grid).len(), 31, "{cursor:?}");
            assert!(!grid.view().label.is_empty());
        }
    }
}
