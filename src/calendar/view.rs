use std::collections::HashSet;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use super::{day::events_on, parse_date, MonthCursor, MonthGrid, MonthView};
use crate::models::Event;

/// State owned by one calendar view: where it is looking, which club it is
/// scoped to, and the last event snapshot it was handed. A view lives as
/// long as the request or live stream that created it.
#[derive(Debug, Clone)]
pub struct CalendarView {
    cursor: MonthCursor,
    scope: Option<String>,
    events: Vec<Event>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    #[serde(flatten)]
    pub event: Event,
    pub interested: bool,
    pub can_edit: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayDetail {
    pub date: String,
    pub label: String,
    pub can_add: bool,
    pub events: Vec<DayEntry>,
}

impl CalendarView {
    pub fn new(cursor: MonthCursor, scope: Option<String>) -> Self {
        CalendarView {
            cursor,
            scope,
            events: Vec::new(),
        }
    }

    pub fn cursor(&self) -> MonthCursor {
        self.cursor
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Replaces the cached events wholesale; deliveries are never merged.
    pub fn apply_snapshot(&mut self, events: Vec<Event>) {
        self.events = events;
    }

    pub fn advance(&mut self, months: i64) {
        self.cursor = self.cursor.advance(months);
    }

    pub fn reset_to_today(&mut self) {
        self.cursor = MonthCursor::today();
    }

    pub fn render(&self) -> MonthView {
        self.render_at(Local::now().date_naive())
    }

    pub fn render_at(&self, today: NaiveDate) -> MonthView {
        MonthGrid::project(self.cursor, &self.events, self.scope(), today).view()
    }

    /// Scoped events on one day, timed first.
    pub fn day(&self, date_key: &str) -> Vec<&Event> {
        let mut day = events_on(date_key, &self.events);
        if let Some(club_id) = self.scope() {
            day.retain(|event| event.club_id == club_id);
        }
        day
    }

    /// Day detail annotated for one viewer. `can_edit` decides per event
    /// whether the viewer may change it.
    pub fn day_detail<F>(
        &self,
        date_key: &str,
        interested: &HashSet<String>,
        can_add: bool,
        can_edit: F,
    ) -> DayDetail
    where
        F: Fn(&Event) -> bool,
    {
        let label = parse_date(date_key)
            .map(|date| date.format("%a, %b %-d").to_string())
            .unwrap_or_else(|| date_key.to_string());
        let events = self
            .day(date_key)
            .into_iter()
            .map(|event| DayEntry {
                interested: interested.contains(&event.id),
                can_edit: can_edit(event),
                event: event.clone(),
            })
            .collect();
        DayDetail {
            date: date_key.to_string(),
            label,
            can_add,
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{event_on, CalendarCell};

    fn marked_days(view: &MonthView) -> Vec<u32> {
        view.cells
            .iter()
            .filter_map(|cell| match cell {
                CalendarCell::Day(day) if day.has_event => Some(day.day),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn snapshots_replace_rather_than_merge() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut view = CalendarView::new(MonthCursor::new(2024, 0), None);
        view.apply_snapshot(vec![event_on("a", "2024-01-03", None, "global")]);
        assert_eq!(marked_days(&view.render_at(today)), vec![3]);

        view.apply_snapshot(vec![event_on("b", "2024-01-09", None, "global")]);
        assert_eq!(marked_days(&view.render_at(today)), vec![9]);
    }

    #[test]
    fn navigation_moves_the_cursor() {
        let mut view = CalendarView::new(MonthCursor::new(2024, 0), None);
        view.advance(-1);
        assert_eq!(view.cursor(), MonthCursor::new(2023, 11));
        view.advance(1);
        assert_eq!(view.cursor(), MonthCursor::new(2024, 0));
        view.reset_to_today();
        assert_eq!(view.cursor(), MonthCursor::today());
    }

    #[test]
    fn day_detail_flags_interest_and_edit_rights() {
        let mut view = CalendarView::new(MonthCursor::new(2024, 0), Some("chess".to_string()));
        view.apply_snapshot(vec![
            event_on("a", "2024-01-15", None, "chess"),
            event_on("b", "2024-01-15", Some("10:00"), "chess"),
            event_on("c", "2024-01-15", Some("09:00"), "go"),
        ]);
        let interested: HashSet<String> = ["a".to_string()].into_iter().collect();
        let detail = view.day_detail("2024-01-15", &interested, true, |event| event.id == "b");

        assert_eq!(detail.label, "Mon, Jan 15");
        let summary: Vec<(&str, bool, bool)> = detail
            .events
            .iter()
            .map(|entry| (entry.event.id.as_str(), entry.interested, entry.can_edit))
            .collect();
        assert_eq!(summary, vec![("b", false, true), ("a", true, false)]);
    }
}
