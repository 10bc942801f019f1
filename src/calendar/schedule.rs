use chrono::NaiveDate;

use super::{day::TimeKey, parse_date};
use crate::models::InterestMark;

/// Orders a user's interest marks by date, then time. Missing times sort
/// after the timed entries of the same day, as in the day detail view.
/// Marks with unparseable dates go last.
pub fn sort_schedule(marks: &mut [InterestMark]) {
    marks.sort_by_key(|mark| schedule_key(mark));
}

fn schedule_key(mark: &InterestMark) -> (bool, Option<NaiveDate>, TimeKey) {
    let date = parse_date(&mark.date);
    (date.is_none(), date, TimeKey::of(mark.time.as_deref()))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn mark(id: &str, date: &str, time: Option<&str>) -> InterestMark {
        InterestMark {
            id: id.to_string(),
            event_id: id.to_string(),
            title: id.to_string(),
            date: date.to_string(),
            time: time.map(str::to_string),
            saved_at: Utc::now(),
        }
    }

    #[test]
    fn sorts_by_date_then_time_with_all_day_last() {
        let mut marks = vec![
            mark("broken", "someday", Some("08:00")),
            mark("feb-allday", "2024-02-01", None),
            mark("jan-late", "2024-01-20", Some("19:00")),
            mark("feb-morning", "2024-02-01", Some("09:00")),
            mark("jan-early", "2024-01-20", Some("07:30")),
        ];
        sort_schedule(&mut marks);
        let ids: Vec<&str> = marks.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["jan-early", "jan-late", "feb-morning", "feb-allday", "broken"]
        );
    }
}
