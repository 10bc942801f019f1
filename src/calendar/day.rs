use std::cmp::Ordering;

use chrono::NaiveTime;

use super::parse_time;
use crate::models::Event;

/// Sort key for an optional clock time: timed entries first, earliest
/// first, then every all-day entry. Blank or unparseable times count as
/// all-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimeKey {
    At(NaiveTime),
    AllDay,
}

impl TimeKey {
    pub fn of(time: Option<&str>) -> Self {
        match parse_time(time) {
            Some(at) => TimeKey::At(at),
            None => TimeKey::AllDay,
        }
    }
}

pub fn compare_times(a: Option<&str>, b: Option<&str>) -> Ordering {
    TimeKey::of(a).cmp(&TimeKey::of(b))
}

/// Events whose date string equals `date_key`, in day order. The sort is
/// stable, so equal times keep their input order.
pub fn events_on<'a>(date_key: &str, events: &'a [Event]) -> Vec<&'a Event> {
    let mut day: Vec<&Event> = events.iter().filter(|event| event.date == date_key).collect();
    day.sort_by(|a, b| compare_times(a.time.as_deref(), b.time.as_deref()));
    day
}
