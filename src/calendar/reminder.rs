use chrono::{Duration, NaiveDateTime};
use url::Url;

use super::{parse_date, parse_time};
use crate::errors::AppError;

const TEMPLATE_URL: &str = "https://calendar.google.com/calendar/render";
const STAMP_FORMAT: &str = "%Y%m%dT%H%M%S";
const DAY_FORMAT: &str = "%Y%m%d";

/// Builds an "add to calendar" template link.
///
/// Timed events last one hour; without a time the link carries an all-day
/// range ending on the following day. Times are floating local times, no
/// zone conversion happens.
pub fn reminder_link(
    title: &str,
    date: &str,
    time: Option<&str>,
    organizer: &str,
) -> Result<String, AppError> {
    let day = parse_date(date).ok_or_else(|| AppError::bad_request(format!("invalid date '{date}'")))?;
    let dates = match parse_time(time) {
        Some(at) => {
            let start = NaiveDateTime::new(day, at);
            let end = start + Duration::hours(1);
            format!("{}/{}", start.format(STAMP_FORMAT), end.format(STAMP_FORMAT))
        }
        None => {
            let next = day + Duration::days(1);
            format!("{}/{}", day.format(DAY_FORMAT), next.format(DAY_FORMAT))
        }
    };
    let details = format!("Organized by {organizer}");
    let url = Url::parse_with_params(
        TEMPLATE_URL,
        &[
            ("action", "TEMPLATE"),
            ("text", title),
            ("dates", dates.as_str()),
            ("details", details.as_str()),
        ],
    )
    .map_err(|_| AppError::InternalError)?;
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_pairs(link: &str) -> Vec<(String, String)> {
        Url::parse(link)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn timed_event_spans_one_hour() {
        let link = reminder_link("Chess night", "2024-12-31", Some("23:30"), "Chess Club").unwrap();
        assert!(link.starts_with(TEMPLATE_URL));
        let pairs = query_pairs(&link);
        assert!(pairs.contains(&("dates".into(), "20241231T233000/20250101T003000".into())));
        assert!(pairs.contains(&("text".into(), "Chess night".into())));
        assert!(pairs.contains(&("details".into(), "Organized by Chess Club".into())));
    }

    #[test]
    fn missing_time_is_all_day() {
        let link = reminder_link("Fair", "2024-02-29", None, "Global").unwrap();
        assert!(query_pairs(&link).contains(&("dates".into(), "20240229/20240301".into())));
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(matches!(
            reminder_link("x", "31/12/2024", None, "y"),
            Err(AppError::BadClientData { .. })
        ));
    }
}
