use std::collections::HashSet;

use futures::stream::{self, Stream};
use log::debug;

use crate::{
   calendar::{
      parse_date,
      schedule::sort_schedule,
      view::{CalendarView, DayDetail},
      MonthCursor, MonthView,
   },
   db::{self, DocumentStore, Filter, Store, Subscription},
   dto::CalendarQuery,
   errors::AppError,
   models::{Event, InterestMark, GLOBAL_SCOPE},
};

use super::{access::{self, Capabilities}, auth::UserAuthData, interest};

/// Cursor named by the query (current month for missing parts), moved by `offset`.
pub fn cursor_for(query: &CalendarQuery) -> MonthCursor {
   let today = MonthCursor::today();
   MonthCursor::new(query.year.unwrap_or(today.year), query.month.unwrap_or(today.month))
      .advance(query.offset.unwrap_or(0))
}

fn scope_filter(scope: Option<&str>) -> Option<Filter> {
   scope.map(|club_id| Filter::eq("clubId", club_id))
}

async fn load_view(cursor: MonthCursor, scope: Option<&str>, store: &dyn DocumentStore) -> Result<CalendarView, AppError> {
   let events = match scope {
      Some(club_id) => db::event::get_by_club(club_id, store).await?,
      None => db::event::get_all(store).await?,
   };
   let mut view = CalendarView::new(cursor, scope.map(str::to_string));
   view.apply_snapshot(events);
   Ok(view)
}

pub async fn month(query: &CalendarQuery, store: &dyn DocumentStore) -> Result<MonthView, AppError> {
   let view = load_view(cursor_for(query), query.club.as_deref(), store).await?;
   Ok(view.render())
}

/// Events of one day for the caller, with interest marks and edit rights.
pub async fn day_detail(
   date_key: &str,
   scope: Option<&str>,
   user: Option<&UserAuthData>,
   store: &dyn DocumentStore,
) -> Result<DayDetail, AppError> {
   let date = parse_date(date_key)
      .ok_or_else(|| AppError::bad_request(format!("date '{date_key}' is not YYYY-MM-DD")))?;
   let view = load_view(MonthCursor::containing(date), scope, store).await?;
   let interested = interest::interested_event_ids(user, store).await?;

   let global_admin = access::is_global_admin(user, store).await?;
   let administered: HashSet<String> = match user {
      Some(user) => db::club::administered_by(&user.user_id.to_string(), store)
         .await?
         .into_iter()
         .map(|club| club.id)
         .collect(),
      None => HashSet::new(),
   };
   let can_add = access::load_capabilities(user, scope.unwrap_or(GLOBAL_SCOPE), store)
      .await?
      .contains(Capabilities::MANAGE_EVENTS);
   let can_edit = |event: &Event| {
      user.is_some() && (global_admin || administered.contains(&event.club_id))
   };
   Ok(view.day_detail(date_key, &interested, can_add, can_edit))
}

/// Re-projects the month on every delivery of the events collection.
/// The stream ends after the first error.
pub fn month_stream(query: &CalendarQuery, store: Store) -> impl Stream<Item = Result<MonthView, AppError>> {
   let scope = query.club.clone();
   let subscription = Subscription::new(store, db::event::COLLECTION, scope_filter(scope.as_deref()));
   let view = CalendarView::new(cursor_for(query), scope);
   stream::unfold(Some((subscription, view)), |state| async move {
      let Some((mut subscription, mut view)) = state else {
         return None;
      };
      let next = subscription.next().await.and_then(db::event::decode_all);
      match next {
         Ok(events) => {
            view.apply_snapshot(events);
            let month = view.render();
            Some((Ok(month), Some((subscription, view))))
         }
         Err(err) => {
            debug!("calendar stream closing: {}", err);
            Some((Err(err), None))
         }
      }
   })
}

/// Re-sorted schedule on every change to the caller's interest marks.
pub fn schedule_stream(
   user: Option<&UserAuthData>,
   store: Store,
) -> Result<impl Stream<Item = Result<Vec<InterestMark>, AppError>>, AppError> {
   let user = access::require_user(user)?;
   let subscription = Subscription::new(store, interest_collection(user), None);
   Ok(stream::unfold(Some(subscription), |state| async move {
      let Some(mut subscription) = state else {
         return None;
      };
      match subscription.next().await.and_then(db::interest::decode_all) {
         Ok(mut marks) => {
            sort_schedule(&mut marks);
            Some((Ok(marks), Some(subscription)))
         }
         Err(err) => Some((Err(err), None)),
      }
   }))
}

fn interest_collection(user: &UserAuthData) -> String {
   db::interest::collection(user.user_id)
}

#[cfg(test)]
mod tests {
   use std::sync::Arc;

   use futures::StreamExt;
   use uuid::Uuid;

   use super::*;
   use crate::{
      calendar::CalendarCell,
      db::MemoryStore,
      models::Club,
      service::interest::InterestSnapshot,
   };

   fn query(club: Option<&str>) -> CalendarQuery {
      CalendarQuery { year: Some(2024), month: Some(0), offset: None, club: club.map(str::to_string) }
   }

   async fn seed_event(store: &dyn DocumentStore, date: &str, time: Option<&str>, club_id: &str) -> String {
      let event = Event {
         id: String::new(),
         title: format!("at {date}"),
         date: date.to_string(),
         time: time.map(str::to_string),
         category: String::new(),
         club_id: club_id.to_string(),
         club_name: club_id.to_string(),
      };
      db::event::create(&event, store).await.unwrap()
   }

   fn marked(view: &MonthView) -> Vec<u32> {
      view.cells
         .iter()
         .filter_map(|cell| match cell {
            CalendarCell::Day(day) if day.has_event => Some(day.day),
            _ => None,
         })
         .collect()
   }

   #[test]
   fn offset_moves_the_requested_month() {
      let q = CalendarQuery { year: Some(2024), month: Some(11), offset: Some(1), club: None };
      assert_eq!(cursor_for(&q), MonthCursor::new(2025, 0));
      let q = CalendarQuery { offset: Some(-12), ..q };
      assert_eq!(cursor_for(&q), MonthCursor::new(2023, 11));
   }

   #[actix_rt::test]
   async fn extreme_offsets_still_render_a_month() {
      let store = MemoryStore::new();
      for offset in [i64::MAX, i64::MIN] {
         let q = CalendarQuery { offset: Some(offset), ..query(None) };
         let view = month(&q, &store).await.unwrap();
         assert!(!view.label.is_empty());
         assert!(view.cells.iter().any(|cell| matches!(cell, CalendarCell::Day(_))));
      }
   }

   #[actix_rt::test]
   async fn month_is_scoped_by_club() {
      let store = MemoryStore::new();
      seed_event(&store, "2024-01-03", None, "c1").await;
      seed_event(&store, "2024-01-09", None, "c2").await;

      assert_eq!(marked(&month(&query(None), &store).await.unwrap()), vec![3, 9]);
      assert_eq!(marked(&month(&query(Some("c2")), &store).await.unwrap()), vec![9]);
   }

   #[actix_rt::test]
   async fn day_detail_marks_interest_and_edit_rights() {
      let store = MemoryStore::new();
      let me = UserAuthData { user_id: Uuid::new_v4(), email: "me@example.com".to_string() };
      let club = Club {
         id: String::new(),
         name: "Chess".to_string(),
         category: String::new(),
         color: String::new(),
         description: String::new(),
         image: None,
         admins: vec![me.user_id.to_string()],
         created_at: None,
      };
      let club_id = db::club::create(&club, &store).await.unwrap();
      let mine = seed_event(&store, "2024-01-15", None, &club_id).await;
      let other = seed_event(&store, "2024-01-15", Some("09:00"), "elsewhere").await;
      let snapshot = InterestSnapshot { title: "t".to_string(), date: "2024-01-15".to_string(), time: None };
      interest::toggle(Some(&me), &other, snapshot, &store).await.unwrap();

      let detail = day_detail("2024-01-15", None, Some(&me), &store).await.unwrap();
      assert_eq!(detail.label, "Mon, Jan 15");
      assert!(!detail.can_add);
      let rows: Vec<(&str, bool, bool)> = detail
         .events
         .iter()
         .map(|entry| (entry.event.id.as_str(), entry.interested, entry.can_edit))
         .collect();
      assert_eq!(rows, vec![(other.as_str(), true, false), (mine.as_str(), false, true)]);

      let scoped = day_detail("2024-01-15", Some(&club_id), Some(&me), &store).await.unwrap();
      assert!(scoped.can_add);
      assert_eq!(scoped.events.len(), 1);

      let anonymous = day_detail("2024-01-15", None, None, &store).await.unwrap();
      assert!(anonymous.events.iter().all(|entry| !entry.interested && !entry.can_edit));
      assert!(matches!(
         day_detail("Jan 15", None, None, &store).await,
         Err(AppError::BadClientData { .. })
      ));
   }

   #[actix_rt::test]
   async fn month_stream_follows_event_changes() {
      let memory = Arc::new(MemoryStore::new());
      let store: Store = memory.clone();
      let mut months = Box::pin(month_stream(&query(None), store));
      assert!(marked(&months.next().await.unwrap().unwrap()).is_empty());

      seed_event(memory.as_ref(), "2024-01-20", None, "global").await;
      assert_eq!(marked(&months.next().await.unwrap().unwrap()), vec![20]);
   }

   #[actix_rt::test]
   async fn schedule_stream_needs_a_session_and_stays_sorted() {
      let memory = Arc::new(MemoryStore::new());
      let store: Store = memory.clone();
      assert!(matches!(schedule_stream(None, store.clone()), Err(AppError::Unauthenticated)));

      let me = UserAuthData { user_id: Uuid::new_v4(), email: "me@example.com".to_string() };
      let mut schedule = Box::pin(schedule_stream(Some(&me), store).unwrap());
      assert!(schedule.next().await.unwrap().unwrap().is_empty());

      let late = InterestSnapshot { title: "late".to_string(), date: "2024-02-01".to_string(), time: None };
      interest::toggle(Some(&me), "late", late, memory.as_ref()).await.unwrap();
      let marks = schedule.next().await.unwrap().unwrap();
      assert_eq!(marks.len(), 1);

      let early = InterestSnapshot { title: "early".to_string(), date: "2024-01-01".to_string(), time: None };
      interest::toggle(Some(&me), "early", early, memory.as_ref()).await.unwrap();
      let ids: Vec<String> = schedule.next().await.unwrap().unwrap().into_iter().map(|m| m.event_id).collect();
      assert_eq!(ids, vec!["early", "late"]);
   }
}
