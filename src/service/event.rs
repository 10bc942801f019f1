use log::info;

use crate::{
   calendar::{parse_date, parse_time, reminder::reminder_link},
   db::{self, DocumentStore},
   dto::{NewEventDto, UpdateEventDto},
   errors::AppError,
   models::{Event, GLOBAL_SCOPE, GLOBAL_SCOPE_NAME},
};

use super::{access::{self, Capabilities}, auth::UserAuthData};

fn validate(title: &str, date: &str, time: Option<&str>) -> Result<Option<String>, AppError> {
   if title.trim().is_empty() {
      return Err(AppError::bad_request("title must not be empty"));
   }
   if parse_date(date).is_none() {
      return Err(AppError::bad_request(format!("date '{date}' is not YYYY-MM-DD")));
   }
   match time.map(str::trim).filter(|time| !time.is_empty()) {
      Some(time) if parse_time(Some(time)).is_none() => {
         Err(AppError::bad_request(format!("time '{time}' is not HH:MM")))
      },
      Some(time) => Ok(Some(time.to_string())),
      None => Ok(None),
   }
}

pub async fn create(user: Option<&UserAuthData>, dto: NewEventDto, store: &dyn DocumentStore) -> Result<Event, AppError> {
   access::require_user(user)?;
   let time = validate(&dto.title, &dto.date, dto.time.as_deref())?;
   let scope = dto.club_id.unwrap_or_else(|| GLOBAL_SCOPE.to_string());
   let caps = access::load_capabilities(user, &scope, store).await?;
   access::require(caps, Capabilities::MANAGE_EVENTS)?;

   let club_name = if scope == GLOBAL_SCOPE {
      GLOBAL_SCOPE_NAME.to_string()
   } else {
      db::club::get_by_id(&scope, store).await?.name
   };
   let mut event = Event {
      id: String::new(),
      title: dto.title,
      date: dto.date,
      time,
      category: dto.category,
      club_id: scope,
      club_name,
   };
   event.id = db::event::create(&event, store).await?;
   info!("event {} created on {} for {}", event.id, event.date, event.club_id);
   Ok(event)
}

pub async fn update(
   id: &str,
   dto: UpdateEventDto,
   user: Option<&UserAuthData>,
   store: &dyn DocumentStore,
) -> Result<Event, AppError> {
   access::require_user(user)?;
   let existing = db::event::get_by_id(id, store).await?;
   let caps = access::load_capabilities(user, &existing.club_id, store).await?;
   access::require(caps, Capabilities::MANAGE_EVENTS)?;

   let time = validate(&dto.title, &dto.date, dto.time.as_deref())?;
   db::event::set_fields(id, &dto.title, &dto.date, time.as_deref(), &dto.category, store).await?;
   Ok(Event {
      title: dto.title,
      date: dto.date,
      time,
      category: dto.category,
      ..existing
   })
}

pub async fn delete(id: &str, user: Option<&UserAuthData>, store: &dyn DocumentStore) -> Result<(), AppError> {
   access::require_user(user)?;
   let existing = db::event::get_by_id(id, store).await?;
   let caps = access::load_capabilities(user, &existing.club_id, store).await?;
   access::require(caps, Capabilities::MANAGE_EVENTS)?;
   db::event::delete(id, store).await?;
   info!("event {} deleted", id);
   Ok(())
}

pub async fn get_by_id(id: &str, store: &dyn DocumentStore) -> Result<Event, AppError> {
   db::event::get_by_id(id, store).await
}

pub async fn get_all(club: Option<&str>, store: &dyn DocumentStore) -> Result<Vec<Event>, AppError> {
   match club {
      Some(club_id) => db::event::get_by_club(club_id, store).await,
      None => db::event::get_all(store).await,
   }
}

/// Events dated `today`, timed ones first.
pub async fn happening_on(today: &str, store: &dyn DocumentStore) -> Result<Vec<Event>, AppError> {
   let events = db::event::get_by_date(today, store).await?;
   Ok(crate::calendar::day::events_on(today, &events).into_iter().cloned().collect())
}

pub async fn reminder(id: &str, store: &dyn DocumentStore) -> Result<String, AppError> {
   let event = db::event::get_by_id(id, store).await?;
   reminder_link(&event.title, &event.date, event.time.as_deref(), &event.club_name)
}
