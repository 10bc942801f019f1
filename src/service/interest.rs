use std::collections::HashSet;

use chrono::Utc;
use log::{info, warn};
use uuid::Uuid;

use crate::{
    calendar::schedule::sort_schedule,
    db::{self, DocumentStore},
    errors::AppError,
    models::{Event, InterestMark},
};

use super::auth::UserAuthData;

/// Event fields copied onto the mark when the user says they are going.
#[derive(Debug, Clone, PartialEq)]
pub struct InterestSnapshot {
    pub title: String,
    pub date: String,
    pub time: Option<String>,
}

impl From<&Event> for InterestSnapshot {
    fn from(event: &Event) -> Self {
        InterestSnapshot {
            title: event.title.clone(),
            date: event.date.clone(),
            time: event.time.clone(),
        }
    }
}

/// Same (user, event) pair, same mark id.
pub fn interest_key(user_id: Uuid, event_id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{user_id}:{event_id}").as_bytes())
        .simple()
        .to_string()
}

/// Removes every mark the user holds for `event_id`, duplicates written by
/// older clients included. Returns whether anything was removed.
async fn clear_marks(user: &UserAuthData, event_id: &str, store: &dyn DocumentStore) -> Result<bool, AppError> {
    let existing = db::interest::find_for_event(user.user_id, event_id, store).await?;
    if existing.is_empty() {
        return Ok(false);
    }
    if existing.len() > 1 {
        warn!("removing {} duplicate interest marks for event {}", existing.len() - 1, event_id);
    }
    for doc in existing {
        db::interest::delete(user.user_id, &doc.id, store).await?;
    }
    info!("user {} no longer interested in {}", user.user_id, event_id);
    Ok(true)
}

/// One mark under [`interest_key`], so racing inserts land on the same record.
async fn add_mark(
    user: &UserAuthData,
    event_id: &str,
    snapshot: InterestSnapshot,
    store: &dyn DocumentStore,
) -> Result<(), AppError> {
    let mark = InterestMark {
        id: interest_key(user.user_id, event_id),
        event_id: event_id.to_string(),
        title: snapshot.title,
        date: snapshot.date,
        time: snapshot.time,
        saved_at: Utc::now(),
    };
    db::interest::put(user.user_id, &mark, store).await?;
    info!("user {} interested in {}", user.user_id, event_id);
    Ok(())
}

/// Flips the caller's interest in `event_id` and returns the new state.
pub async fn toggle(
    user: Option<&UserAuthData>,
    event_id: &str,
    snapshot: InterestSnapshot,
    store: &dyn DocumentStore,
) -> Result<bool, AppError> {
    let user = user.ok_or(AppError::Unauthenticated)?;
    if clear_marks(user, event_id, store).await? {
        return Ok(false);
    }
    add_mark(user, event_id, snapshot, store).await?;
    Ok(true)
}

/// [`toggle`] for a stored event. The event is only read when a new mark
/// needs its fields, so marks for deleted events can still be cleared.
pub async fn toggle_event(
    user: Option<&UserAuthData>,
    event_id: &str,
    store: &dyn DocumentStore,
) -> Result<bool, AppError> {
    let user = user.ok_or(AppError::Unauthenticated)?;
    if clear_marks(user, event_id, store).await? {
        return Ok(false);
    }
    let event = db::event::get_by_id(event_id, store).await?;
    add_mark(user, &event.id, InterestSnapshot::from(&event), store).await?;
    Ok(true)
}

/// Ids of every event the user has marked.
pub async fn interested_event_ids(
    user: Option<&UserAuthData>,
    store: &dyn DocumentStore,
) -> Result<HashSet<String>, AppError> {
    match user {
        Some(user) => Ok(db::interest::get_all(user.user_id, store)
            .await?
            .into_iter()
            .map(|mark| mark.event_id)
            .collect()),
        None => Ok(HashSet::new()),
    }
}

pub async fn schedule(user: Option<&UserAuthData>, store: &dyn DocumentStore) -> Result<Vec<InterestMark>, AppError> {
    let user = user.ok_or(AppError::Unauthenticated)?;
    let mut marks = db::interest::get_all(user.user_id, store).await?;
    sort_schedule(&mut marks);
    Ok(marks)
}
