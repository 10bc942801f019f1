use serde_json::{json, Value};

use super::{Document, DocumentStore, Filter};
use crate::{errors::AppError, models::Event};

pub const COLLECTION: &str = "events";

fn decode(doc: Document) -> Result<Event, AppError> {
    let mut event: Event = doc.decode()?;
    event.id = doc.id;
    Ok(event)
}

pub(crate) fn decode_all(docs: Vec<Document>) -> Result<Vec<Event>, AppError> {
    docs.into_iter().map(decode).collect()
}

fn body(event: &Event) -> Value {
    json!({
        "title": event.title,
        "date": event.date,
        "time": event.time,
        "category": event.category,
        "clubId": event.club_id,
        "clubName": event.club_name,
    })
}

pub async fn create(event: &Event, store: &dyn DocumentStore) -> Result<String, AppError> {
    store.create(COLLECTION, body(event)).await
}

pub async fn get_by_id(id: &str, store: &dyn DocumentStore) -> Result<Event, AppError> {
    match store.get(COLLECTION, id).await? {
        Some(doc) => decode(doc),
        None => Err(AppError::not_found("event")),
    }
}

pub async fn get_all(store: &dyn DocumentStore) -> Result<Vec<Event>, AppError> {
    decode_all(store.list(COLLECTION).await?)
}

pub async fn get_by_club(club_id: &str, store: &dyn DocumentStore) -> Result<Vec<Event>, AppError> {
    decode_all(store.query(COLLECTION, &Filter::eq("clubId", club_id)).await?)
}

pub async fn get_by_date(date: &str, store: &dyn DocumentStore) -> Result<Vec<Event>, AppError> {
    decode_all(store.query(COLLECTION, &Filter::eq("date", date)).await?)
}

/// Rewrites every editable field in one store update.
pub async fn set_fields(
    id: &str,
    title: &str,
    date: &str,
    time: Option<&str>,
    category: &str,
    store: &dyn DocumentStore,
) -> Result<(), AppError> {
    let fields = json!({
        "title": title,
        "date": date,
        "time": time,
        "category": category,
    });
    store.update(COLLECTION, id, fields).await
}

pub async fn delete(id: &str, store: &dyn DocumentStore) -> Result<(), AppError> {
    if store.delete(COLLECTION, id).await? {
        Ok(())
    } else {
        Err(AppError::not_found("event"))
    }
}
