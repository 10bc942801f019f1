use serde_json::json;
use uuid::Uuid;

use super::{Document, DocumentStore, Filter};
use crate::{errors::AppError, models::InterestMark};

/// Per-user sub-collection holding that user's interest marks.
pub fn collection(user_id: Uuid) -> String {
    format!("users/{user_id}/interested")
}

pub(crate) fn decode_all(docs: Vec<Document>) -> Result<Vec<InterestMark>, AppError> {
    docs.into_iter()
        .map(|doc| {
            let mut mark: InterestMark = doc.decode()?;
            mark.id = doc.id;
            Ok(mark)
        })
        .collect()
}

pub async fn find_for_event(
    user_id: Uuid,
    event_id: &str,
    store: &dyn DocumentStore,
) -> Result<Vec<Document>, AppError> {
    store
        .query(&collection(user_id), &Filter::eq("eventId", event_id))
        .await
}

pub async fn get_all(user_id: Uuid, store: &dyn DocumentStore) -> Result<Vec<InterestMark>, AppError> {
    decode_all(store.list(&collection(user_id)).await?)
}

pub async fn put(user_id: Uuid, mark: &InterestMark, store: &dyn DocumentStore) -> Result<(), AppError> {
    let body = json!({
        "eventId": mark.event_id,
        "title": mark.title,
        "date": mark.date,
        "time": mark.time,
        "savedAt": mark.saved_at,
    });
    store.put(&collection(user_id), &mark.id, body).await
}

pub async fn delete(user_id: Uuid, id: &str, store: &dyn DocumentStore) -> Result<bool, AppError> {
    store.delete(&collection(user_id), id).await
}
