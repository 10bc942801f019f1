use serde_json::json;

use super::{Document, DocumentStore, Filter};
use crate::{errors::AppError, models::Club};

pub const COLLECTION: &str = "clubs";

fn decode(doc: Document) -> Result<Club, AppError> {
    let mut club: Club = doc.decode()?;
    club.id = doc.id;
    Ok(club)
}

pub async fn create(club: &Club, store: &dyn DocumentStore) -> Result<String, AppError> {
    let body = json!({
        "name": club.name,
        "category": club.category,
        "color": club.color,
        "description": club.description,
        "image": club.image,
        "admins": club.admins,
        "createdAt": club.created_at,
    });
    store.create(COLLECTION, body).await
}

pub async fn get_by_id(id: &str, store: &dyn DocumentStore) -> Result<Club, AppError> {
    match store.get(COLLECTION, id).await? {
        Some(doc) => decode(doc),
        None => Err(AppError::not_found("club")),
    }
}

pub async fn get_all(store: &dyn DocumentStore) -> Result<Vec<Club>, AppError> {
    store.list(COLLECTION).await?.into_iter().map(decode).collect()
}

/// Clubs listing `user_id` among their admins.
pub async fn administered_by(user_id: &str, store: &dyn DocumentStore) -> Result<Vec<Club>, AppError> {
    store
        .query(COLLECTION, &Filter::array_contains("admins", user_id))
        .await?
        .into_iter()
        .map(decode)
        .collect()
}

/// Atomic rewrite of the editable fields; `admins` and `createdAt` stay.
pub async fn set_fields(club: &Club, store: &dyn DocumentStore) -> Result<(), AppError> {
    let fields = json!({
        "name": club.name,
        "category": club.category,
        "color": club.color,
        "description": club.description,
        "image": club.image,
    });
    store.update(COLLECTION, &club.id, fields).await
}

pub async fn set_admins(id: &str, admins: &[String], store: &dyn DocumentStore) -> Result<(), AppError> {
    store.update(COLLECTION, id, json!({ "admins": admins })).await
}
