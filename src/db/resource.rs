use serde_json::json;

use super::{DocumentStore, Filter};
use crate::{errors::AppError, models::Resource};

pub const COLLECTION: &str = "resources";

pub async fn create(resource: &Resource, store: &dyn DocumentStore) -> Result<String, AppError> {
    let body = json!({
        "clubId": resource.club_id,
        "title": resource.title,
        "type": resource.kind,
        "url": resource.url,
        "createdAt": resource.created_at,
    });
    store.create(COLLECTION, body).await
}

pub async fn get_by_club(club_id: &str, store: &dyn DocumentStore) -> Result<Vec<Resource>, AppError> {
    store
        .query(COLLECTION, &Filter::eq("clubId", club_id))
        .await?
        .into_iter()
        .map(|doc| {
            let mut resource: Resource = doc.decode()?;
            resource.id = doc.id;
            Ok(resource)
        })
        .collect()
}
