use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use super::{remote_failure, Document, DocumentStore, Filter};
use crate::{errors::AppError, models::User};

pub const COLLECTION: &str = "users";

fn decode(doc: Document) -> Result<User, AppError> {
    let mut user: User = doc.decode()?;
    user.id = Uuid::parse_str(&doc.id)
        .map_err(|err| remote_failure(&format!("user id '{}' is not a uuid", doc.id), err))?;
    Ok(user)
}

pub async fn create(user: &User, store: &dyn DocumentStore) -> Result<(), AppError> {
    let body = serde_json::to_value(user).map_err(|err| remote_failure("user encoding failed", err))?;
    store.put(COLLECTION, &user.id.to_string(), body).await
}

pub async fn get_by_id(id: Uuid, store: &dyn DocumentStore) -> Result<User, AppError> {
    match store.get(COLLECTION, &id.to_string()).await? {
        Some(doc) => decode(doc),
        None => Err(AppError::not_found("user")),
    }
}

pub async fn get_by_email(email: &str, store: &dyn DocumentStore) -> Result<Option<User>, AppError> {
    let docs = store.query(COLLECTION, &Filter::eq("email", email)).await?;
    docs.into_iter().next().map(decode).transpose()
}

pub async fn exists(email: &str, store: &dyn DocumentStore) -> Result<bool, AppError> {
    Ok(get_by_email(email, store).await?.is_some())
}

pub async fn set_refresh_token(
    id: Uuid,
    refresh_token: Option<&str>,
    store: &dyn DocumentStore,
) -> Result<(), AppError> {
    store
        .update(COLLECTION, &id.to_string(), json!({ "refreshToken": refresh_token }))
        .await
}

pub async fn set_last_sign_in(id: Uuid, at: DateTime<Utc>, store: &dyn DocumentStore) -> Result<(), AppError> {
    store
        .update(COLLECTION, &id.to_string(), json!({ "lastSignInAt": at }))
        .await
}
