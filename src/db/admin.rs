use super::{remote_failure, DocumentStore};
use crate::{errors::AppError, models::AdminRecord};

pub const COLLECTION: &str = "admins";

pub async fn is_admin(email: &str, store: &dyn DocumentStore) -> Result<bool, AppError> {
    Ok(store.get(COLLECTION, &email.to_lowercase()).await?.is_some())
}

/// Records are keyed by the lower-cased e-mail, so re-adding is a no-op rewrite.
pub async fn create(email: &str, record: &AdminRecord, store: &dyn DocumentStore) -> Result<(), AppError> {
    let body = serde_json::to_value(record).map_err(|err| remote_failure("admin encoding failed", err))?;
    store.put(COLLECTION, &email.to_lowercase(), body).await
}
