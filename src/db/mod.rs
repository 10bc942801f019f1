pub mod admin;
pub mod club;
pub mod event;
pub mod interest;
pub mod memory;
pub mod postgres;
pub mod resource;
pub mod subscription;
pub mod user;

use std::sync::Arc;

use async_trait::async_trait;
use log::{error, info, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::{
    config::StoreBackend,
    errors::AppError,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use subscription::Subscription;

/// Shared handle every service function receives.
pub type Store = Arc<dyn DocumentStore>;

/// Capacity of the change broadcast shared by all subscriptions.
pub const CHANGE_FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_value(self.data.clone()).map_err(|err| {
            error!("document '{}' does not decode: {}", self.id, err);
            AppError::RemoteFailure
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals the value.
    Eq(String, Value),
    /// Field is an array holding the value.
    ArrayContains(String, Value),
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(field.to_string(), value.into())
    }

    pub fn array_contains(field: &str, value: impl Into<Value>) -> Self {
        Filter::ArrayContains(field.to_string(), value.into())
    }

    pub fn matches(&self, data: &Value) -> bool {
        match self {
            Filter::Eq(field, value) => data.get(field) == Some(value),
            Filter::ArrayContains(field, value) => data
                .get(field)
                .and_then(Value::as_array)
                .map(|items| items.contains(value))
                .unwrap_or(false),
        }
    }

    /// JSONB containment document equivalent to this filter.
    pub fn containment(&self) -> Value {
        let mut object = serde_json::Map::new();
        match self {
            Filter::Eq(field, value) => {
                object.insert(field.clone(), value.clone());
            }
            Filter::ArrayContains(field, value) => {
                object.insert(field.clone(), Value::Array(vec![value.clone()]));
            }
        }
        Value::Object(object)
    }
}

/// Collection-scoped schemaless document storage.
///
/// Collections are plain paths such as `events` or `users/{uid}/interested`.
/// Every mutation announces the collection path on [`DocumentStore::changes`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts under a fresh store-assigned id and returns it.
    async fn create(&self, collection: &str, data: Value) -> Result<String, AppError>;

    /// Creates or fully replaces the document with the given id.
    async fn put(&self, collection: &str, id: &str, data: Value) -> Result<(), AppError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError>;

    /// All documents in insertion order.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, AppError>;

    /// Merges `fields` into an existing document, `NotFound` when absent.
    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<(), AppError>;

    /// Returns whether a document was removed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, AppError>;

    async fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, AppError>;

    fn changes(&self) -> broadcast::Receiver<String>;
}

pub async fn init_store(backend: &StoreBackend) -> Result<Store, AppError> {
    match backend {
        StoreBackend::Postgres { database_url } => {
            let store = PgStore::connect(database_url).await?;
            info!("{}", "Connect with postgresql".to_string());
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            warn!("using the in-memory document store, data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Store-level failures are logged once here and surface as `RemoteFailure`.
pub(crate) fn remote_failure(context: &str, err: impl std::fmt::Display) -> AppError {
    error!("{}: {}", context, err);
    AppError::RemoteFailure
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn filters_match_like_their_containment_documents() {
        let data = json!({ "clubId": "c1", "admins": ["u1", "u2"] });
        assert!(Filter::eq("clubId", "c1").matches(&data));
        assert!(!Filter::eq("clubId", "c2").matches(&data));
        assert!(Filter::array_contains("admins", "u2").matches(&data));
        assert!(!Filter::array_contains("clubId", "c1").matches(&data));
        assert_eq!(
            Filter::array_contains("admins", "u2").containment(),
            json!({ "admins": ["u2"] })
        );
    }
}
