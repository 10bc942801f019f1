use std::collections::HashMap;

use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use super::{Document, DocumentStore, Filter, CHANGE_FEED_CAPACITY};
use crate::errors::AppError;

/// In-process store, each collection kept in insertion order.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    changes: broadcast::Sender<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        MemoryStore {
            collections: RwLock::new(HashMap::new()),
            changes,
        }
    }

    fn announce(&self, collection: &str) {
        // No receivers is fine.
        let _ = self.changes.send(collection.to_string());
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn merge(target: &mut Value, fields: Value) -> Result<(), AppError> {
    match (target, fields) {
        (Value::Object(existing), Value::Object(fields)) => {
            for (key, value) in fields {
                existing.insert(key, value);
            }
            Ok(())
        }
        _ => Err(AppError::bad_request("document fields must be an object")),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: &str, data: Value) -> Result<String, AppError> {
        let id = Uuid::new_v4().simple().to_string();
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(Document { id: id.clone(), data });
        debug!("created {}/{}", collection, id);
        self.announce(collection);
        Ok(id)
    }

    async fn put(&self, collection: &str, id: &str, data: Value) -> Result<(), AppError> {
        {
            let mut collections = self.collections.write().await;
            let documents = collections.entry(collection.to_string()).or_default();
            match documents.iter_mut().find(|doc| doc.id == id) {
                Some(existing) => existing.data = data,
                None => documents.push(Document {
                    id: id.to_string(),
                    data,
                }),
            }
        }
        self.announce(collection);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|documents| documents.iter().find(|doc| doc.id == id))
            .cloned())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, AppError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<(), AppError> {
        {
            let mut collections = self.collections.write().await;
            let document = collections
                .get_mut(collection)
                .and_then(|documents| documents.iter_mut().find(|doc| doc.id == id))
                .ok_or_else(|| AppError::not_found(format!("{collection}/{id}")))?;
            merge(&mut document.data, fields)?;
        }
        self.announce(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        let removed = {
            let mut collections = self.collections.write().await;
            match collections.get_mut(collection) {
                Some(documents) => {
                    let before = documents.len();
                    documents.retain(|doc| doc.id != id);
                    documents.len() != before
                }
                None => false,
            }
        };
        if removed {
            self.announce(collection);
        }
        Ok(removed)
    }

    async fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, AppError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|doc| filter.matches(&doc.data))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn changes(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }
}
