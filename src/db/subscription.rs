use log::{debug, warn};
use tokio::sync::broadcast::{self, error::RecvError};

use super::{Document, Filter, Store};
use crate::errors::AppError;

/// Full-snapshot live query over one collection.
///
/// The first [`Subscription::next`] yields the current result set; every
/// later call waits for a change of the collection and yields the whole
/// result set again, never a delta. Dropping the handle releases it.
pub struct Subscription {
    store: Store,
    collection: String,
    filter: Option<Filter>,
    changes: broadcast::Receiver<String>,
    primed: bool,
}

impl Subscription {
    pub fn new(store: Store, collection: impl Into<String>, filter: Option<Filter>) -> Self {
        let collection = collection.into();
        debug!("subscribed to '{}'", collection);
        // Subscribe before the first read so no change slips between them.
        let changes = store.changes();
        Subscription {
            store,
            collection,
            filter,
            changes,
            primed: false,
        }
    }

    pub async fn next(&mut self) -> Result<Vec<Document>, AppError> {
        if self.primed {
            self.wait_for_change().await?;
        }
        self.primed = true;
        match &self.filter {
            Some(filter) => self.store.query(&self.collection, filter).await,
            None => self.store.list(&self.collection).await,
        }
    }

    async fn wait_for_change(&mut self) -> Result<(), AppError> {
        loop {
            match self.changes.recv().await {
                Ok(collection) if collection == self.collection => return Ok(()),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    // A fresh snapshot covers whatever was missed.
                    warn!("subscription to '{}' lagged by {} changes", self.collection, skipped);
                    return Ok(());
                }
                Err(RecvError::Closed) => return Err(AppError::RemoteFailure),
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        debug!("released subscription to '{}'", self.collection);
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use serde_json::json;

    use super::*;
    use crate::db::{DocumentStore, MemoryStore};

    #[actix_rt::test]
    async fn delivers_initial_snapshot_then_full_replacements() {
        let memory = Arc::new(MemoryStore::new());
        let store: Store = memory.clone();
        memory.create("events", json!({ "title": "a" })).await.unwrap();

        let mut sub = Subscription::new(store, "events", None);
        assert_eq!(sub.next().await.unwrap().len(), 1);

        memory.create("clubs", json!({ "name": "ignored" })).await.unwrap();
        memory.create("events", json!({ "title": "b" })).await.unwrap();
        let snapshot = sub.next().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[1].data["title"], "b");
    }

    #[actix_rt::test]
    async fn filtered_subscription_only_sees_matching_documents() {
        let memory = Arc::new(MemoryStore::new());
        let store: Store = memory.clone();
        memory
            .create("events", json!({ "clubId": "c1" }))
            .await
            .unwrap();
        memory
            .create("events", json!({ "clubId": "c2" }))
            .await
            .unwrap();
        let mut sub = Subscription::new(store, "events", Some(Filter::eq("clubId", "c2")));
        let snapshot = sub.next().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].data["clubId"], "c2");
    }

    #[actix_rt::test]
    async fn waits_until_the_collection_changes() {
        let memory = Arc::new(MemoryStore::new());
        let store: Store = memory.clone();
        let mut sub = Subscription::new(store, "events", None);
        assert!(sub.next().await.unwrap().is_empty());

        let pending = tokio::time::timeout(Duration::from_millis(50), sub.next()).await;
        assert!(pending.is_err(), "no change yet, nothing to deliver");
    }
}
